//! # EventBuffer & SynthSink
//!
//! The narrow interface between the scheduler and a synthesizer
//! implementation (`spec.md` §4.8). `SynthSink` is the four-method
//! abstraction the synth backend implements; `EventBuffer` is the bounded
//! FIFO handoff between the scheduler thread (producer) and the sink's own
//! consumer thread.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};
use std::time::Duration;

/// Synthesizer backend abstraction (`spec.md` §6 "Synth interface").
/// Channel 0 is used for pitched playback; channel 9 is reserved for
/// future percussion/metronome use.
pub trait SynthSink: Send {
    fn program_select(&mut self, channel: u8, program: u8);
    fn note_on(&mut self, channel: u8, pitch: u8, velocity: u8);
    fn note_off(&mut self, channel: u8, pitch: u8);
    fn all_notes_off(&mut self, channel: u8);
}

/// One unit of work handed from the scheduler to a `SynthSink`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SynthEvent {
    ProgramSelect { channel: u8, program: u8 },
    NoteOn { channel: u8, pitch: u8, velocity: u8 },
    NoteOff { channel: u8, pitch: u8 },
    AllNotesOff { channel: u8 },
}

impl SynthEvent {
    pub fn is_note_off(&self) -> bool {
        matches!(self, SynthEvent::NoteOff { .. })
    }

    pub fn dispatch(self, sink: &mut dyn SynthSink) {
        match self {
            SynthEvent::ProgramSelect { channel, program } => sink.program_select(channel, program),
            SynthEvent::NoteOn { channel, pitch, velocity } => sink.note_on(channel, pitch, velocity),
            SynthEvent::NoteOff { channel, pitch } => sink.note_off(channel, pitch),
            SynthEvent::AllNotesOff { channel } => sink.all_notes_off(channel),
        }
    }
}

const BACKPRESSURE_WAIT: Duration = Duration::from_millis(50);

/// Bounded FIFO producer-consumer handoff with the back-pressure policy
/// from `spec.md` §4.8: if full, block up to 50ms for the consumer to make
/// room, then drop the oldest pending `note_off` (or, failing that, the
/// oldest event of any kind) rather than block indefinitely.
pub struct EventBuffer {
    capacity: usize,
    queue: Mutex<VecDeque<SynthEvent>>,
    not_full: Condvar,
    not_empty: Condvar,
}

impl EventBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            queue: Mutex::new(VecDeque::new()),
            not_full: Condvar::new(),
            not_empty: Condvar::new(),
        }
    }

    pub fn push(&self, event: SynthEvent) {
        let mut queue = self.queue.lock().unwrap();
        if queue.len() >= self.capacity {
            let (guard, timeout) = self.not_full.wait_timeout(queue, BACKPRESSURE_WAIT).unwrap();
            queue = guard;
            if timeout.timed_out() && queue.len() >= self.capacity {
                if let Some(pos) = queue.iter().position(SynthEvent::is_note_off) {
                    queue.remove(pos);
                    log::warn!("event buffer full after {BACKPRESSURE_WAIT:?}; dropped a pending note_off");
                } else {
                    queue.pop_front();
                    log::warn!("event buffer full after {BACKPRESSURE_WAIT:?}; dropped the oldest pending event");
                }
            }
        }
        queue.push_back(event);
        self.not_empty.notify_one();
    }

    /// Block until an event is available.
    pub fn pop(&self) -> SynthEvent {
        let mut queue = self.queue.lock().unwrap();
        while queue.is_empty() {
            queue = self.not_empty.wait(queue).unwrap();
        }
        let event = queue.pop_front().expect("checked non-empty above");
        self.not_full.notify_one();
        event
    }

    pub fn try_pop(&self) -> Option<SynthEvent> {
        let mut queue = self.queue.lock().unwrap();
        let event = queue.pop_front();
        if event.is_some() {
            self.not_full.notify_one();
        }
        event
    }

    pub fn len(&self) -> usize {
        self.queue.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Drive a sink's consumer loop on the calling thread until `push`ed an
/// `AllNotesOff` is no longer sufficient — in practice the sink owner spawns
/// this on its own thread (`spec.md` §5 "sink thread(s): owned by the synth
/// implementation; opaque").
pub fn drain_forever(buffer: &EventBuffer, sink: &mut dyn SynthSink) -> ! {
    loop {
        let event = buffer.pop();
        event.dispatch(sink);
    }
}
