//! # Scheduler
//!
//! Walks a [`PlaybackPlan`] on a dedicated worker thread: voices each
//! chord, emits `SynthEvent`s through an [`EventBuffer`], and publishes
//! highlight/state callbacks, honoring Pause/Resume/Stop and click-to-play
//! (`spec.md` §4.7). Single-threaded by construction — callers drive it by
//! sending [`Command`]s over a `crossbeam_channel` and run [`Scheduler::run`]
//! on its own thread.

use crate::directive::{TempoExpr, TimeSig};
use crate::event_buffer::{EventBuffer, SynthEvent};
use crate::plan::{apply_tempo, KeyContext, PlanStep, PlaybackPlan, ResolvedChord};
use crate::rational::Rational;
use crate::song::Span;
use crate::voicing::{self, VoicedChord, VoicingKind};
use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Every sleep samples for a pending command at least this often, so
/// Pause/Stop take effect within the window `spec.md` §4.7/§5 require.
const CANCEL_GRANULARITY: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerStatus {
    Stopped,
    Playing,
    Paused,
}

/// Read-only snapshot published to the UI on every state transition
/// (`spec.md` §6 "on_state_change").
#[derive(Debug, Clone)]
pub struct StateSnapshot {
    pub status: PlayerStatus,
    pub cursor: usize,
    pub bpm: u32,
    pub time_sig: TimeSig,
    pub key: KeyContext,
    pub chord_name: Option<String>,
}

/// Commands accepted over the scheduler's channel (`spec.md` §4.7).
pub enum Command {
    Start { plan: PlaybackPlan, start_step: usize },
    Pause,
    Resume,
    Stop,
    PlaySingle { chord: ResolvedChord, beats: Rational },
    SetInitialTempo(u32),
}

enum SleepOutcome {
    Completed,
    Interrupted(Duration),
}

/// A `Play` step whose sleep was cut short by Pause, kept so Resume can
/// re-attack and continue with only the remaining duration.
struct PendingStep {
    chord: ResolvedChord,
    span: Span,
    voiced: VoicedChord,
    remaining: Duration,
}

/// Mutable playback state, owned exclusively by the scheduler thread
/// (`spec.md` §3 "PlayerState", §5 "owned exclusively by the scheduler").
struct PlayerState {
    plan: Option<PlaybackPlan>,
    pending_step: Option<PendingStep>,
    cursor: usize,
    status: PlayerStatus,
    previous_voiced: Option<VoicedChord>,
    active_pitches: Vec<u8>,
    initial_tempo: u32,
    current_tempo: u32,
    current_time_sig: TimeSig,
    current_key: KeyContext,
}

pub struct Scheduler {
    voicing: VoicingKind,
    buffer: Arc<EventBuffer>,
    on_highlight: Box<dyn FnMut(Option<Span>) + Send>,
    on_state_change: Box<dyn FnMut(StateSnapshot) + Send>,
    state: PlayerState,
}

impl Scheduler {
    pub fn new(
        buffer: Arc<EventBuffer>,
        voicing: VoicingKind,
        initial_tempo: u32,
        initial_time_sig: TimeSig,
        initial_key: KeyContext,
        on_highlight: Box<dyn FnMut(Option<Span>) + Send>,
        on_state_change: Box<dyn FnMut(StateSnapshot) + Send>,
    ) -> Self {
        Self {
            voicing,
            buffer,
            on_highlight,
            on_state_change,
            state: PlayerState {
                plan: None,
                pending_step: None,
                cursor: 0,
                status: PlayerStatus::Stopped,
                previous_voiced: None,
                active_pitches: Vec::new(),
                initial_tempo,
                current_tempo: initial_tempo,
                current_time_sig: initial_time_sig,
                current_key: initial_key,
            },
        }
    }

    /// Drive the scheduler until `commands` disconnects. Intended to run on
    /// its own thread (`spec.md` §5 "Scheduler thread").
    pub fn run(mut self, commands: Receiver<Command>) {
        loop {
            if self.state.status != PlayerStatus::Playing {
                match commands.recv() {
                    Ok(command) => self.handle_command(command, &commands),
                    Err(_) => return,
                }
                continue;
            }
            self.advance_one_step(&commands);
        }
    }

    fn handle_command(&mut self, command: Command, commands: &Receiver<Command>) {
        match command {
            Command::Start { plan, start_step } => self.start(plan, start_step),
            Command::Pause => self.pause(),
            Command::Resume => self.resume(commands),
            Command::Stop => self.stop(),
            Command::PlaySingle { chord, beats } => self.play_single(chord, beats, commands),
            Command::SetInitialTempo(bpm) => self.set_initial_tempo(bpm),
        }
    }

    fn start(&mut self, plan: PlaybackPlan, start_step: usize) {
        self.release_all();
        self.state.initial_tempo = plan.initial_tempo;
        self.state.current_tempo = plan.initial_tempo;
        self.state.current_time_sig = plan.initial_time_sig;
        self.state.current_key = plan.initial_key;
        self.state.cursor = start_step.min(plan.steps.len());
        self.state.pending_step = None;
        self.state.previous_voiced = None;
        self.state.plan = Some(plan);
        self.state.status = PlayerStatus::Playing;
        self.publish_state(None);
    }

    fn pause(&mut self) {
        if self.state.status != PlayerStatus::Playing {
            return;
        }
        self.state.status = PlayerStatus::Paused;
        self.release_all();
        (self.on_highlight)(None);
        self.publish_state(None);
    }

    fn resume(&mut self, commands: &Receiver<Command>) {
        if self.state.status != PlayerStatus::Paused {
            return;
        }
        self.state.status = PlayerStatus::Playing;
        self.publish_state(None);
        if let Some(pending) = self.state.pending_step.take() {
            self.resume_play_step(pending, commands);
        }
    }

    fn stop(&mut self) {
        self.release_all();
        self.buffer.push(SynthEvent::AllNotesOff { channel: 0 });
        self.state.pending_step = None;
        self.state.previous_voiced = None;
        self.state.cursor = 0;
        self.state.status = PlayerStatus::Stopped;
        (self.on_highlight)(None);
        self.publish_state(None);
    }

    fn set_initial_tempo(&mut self, bpm: u32) {
        self.state.initial_tempo = bpm;
        if self.state.status == PlayerStatus::Stopped {
            self.state.current_tempo = bpm;
        }
        self.publish_state(None);
    }

    /// Click-to-play (`spec.md` §4.9 `play_chord_at`): runs in the
    /// foreground using the engine's current `previous_voiced`, and updates
    /// it afterward for continuity with the next click or playback start.
    fn play_single(&mut self, chord: ResolvedChord, beats: Rational, commands: &Receiver<Command>) {
        let voiced = voicing::voice(self.voicing, &chord, self.state.previous_voiced.as_ref());
        self.release_and_attack(&voiced);
        let seconds_per_beat = 60.0 / self.state.current_tempo.max(1) as f64;
        let duration = Duration::from_secs_f64(beats.to_f64() * seconds_per_beat);
        if self.state.status == PlayerStatus::Playing {
            self.sleep_interruptible(commands, duration);
        } else {
            std::thread::sleep(duration);
        }
        if !chord.is_rest() {
            self.state.previous_voiced = Some(voiced);
        }
    }

    fn advance_one_step(&mut self, commands: &Receiver<Command>) {
        if let Some(pending) = self.state.pending_step.take() {
            self.resume_play_step(pending, commands);
            return;
        }
        let step = match self.state.plan.as_ref().and_then(|plan| plan.steps.get(self.state.cursor)).cloned() {
            Some(step) => step,
            None => {
                self.stop();
                return;
            }
        };
        match step {
            PlanStep::ContextChange { tempo, time_sig, key } => {
                self.apply_context_change(tempo, time_sig, key);
                self.state.cursor += 1;
            }
            PlanStep::Play { chord, beats, span } => self.begin_play_step(chord, beats, span, commands),
        }
    }

    fn apply_context_change(&mut self, tempo: Option<TempoExpr>, time_sig: Option<TimeSig>, key: Option<KeyContext>) {
        if let Some(expr) = tempo {
            self.state.current_tempo = apply_tempo(self.state.current_tempo, self.state.initial_tempo, expr);
        }
        if let Some(ts) = time_sig {
            self.state.current_time_sig = ts;
        }
        if let Some(k) = key {
            self.state.current_key = k;
        }
        self.publish_state(None);
    }

    fn begin_play_step(&mut self, chord: ResolvedChord, beats: Rational, span: Span, commands: &Receiver<Command>) {
        let voiced = voicing::voice(self.voicing, &chord, self.state.previous_voiced.as_ref());
        self.release_and_attack(&voiced);
        (self.on_highlight)(Some(span));
        let seconds_per_beat = 60.0 / self.state.current_tempo.max(1) as f64;
        let duration = Duration::from_secs_f64(beats.to_f64() * seconds_per_beat);
        self.publish_state(Some(chord.symbol.serialize()));
        let pending = PendingStep { chord, span, voiced, remaining: duration };
        self.run_step_sleep(pending, commands);
    }

    /// Resume re-attacks the paused step's voicing before continuing its
    /// remaining sleep (`spec.md` §4.7 "Resume ... re-issues the current
    /// step's voicing").
    fn resume_play_step(&mut self, pending: PendingStep, commands: &Receiver<Command>) {
        self.release_and_attack(&pending.voiced);
        (self.on_highlight)(Some(pending.span));
        self.publish_state(Some(pending.chord.symbol.serialize()));
        self.run_step_sleep(pending, commands);
    }

    fn run_step_sleep(&mut self, pending: PendingStep, commands: &Receiver<Command>) {
        match self.sleep_interruptible(commands, pending.remaining) {
            SleepOutcome::Completed => {
                if !pending.chord.is_rest() {
                    self.state.previous_voiced = Some(pending.voiced);
                }
                self.state.cursor += 1;
            }
            SleepOutcome::Interrupted(remaining) => {
                if self.state.status == PlayerStatus::Paused {
                    self.state.pending_step = Some(PendingStep { remaining, ..pending });
                }
                // Stop already reset cursor/state in its own handler.
            }
        }
    }

    /// Sleep for `duration`, processing any command that arrives in the
    /// meantime. Every wait chunk is capped at [`CANCEL_GRANULARITY`] so
    /// Pause/Stop take effect promptly even with nothing to dispatch.
    fn sleep_interruptible(&mut self, commands: &Receiver<Command>, duration: Duration) -> SleepOutcome {
        let deadline = Instant::now() + duration;
        loop {
            if self.state.status != PlayerStatus::Playing {
                return SleepOutcome::Interrupted(deadline.saturating_duration_since(Instant::now()));
            }
            let now = Instant::now();
            if now >= deadline {
                return SleepOutcome::Completed;
            }
            let chunk = (deadline - now).min(CANCEL_GRANULARITY);
            match commands.recv_timeout(chunk) {
                Ok(command) => {
                    self.handle_command(command, commands);
                    if self.state.status != PlayerStatus::Playing {
                        return SleepOutcome::Interrupted(deadline.saturating_duration_since(Instant::now()));
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    self.state.status = PlayerStatus::Stopped;
                    return SleepOutcome::Interrupted(Duration::ZERO);
                }
            }
        }
    }

    /// Release pitches no longer sounding and attack newly required ones
    /// (`spec.md` §4.7 step execution order, points 1-2). Diffing against
    /// `active_pitches` (not `previous_voiced`) naturally covers "release
    /// all" when there is no previous voicing to compare against.
    fn release_and_attack(&mut self, voiced: &VoicedChord) {
        let new_pitches = voiced.all_pitches();
        let stale: Vec<u8> = self
            .state
            .active_pitches
            .iter()
            .copied()
            .filter(|pitch| !new_pitches.contains(pitch))
            .collect();
        for pitch in stale {
            self.buffer.push(SynthEvent::NoteOff { channel: 0, pitch });
        }
        for &pitch in &new_pitches {
            if !self.state.active_pitches.contains(&pitch) {
                let velocity = if Some(pitch) == voiced.bass_pitch {
                    voiced.bass_velocity
                } else {
                    voiced
                        .voiced_pitches
                        .iter()
                        .position(|&p| p == pitch)
                        .map(|i| voiced.velocities[i])
                        .unwrap_or(90)
                };
                self.buffer.push(SynthEvent::NoteOn { channel: 0, pitch, velocity });
            }
        }
        self.state.active_pitches = new_pitches;
    }

    fn release_all(&mut self) {
        let stale: Vec<u8> = self.state.active_pitches.drain(..).collect();
        for pitch in stale {
            self.buffer.push(SynthEvent::NoteOff { channel: 0, pitch });
        }
    }

    fn publish_state(&mut self, chord_name: Option<String>) {
        let snapshot = StateSnapshot {
            status: self.state.status,
            cursor: self.state.cursor,
            bpm: self.state.current_tempo,
            time_sig: self.state.current_time_sig,
            key: self.state.current_key,
            chord_name,
        };
        (self.on_state_change)(snapshot);
    }
}
