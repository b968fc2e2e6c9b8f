//! # Interactor
//!
//! Bridges editor clicks to scheduler commands (`spec.md` §4.9). Maps an
//! editor [`Span`] to a chord by linear search over the document — plenty
//! fast at the document sizes a chord sheet actually reaches.

use crate::directive::TimeSig;
use crate::error::ChordSheetError;
use crate::notation::NotationKind;
use crate::plan::{build_plan, resolve_chord_token, KeyContext};
use crate::scheduler::Command;
use crate::song::{Line, Span, SongProgram};
use crossbeam_channel::Sender;

pub struct Interactor {
    commands: Sender<Command>,
}

impl Interactor {
    pub fn new(commands: Sender<Command>) -> Self {
        Self { commands }
    }

    /// Resolve the chord token at `span` against `key`/`time_sig` and play
    /// it as a one-off (`spec.md` §4.9 "play_chord_at"). No-op if `span`
    /// doesn't land on a chord token.
    pub fn play_chord_at(&self, program: &SongProgram, span: Span, key: KeyContext, time_sig: TimeSig) {
        let Some(token) = find_chord_token(program, span) else {
            return;
        };
        let (chord, beats) = resolve_chord_token(token, key, time_sig);
        let _ = self.commands.send(Command::PlaySingle { chord, beats });
    }

    /// Build a plan starting at `cursor_line` and issue `Start`
    /// (`spec.md` §4.9 "start_from").
    pub fn start_from(
        &self,
        program: &SongProgram,
        cursor_line: usize,
        base_tempo: u32,
        base_time_sig: TimeSig,
        base_key: KeyContext,
        notation: NotationKind,
    ) -> Result<(), ChordSheetError> {
        let plan = build_plan(program, cursor_line, base_tempo, base_time_sig, base_key, notation)?;
        let _ = self.commands.send(Command::Start { plan, start_step: 0 });
        Ok(())
    }
}

fn find_chord_token<'a>(program: &'a SongProgram, span: Span) -> Option<&'a crate::song::ChordToken> {
    let line = program.lines.get(span.line)?;
    let Line::ChordLine(tokens) = line else {
        return None;
    };
    tokens.iter().find(|token| token.span == span)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chord::roman::Mode;
    use crate::note::{Accidental, NoteName};
    use crate::song::parse_song;

    fn c_major() -> KeyContext {
        KeyContext::new(NoteName::C, Accidental::None, Mode::Major)
    }

    #[test]
    fn play_chord_at_unknown_span_is_a_silent_no_op() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let interactor = Interactor::new(tx);
        let program = parse_song("C G", NotationKind::American);
        let bogus = Span { line: 9, start: 0, end: 1 };
        interactor.play_chord_at(&program, bogus, c_major(), TimeSig { num: 4, unit: 4 });
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn play_chord_at_matching_span_sends_play_single() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let interactor = Interactor::new(tx);
        let program = parse_song("C G", NotationKind::American);
        let Line::ChordLine(tokens) = &program.lines[0] else {
            panic!("expected a chord line");
        };
        let span = tokens[0].span;
        interactor.play_chord_at(&program, span, c_major(), TimeSig { num: 4, unit: 4 });
        match rx.try_recv() {
            Ok(Command::PlaySingle { chord, .. }) => assert_eq!(chord.symbol.serialize(), "C"),
            other => panic!("expected PlaySingle, got {}", other.is_ok()),
        }
    }

    #[test]
    fn start_from_sends_start_with_a_built_plan() {
        let (tx, rx) = crossbeam_channel::unbounded();
        let interactor = Interactor::new(tx);
        let program = parse_song("C G", NotationKind::American);
        interactor
            .start_from(&program, 0, 120, TimeSig { num: 4, unit: 4 }, c_major(), NotationKind::American)
            .unwrap();
        match rx.try_recv() {
            Ok(Command::Start { plan, start_step }) => {
                assert_eq!(start_step, 0);
                assert_eq!(plan.steps.len(), 2);
            }
            other => panic!("expected Start, got {}", other.is_ok()),
        }
    }
}
