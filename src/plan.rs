//! # PlaybackPlan build
//!
//! Flattens a [`SongProgram`] into a linear, finite sequence of
//! [`PlanStep`]s (`spec.md` §4.6): chord playback and context changes, with
//! loops fully unrolled and labels resolved. The scheduler only ever walks
//! this flat sequence — it never looks back at the source text.

use crate::chord::roman::Mode;
use crate::chord::{ChordSymbol, ParsedToken};
use crate::directive::{Directive, KeyMode, LoopTarget, TempoExpr, TimeSig};
use crate::error::ChordSheetError;
use crate::note::{Accidental, NoteName};
use crate::notation::roman_to_american;
use crate::rational::Rational;
use crate::song::{ChordToken, Line, Span, SongProgram};
use std::collections::HashMap;

/// Concrete key context: root, accidental, and major/minor mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyContext {
    pub root: NoteName,
    pub accidental: Accidental,
    pub mode: Mode,
}

impl KeyContext {
    pub const fn new(root: NoteName, accidental: Accidental, mode: Mode) -> Self {
        Self { root, accidental, mode }
    }
}

fn key_mode_to_mode(mode: KeyMode) -> Mode {
    match mode {
        KeyMode::Major => Mode::Major,
        KeyMode::Minor => Mode::Minor,
    }
}

/// A chord resolved against the current key and normalized to American
/// notation; empty notes for a rest (`spec.md` §3).
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedChord {
    pub symbol: ChordSymbol,
}

impl ResolvedChord {
    pub fn notes(&self) -> std::collections::BTreeSet<i32> {
        self.symbol.pitch_classes()
    }

    pub fn is_rest(&self) -> bool {
        matches!(self.symbol, ChordSymbol::Rest { .. })
    }

    /// Pitch class of the chord's root; `None` for a rest.
    pub fn root_pitch_class(&self) -> Option<i32> {
        match &self.symbol {
            ChordSymbol::Chord(c) => Some(crate::note::pitch_class(c.root, c.accidental)),
            ChordSymbol::Rest { .. } => None,
        }
    }

    /// Pitch class of the slash-chord bass note, if any; `None` for a rest
    /// or a chord with no explicit bass.
    pub fn bass_pitch_class(&self) -> Option<i32> {
        match &self.symbol {
            ChordSymbol::Chord(c) => c.bass.map(|(name, accidental)| crate::note::pitch_class(name, accidental)),
            ChordSymbol::Rest { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlanStep {
    Play { chord: ResolvedChord, beats: Rational, span: Span },
    ContextChange { tempo: Option<TempoExpr>, time_sig: Option<TimeSig>, key: Option<KeyContext> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlanWarning {
    pub message: String,
    pub span: Option<Span>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlaybackPlan {
    pub steps: Vec<PlanStep>,
    pub initial_tempo: u32,
    pub initial_time_sig: TimeSig,
    pub initial_key: KeyContext,
    pub warnings: Vec<PlanWarning>,
}

/// Walk directive effects on time signature and key across `lines`,
/// applying last-write-wins. Tempo is handled separately since its
/// arithmetic is stateful (`apply_tempo_history`) — time signature and key
/// must be concretely known at build time (they affect default beat counts
/// and Roman-numeral resolution), but tempo's own arithmetic is evaluated
/// lazily by the scheduler against the value captured here.
fn scan_time_and_key(lines: &[Line], time_sig: &mut TimeSig, key: &mut KeyContext) {
    for line in lines {
        if let Line::DirectiveLine(tokens) = line {
            for token in tokens {
                match &token.directive {
                    Directive::TimeSig(ts) => *time_sig = *ts,
                    Directive::Key { root, accidental, mode } => {
                        *key = KeyContext::new(*root, *accidental, key_mode_to_mode(*mode));
                    }
                    _ => {}
                }
            }
        }
    }
}

/// Apply the tempo arithmetic described in `spec.md` §4.4: `Absolute` sets
/// outright, `Delta` is relative to the running value, `Percent`/
/// `Multiplier`/`Reset` are relative to `anchor` (the tempo in effect when
/// the current playback session began).
pub fn apply_tempo(current: u32, anchor: u32, expr: TempoExpr) -> u32 {
    match expr {
        TempoExpr::Absolute(n) => n.max(1) as u32,
        TempoExpr::Delta(n) => (current as i32 + n).max(1) as u32,
        TempoExpr::Percent(p) => ((anchor as i64 * p as i64) / 100).max(1) as u32,
        TempoExpr::Multiplier(m) => ((anchor as f64 * m) as i64).max(1) as u32,
        TempoExpr::Reset => anchor,
    }
}

/// Replay tempo directives across `lines` starting from `base_tempo`, to
/// establish the tempo in effect at a mid-document start position
/// (`spec.md` §4.6 point 1: "directive effects encountered before the
/// start position").
fn scan_tempo_history(lines: &[Line], base_tempo: u32) -> u32 {
    let mut current = base_tempo;
    for line in lines {
        if let Line::DirectiveLine(tokens) = line {
            for token in tokens {
                if let Directive::Tempo(expr) = token.directive {
                    current = apply_tempo(current, base_tempo, expr);
                }
            }
        }
    }
    current
}

pub(crate) fn resolve_chord_token(
    token: &ChordToken,
    key: KeyContext,
    time_sig: TimeSig,
) -> (ResolvedChord, Rational) {
    let symbol = match &token.parsed {
        Ok(ParsedToken::Concrete(symbol)) => symbol.clone(),
        Ok(ParsedToken::Roman(roman)) => roman_to_american(roman, key.root, key.accidental, key.mode),
        // An unparseable token still occupies a beat in the bar; treat it
        // as a silent placeholder rather than dropping the timing slot.
        Err(_) => ChordSymbol::Rest { beats: None },
    };
    let beats = symbol.beats().unwrap_or_else(|| Rational::whole(time_sig.num as u32));
    (ResolvedChord { symbol }, beats)
}

/// Build a flat, finite [`PlaybackPlan`] from `program`, starting at
/// `start_line`. `base_tempo`/`base_time_sig`/`base_key` are the values in
/// effect before the document is considered at all (configuration
/// defaults, or the currently running player state).
pub fn build_plan(
    program: &SongProgram,
    start_line: usize,
    base_tempo: u32,
    base_time_sig: TimeSig,
    base_key: KeyContext,
    notation: crate::notation::NotationKind,
) -> Result<PlaybackPlan, ChordSheetError> {
    let _ = notation; // classification already happened in SongParser; kept for API symmetry.
    if start_line >= program.lines.len() {
        return Err(ChordSheetError::InvalidStartLine { line: start_line, len: program.lines.len() });
    }

    let mut time_sig = base_time_sig;
    let mut key = base_key;
    scan_time_and_key(&program.lines[..start_line], &mut time_sig, &mut key);
    let initial_tempo = scan_tempo_history(&program.lines[..start_line], base_tempo);
    let initial_time_sig = time_sig;
    let initial_key = key;

    let mut steps: Vec<PlanStep> = Vec::new();
    let mut warnings = Vec::new();
    let mut line_to_step_start: HashMap<usize, usize> = HashMap::new();
    line_to_step_start.insert(0, 0); // @start always resolves to line 0

    for (offset, line) in program.lines[start_line..].iter().enumerate() {
        let line_index = start_line + offset;
        line_to_step_start.entry(line_index).or_insert(steps.len());

        match line {
            Line::ChordLine(tokens) => {
                for token in tokens {
                    let (chord, beats) = resolve_chord_token(token, key, time_sig);
                    steps.push(PlanStep::Play { chord, beats, span: token.span });
                }
            }
            Line::LyricLine(_) | Line::CommentLine(_) => {}
            Line::DirectiveLine(tokens) => {
                for token in tokens {
                    match &token.directive {
                        Directive::Tempo(expr) => steps.push(PlanStep::ContextChange {
                            tempo: Some(*expr),
                            time_sig: None,
                            key: None,
                        }),
                        Directive::TimeSig(ts) => {
                            time_sig = *ts;
                            steps.push(PlanStep::ContextChange { tempo: None, time_sig: Some(*ts), key: None });
                        }
                        Directive::Key { root, accidental, mode } => {
                            key = KeyContext::new(*root, *accidental, key_mode_to_mode(*mode));
                            steps.push(PlanStep::ContextChange { tempo: None, time_sig: None, key: Some(key) });
                        }
                        Directive::Label(_) => {} // handled via line_to_step_start; no-op step
                        Directive::Loop { target, count } => {
                            let resolved_line = match target {
                                LoopTarget::Start => Some(0),
                                LoopTarget::Label(name) => program.labels.get(name).copied(),
                            };
                            match resolved_line.and_then(|line_idx| line_to_step_start.get(&line_idx).copied()) {
                                Some(target_step) => {
                                    let segment = steps[target_step..].to_vec();
                                    for _ in 1..*count {
                                        steps.extend(segment.clone());
                                    }
                                }
                                None => {
                                    let message = format!(
                                        "loop target {:?} is undefined or not yet reached; loop skipped",
                                        target
                                    );
                                    log::debug!("{message}");
                                    warnings.push(PlanWarning { message, span: Some(token.span) });
                                }
                            }
                        }
                        Directive::Capo(_) | Directive::Volume(_) | Directive::Unknown { .. } | Directive::Invalid { .. } => {}
                    }
                }
            }
        }
    }

    Ok(PlaybackPlan { steps, initial_tempo, initial_time_sig, initial_key, warnings })
}
