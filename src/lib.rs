//! # chordsheet
//!
//! A chord-sheet parsing, voicing, and playback scheduling engine.
//!
//! ## Pipeline
//!
//! ```text
//! document text → SongParser → SongProgram → PlanBuilder → PlaybackPlan → Scheduler → SynthSink
//!                                                              ^
//!                                                     VoicingEngine (per Play step)
//! ```
//!
//! 1. **SongParser** ([`song`]) — classifies each line (chord, lyric,
//!    comment, or directive) and parses its tokens, recording source spans
//!    for editor highlight and click-to-play.
//! 2. **PlanBuilder** ([`plan`]) — flattens a [`song::SongProgram`] into a
//!    finite [`plan::PlaybackPlan`]: loops unrolled, labels resolved, Roman
//!    numerals resolved against the key in effect, tempo arithmetic left
//!    unevaluated for the scheduler.
//! 3. **VoicingEngine** ([`voicing`]) — turns a resolved chord into concrete
//!    MIDI pitches and velocities, voice-led against the previous chord.
//! 4. **Scheduler** ([`scheduler`]) — walks the plan in real time, emitting
//!    [`event_buffer::SynthEvent`]s and publishing highlight/state
//!    callbacks; owns Pause/Resume/Stop and click-to-play.
//! 5. **Interactor** ([`interactor`]) — maps an editor click to a scheduler
//!    command.
//!
//! ## Quick start
//!
//! ```rust
//! use chordsheet::{build_plan, parse_song, KeyContext, NotationKind};
//! use chordsheet::chord::roman::Mode;
//! use chordsheet::note::{Accidental, NoteName};
//! use chordsheet::directive::TimeSig;
//!
//! let program = parse_song("{tempo:120}\nC G Am F", NotationKind::American);
//! let key = KeyContext::new(NoteName::C, Accidental::None, Mode::Major);
//! let plan = build_plan(&program, 0, 120, TimeSig { num: 4, unit: 4 }, key, NotationKind::American)?;
//! assert_eq!(plan.steps.len(), 5); // one ContextChange + four Play steps
//! # Ok::<(), chordsheet::ChordSheetError>(())
//! ```
//!
//! ## Module structure
//!
//! - [`note`] — note names, accidentals, and MIDI pitch conversion.
//! - [`rational`] — exact beat-duration arithmetic.
//! - [`error`] — error types ([`ChordSheetError`]).
//! - [`directive`] — `{name:value}` directive grammar.
//! - [`chord`] — chord symbol parsing, American/Roman chord data.
//! - [`notation`] — American/European/Roman notation conversion.
//! - [`song`] — line classification and document parsing.
//! - [`plan`] — flattening a document into a finite playback plan.
//! - [`voicing`] — piano and guitar voicing backends.
//! - [`event_buffer`] — the bounded scheduler-to-synth event queue.
//! - [`scheduler`] — real-time playback walking the plan.
//! - [`interactor`] — editor click → scheduler command.
//! - [`config`] — the persisted `PlayerConfig` shape.

pub mod chord;
pub mod config;
pub mod directive;
pub mod error;
pub mod event_buffer;
pub mod interactor;
pub mod note;
pub mod notation;
pub mod plan;
pub mod rational;
pub mod scheduler;
pub mod song;
pub mod voicing;

pub use config::PlayerConfig;
pub use error::ChordSheetError;
pub use event_buffer::{drain_forever, EventBuffer, SynthEvent, SynthSink};
pub use interactor::Interactor;
pub use notation::NotationKind;
pub use plan::{apply_tempo, build_plan, KeyContext, PlanStep, PlanWarning, PlaybackPlan, ResolvedChord};
pub use rational::Rational;
pub use scheduler::{Command, PlayerStatus, Scheduler, StateSnapshot};
pub use song::{parse_song, Line, Span, SongProgram};
pub use voicing::{voice, VoicedChord, VoicingKind};
