//! # Error Types
//!
//! Most parsing failures in this crate are *not* exceptions: an invalid chord
//! token, a malformed directive, or a missing loop target are recorded as
//! data inline in the parsed artifact (see [`crate::chord::ChordParseErrorKind`],
//! the `Directive::Invalid` variant, and [`crate::plan::PlanWarning`]) so a
//! caller can keep rendering a document around an error instead of aborting.
//! `ChordSheetError` is reserved for failures with nowhere else to live:
//! building a plan from an out-of-range start line, or the synth backend
//! being unavailable entirely.
//!
//! ## Usage
//! ```rust
//! use chordsheet::ChordSheetError;
//!
//! fn describe(err: &ChordSheetError) -> String {
//!     err.to_string()
//! }
//! ```

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChordSheetError {
    /// Requested a playback plan starting at a line index past the end of
    /// the song.
    #[error("start line {line} is out of range (song has {len} lines)")]
    InvalidStartLine { line: usize, len: usize },

    /// The synth backend failed to initialize. Playback is disabled; the
    /// editor keeps functioning per the Fatal tier of the error taxonomy.
    #[error("synth unavailable: {0}")]
    SynthUnavailable(String),
}
