//! # VoicingEngine
//!
//! Turns a [`ResolvedChord`] into a [`VoicedChord`]: concrete MIDI pitches
//! and velocities, voice-led against the previously played chord
//! (`spec.md` §4.5). Two backends are implemented, selected by
//! [`VoicingKind`]: [`piano`] (octave-spread voicing) and [`guitar`]
//! (six-string fret search).

pub mod guitar;
pub mod piano;

use crate::plan::ResolvedChord;
use serde::{Deserialize, Serialize};

/// Which voicing backend produces sound for a resolved chord.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoicingKind {
    Piano,
    Guitar,
}

/// A resolved chord expressed as concrete MIDI pitches and velocities
/// (`spec.md` §3 "VoicedChord"). Empty for a rest; a rest never updates
/// `previous_voiced` (`spec.md` §4.5, last line) — callers simply skip
/// passing a rest's `VoicedChord` on as `previous` to the next call.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VoicedChord {
    pub bass_pitch: Option<u8>,
    pub bass_velocity: u8,
    pub voiced_pitches: Vec<u8>,
    pub velocities: Vec<u8>,
}

impl VoicedChord {
    pub fn is_silent(&self) -> bool {
        self.bass_pitch.is_none() && self.voiced_pitches.is_empty()
    }

    /// All sounding pitches, bass first, for `note_on` emission order.
    pub fn all_pitches(&self) -> Vec<u8> {
        let mut pitches: Vec<u8> = self.bass_pitch.into_iter().collect();
        pitches.extend(self.voiced_pitches.iter().copied());
        pitches
    }
}

/// Produce the voicing for `chord` using `kind`, voice-led against
/// `previous` (`None` for the first chord of a playback session, or after a
/// rest).
pub fn voice(kind: VoicingKind, chord: &ResolvedChord, previous: Option<&VoicedChord>) -> VoicedChord {
    match kind {
        VoicingKind::Piano => piano::voice(chord, previous),
        VoicingKind::Guitar => guitar::voice(chord, previous),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chord::{parse_chord_token, ParsedToken};
    use crate::note::{Accidental, NoteName, Pitch};

    fn resolved(token: &str) -> ResolvedChord {
        match parse_chord_token(token).unwrap() {
            ParsedToken::Concrete(symbol) => ResolvedChord { symbol },
            ParsedToken::Roman(_) => panic!("expected a concrete chord"),
        }
    }

    #[test]
    fn rest_produces_silent_voicing_for_both_backends() {
        let rest = resolved("NC");
        assert!(voice(VoicingKind::Piano, &rest, None).is_silent());
        assert!(voice(VoicingKind::Guitar, &rest, None).is_silent());
    }

    #[test]
    fn piano_voicing_places_bass_an_octave_below_root() {
        let c = resolved("C");
        let v = voice(VoicingKind::Piano, &c, None);
        assert_eq!(v.bass_pitch, Some(Pitch::new(NoteName::C, Accidental::None, 2).to_midi()));
        assert_eq!(v.bass_velocity, 110);
    }

    #[test]
    fn guitar_voicing_sounds_at_least_one_string() {
        let c = resolved("C");
        let v = voice(VoicingKind::Guitar, &c, None);
        assert!(!v.voiced_pitches.is_empty());
        assert!(v.velocities.iter().all(|&vel| vel == 95));
    }
}
