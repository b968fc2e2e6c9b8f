//! # NotationConverter
//!
//! Translation between American, European solfège, and Roman-numeral chord
//! representations (`spec.md` §4.2). Conversion operates on already-parsed
//! [`ChordSymbol`]/[`RomanChord`] values, never on text, so it is idempotent
//! — a concrete chord is always stored rooted on an American [`NoteName`]
//! (see [`crate::chord`]); European is purely a rendering convention
//! recovered here, and Roman numerals are evaluated against a key.

use crate::chord::roman::{Mode, RomanChord, RomanSeventh, Sign};
use crate::chord::{ChordData, ChordSymbol, Quality, Seventh};
use crate::note::{pitch_class, Accidental, NoteName};
use serde::{Deserialize, Serialize};

/// Which form the document is currently written/displayed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotationKind {
    American,
    European,
    Roman,
}

const SOLFEGE: [(NoteName, &str); 7] = [
    (NoteName::C, "Do"),
    (NoteName::D, "Re"),
    (NoteName::E, "Mi"),
    (NoteName::F, "Fa"),
    (NoteName::G, "Sol"),
    (NoteName::A, "La"),
    (NoteName::B, "Si"),
];

/// American letter name to its European solfège syllable.
pub fn american_to_european(name: NoteName) -> &'static str {
    SOLFEGE.iter().find(|(n, _)| *n == name).map(|(_, s)| *s).unwrap()
}

/// European solfège syllable to its American letter name. Returns `None`
/// for anything that isn't one of the seven recognized syllables.
pub fn european_to_american(s: &str) -> Option<NoteName> {
    SOLFEGE.iter().find(|(_, syllable)| *syllable == s).map(|(n, _)| *n)
}

/// Render a concrete chord with its root and bass spelled in European
/// solfège. Everything else (accidentals, quality, extensions, duration)
/// is unchanged — only the letter names move (`spec.md` §4.2).
pub fn render_european(symbol: &ChordSymbol) -> String {
    let ChordSymbol::Chord(chord) = symbol else {
        return symbol.serialize();
    };

    // Serialize everything between the root and the bass/duration with the
    // root pinned to a bare `C` so we can splice it back out, then rebuild
    // root, body, bass and duration in the canonical field order.
    let mut body_chord = chord.clone();
    body_chord.root = NoteName::C;
    body_chord.accidental = Accidental::None;
    body_chord.bass = None;
    body_chord.beats = None;
    let body = ChordSymbol::Chord(body_chord).serialize();
    let body = body.strip_prefix('C').unwrap_or(&body);

    let mut out = format!("{}{}", american_to_european(chord.root), chord.accidental);
    out.push_str(body);
    if let Some((bass_note, bass_accidental)) = chord.bass {
        out.push('/');
        out.push_str(american_to_european(bass_note));
        out.push_str(&bass_accidental.to_string());
    }
    if let Some(beats) = chord.beats {
        out.push('*');
        out.push_str(&beats.to_string());
    }
    out
}

/// Evaluate a Roman-numeral chord against a key, normalizing it to a
/// concrete American chord (`spec.md` §4.2 "Roman → American").
pub fn roman_to_american(roman: &RomanChord, key_root: NoteName, key_accidental: Accidental, mode: Mode) -> ChordSymbol {
    roman.evaluate(key_root, key_accidental, mode)
}

/// The inverse of [`roman_to_american`]: express a concrete chord as a
/// Roman numeral relative to a key. Used for batch notation conversion and
/// for the round-trip invariant (`spec.md` §8 invariant 3). Chord qualities
/// that have no Roman spelling in this grammar (half-diminished, minor
/// major-7th) fall back to a bare triad numeral with no seventh; those
/// combinations never arise from [`roman_to_american`] itself, so the
/// round trip holds for every chord that actually came from Roman input.
pub fn american_to_roman(chord: &ChordData, key_root: NoteName, key_accidental: Accidental, mode: Mode) -> RomanChord {
    let degree_idx = key_root.steps_to(chord.root);
    let degree = (degree_idx + 1) as u8;

    let steps = match mode {
        Mode::Major => crate::chord::roman::MAJOR_STEPS,
        Mode::Minor => crate::chord::roman::MINOR_STEPS,
    };
    let key_pc = pitch_class(key_root, key_accidental);
    let expected_pc = (key_pc + steps[degree_idx as usize]).rem_euclid(12);
    let actual_pc = pitch_class(chord.root, chord.accidental);
    let accidental = sign_for_diff(actual_pc, expected_pc);

    let lowercase = matches!(chord.quality, Quality::Minor | Quality::Dim);
    let diminished = chord.quality == Quality::Dim;

    let seventh = match chord.seventh {
        Seventh::None => None,
        Seventh::Maj7 => Some(RomanSeventh::Maj7),
        Seventh::Dom7 | Seventh::Min7 | Seventh::Dim7 => Some(RomanSeventh::Dom7),
        Seventh::M7b5 | Seventh::MM7 => None,
    };

    let bass = chord.bass.map(|(bass_root, bass_accidental)| {
        let bass_degree_idx = key_root.steps_to(bass_root);
        let bass_expected = (key_pc + steps[bass_degree_idx as usize]).rem_euclid(12);
        let bass_actual = pitch_class(bass_root, bass_accidental);
        let bass_accidental_prefix = sign_for_diff(bass_actual, bass_expected);
        (bass_accidental_prefix, (bass_degree_idx + 1) as u8, false)
    });

    RomanChord {
        accidental,
        degree,
        lowercase,
        diminished,
        seventh,
        bass,
        beats: chord.beats,
    }
}

fn sign_for_diff(actual_pc: i32, expected_pc: i32) -> Option<Sign> {
    let diff = (actual_pc - expected_pc + 18).rem_euclid(12) - 6;
    match diff {
        0 => None,
        d if d > 0 => Some(Sign::Sharp),
        _ => Some(Sign::Flat),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bijection_round_trips_through_solfege() {
        for (name, syllable) in SOLFEGE {
            assert_eq!(european_to_american(syllable), Some(name));
            assert_eq!(american_to_european(name), syllable);
        }
    }

    #[test]
    fn unknown_syllable_is_none() {
        assert_eq!(european_to_american("Xyz"), None);
    }

    #[test]
    fn roman_round_trips_through_american() {
        for token in ["I", "IV", "V", "ii", "vii°", "ii7", "bVII"] {
            let roman = crate::chord::roman::parse(token).unwrap();
            let concrete = roman_to_american(&roman, NoteName::C, Accidental::None, Mode::Major);
            let ChordSymbol::Chord(chord) = concrete else {
                panic!("expected a chord")
            };
            let back = american_to_roman(&chord, NoteName::C, Accidental::None, Mode::Major);
            assert_eq!(back.degree, roman.degree);
            assert_eq!(back.lowercase, roman.lowercase);
            assert_eq!(back.diminished, roman.diminished);
            assert_eq!(back.accidental, roman.accidental);
            assert_eq!(back.seventh, roman.seventh);
        }
    }

    #[test]
    fn european_rendering_changes_only_letters() {
        let chord = ChordData::new(NoteName::F, Accidental::Sharp);
        let rendered = render_european(&ChordSymbol::Chord(chord));
        assert_eq!(rendered, "Fa#");
    }
}
