//! Roman-numeral chord tokens (`spec.md` §4.1 "Roman form").
//!
//! Parsing recognizes the token shape; evaluating a [`RomanChord`] against a
//! key (root + mode) into a concrete [`crate::chord::ChordSymbol`] is done
//! here too, since the evaluation is purely a function of the Roman value
//! and the key — [`crate::notation`] just calls it with the document's
//! current key.

use super::{ChordData, ChordSymbol, Quality, Seventh};
use crate::note::{pitch_class, Accidental, NoteName};
use crate::rational::Rational;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Flat,
    Sharp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RomanSeventh {
    Dom7,
    Maj7,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Major,
    Minor,
}

/// Major scale semitone offsets from the tonic, indexed by scale degree
/// (0 = tonic).
pub(crate) const MAJOR_STEPS: [i32; 7] = [0, 2, 4, 5, 7, 9, 11];
/// Natural minor scale semitone offsets from the tonic.
pub(crate) const MINOR_STEPS: [i32; 7] = [0, 2, 3, 5, 7, 8, 10];

#[derive(Debug, Clone, PartialEq)]
pub struct RomanChord {
    pub accidental: Option<Sign>,
    /// Scale degree, 1 (I/i) through 7 (VII/vii).
    pub degree: u8,
    pub lowercase: bool,
    pub diminished: bool,
    pub seventh: Option<RomanSeventh>,
    pub bass: Option<(Option<Sign>, u8, bool)>, // (accidental, degree, lowercase)
    pub beats: Option<Rational>,
}

/// Roman numeral literals, longest-first so "VII" isn't mistaken for "V".
const UPPER_NUMERALS: [(&str, u8); 7] = [
    ("VII", 7),
    ("VI", 6),
    ("IV", 4),
    ("III", 3),
    ("II", 2),
    ("I", 1),
    ("V", 5),
];
const LOWER_NUMERALS: [(&str, u8); 7] = [
    ("vii", 7),
    ("vi", 6),
    ("iv", 4),
    ("iii", 3),
    ("ii", 2),
    ("i", 1),
    ("v", 5),
];

/// Try to consume a roman numeral (with optional leading accidental) from
/// the start of `s`. Returns `(accidental, degree, lowercase, rest)`.
fn consume_numeral(s: &str) -> Option<(Option<Sign>, u8, bool, &str)> {
    let (accidental, rest) = match s.as_bytes().first() {
        Some(b'b') => (Some(Sign::Flat), &s[1..]),
        Some(b'#') => (Some(Sign::Sharp), &s[1..]),
        _ => (None, s),
    };

    let mut best: Option<(u8, bool, usize)> = None;
    for (lit, degree) in UPPER_NUMERALS.iter() {
        if rest.starts_with(lit) {
            if best.as_ref().map(|(_, _, len)| lit.len() > *len).unwrap_or(true) {
                best = Some((*degree, false, lit.len()));
            }
        }
    }
    for (lit, degree) in LOWER_NUMERALS.iter() {
        if rest.starts_with(lit) {
            if best.as_ref().map(|(_, _, len)| lit.len() > *len).unwrap_or(true) {
                best = Some((*degree, true, lit.len()));
            }
        }
    }
    let (degree, lowercase, len) = best?;
    Some((accidental, degree, lowercase, &rest[len..]))
}

/// Parse a Roman-numeral chord token body (duration suffix already
/// stripped by the caller). Returns `None` if `s` does not start with a
/// recognizable roman numeral at all (so the caller can fall back to the
/// American/European grammar).
pub fn parse(s: &str) -> Option<RomanChord> {
    let (accidental, degree, lowercase, rest) = consume_numeral(s)?;

    let mut rest = rest;
    let diminished = if let Some(stripped) = rest.strip_prefix('°') {
        rest = stripped;
        true
    } else {
        false
    };

    let seventh = if let Some(stripped) = rest.strip_prefix("maj7") {
        rest = stripped;
        Some(RomanSeventh::Maj7)
    } else if let Some(stripped) = rest.strip_prefix('7') {
        rest = stripped;
        Some(RomanSeventh::Dom7)
    } else {
        None
    };

    let bass = if let Some(stripped) = rest.strip_prefix('/') {
        let (bass_acc, bass_degree, bass_lower, bass_rest) = consume_numeral(stripped)?;
        if !bass_rest.is_empty() {
            return None;
        }
        Some((bass_acc, bass_degree, bass_lower))
    } else if rest.is_empty() {
        None
    } else {
        return None;
    };

    Some(RomanChord {
        accidental,
        degree,
        lowercase,
        diminished,
        seventh,
        bass,
        beats: None,
    })
}

/// The note name and accidental a scale degree resolves to against a key
/// whose tonic is `key_root`/`key_accidental`.
fn resolve_degree(
    key_root: NoteName,
    key_accidental: Accidental,
    mode: Mode,
    degree: u8,
    accidental_prefix: Option<Sign>,
) -> (NoteName, Accidental) {
    let steps = match mode {
        Mode::Major => MAJOR_STEPS,
        Mode::Minor => MINOR_STEPS,
    };
    let degree_idx = (degree - 1) as usize % 7;
    let key_pc = pitch_class(key_root, key_accidental);
    let prefix_offset = match accidental_prefix {
        Some(Sign::Flat) => -1,
        Some(Sign::Sharp) => 1,
        None => 0,
    };
    let target_pc = (key_pc + steps[degree_idx] + prefix_offset).rem_euclid(12);

    let letter = key_root.step(degree_idx as i32);
    let letter_pc = pitch_class(letter, Accidental::None);
    let diff = (target_pc - letter_pc + 18).rem_euclid(12) - 6; // signed, range -6..=5
    let resolved_accidental = match diff {
        0 => Accidental::None,
        1 => Accidental::Sharp,
        -1 => Accidental::Flat,
        d if d > 0 => Accidental::Sharp,
        _ => Accidental::Flat,
    };
    (letter, resolved_accidental)
}

impl RomanChord {
    /// Evaluate against a key, producing a concrete chord rooted on an
    /// American letter name (`spec.md` §4.2 "Roman → American").
    pub fn evaluate(&self, key_root: NoteName, key_accidental: Accidental, mode: Mode) -> ChordSymbol {
        let (root, accidental) = resolve_degree(key_root, key_accidental, mode, self.degree, self.accidental);

        let mut chord = ChordData::new(root, accidental);
        chord.quality = if self.diminished {
            Quality::Dim
        } else if self.lowercase {
            Quality::Minor
        } else {
            Quality::Major
        };
        chord.seventh = match self.seventh {
            None => Seventh::None,
            Some(RomanSeventh::Maj7) => Seventh::Maj7,
            Some(RomanSeventh::Dom7) => match chord.quality {
                Quality::Dim => Seventh::Dim7,
                Quality::Minor => Seventh::Min7,
                _ => Seventh::Dom7,
            },
        };
        if let Some((bass_acc, bass_degree, bass_lower)) = self.bass {
            let _ = bass_lower; // bass roman numerals don't carry their own quality
            let (bass_root, bass_accidental) =
                resolve_degree(key_root, key_accidental, mode, bass_degree, bass_acc);
            chord.bass = Some((bass_root, bass_accidental));
        }
        chord.beats = self.beats;
        ChordSymbol::Chord(chord)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_major_numeral() {
        let r = parse("IV").unwrap();
        assert_eq!(r.degree, 4);
        assert!(!r.lowercase);
    }

    #[test]
    fn parses_minor_with_seventh() {
        let r = parse("ii7").unwrap();
        assert_eq!(r.degree, 2);
        assert!(r.lowercase);
        assert_eq!(r.seventh, Some(RomanSeventh::Dom7));
    }

    #[test]
    fn parses_diminished_seventh_with_slash_bass() {
        let r = parse("vii°7/V").unwrap();
        assert_eq!(r.degree, 7);
        assert!(r.diminished);
        assert_eq!(r.bass, Some((None, 5, false)));
    }

    #[test]
    fn evaluates_one_in_c_major_to_c() {
        let r = parse("I").unwrap();
        let resolved = r.evaluate(NoteName::C, Accidental::None, Mode::Major);
        match resolved {
            ChordSymbol::Chord(c) => {
                assert_eq!(c.root, NoteName::C);
                assert_eq!(c.accidental, Accidental::None);
                assert_eq!(c.quality, Quality::Major);
            }
            _ => panic!("expected a chord"),
        }
    }

    #[test]
    fn evaluates_five_in_c_major_to_g() {
        let r = parse("V").unwrap();
        let resolved = r.evaluate(NoteName::C, Accidental::None, Mode::Major);
        match resolved {
            ChordSymbol::Chord(c) => assert_eq!((c.root, c.accidental), (NoteName::G, Accidental::None)),
            _ => panic!("expected a chord"),
        }
    }

    #[test]
    fn evaluates_flat_seven_in_c_major_to_bb() {
        let r = parse("bVII").unwrap();
        let resolved = r.evaluate(NoteName::C, Accidental::None, Mode::Major);
        match resolved {
            ChordSymbol::Chord(c) => assert_eq!((c.root, c.accidental), (NoteName::B, Accidental::Flat)),
            _ => panic!("expected a chord"),
        }
    }

    #[test]
    fn evaluates_two_in_c_minor_to_d_diminished() {
        let r = parse("ii°").unwrap();
        let resolved = r.evaluate(NoteName::C, Accidental::None, Mode::Minor);
        match resolved {
            ChordSymbol::Chord(c) => {
                assert_eq!((c.root, c.accidental), (NoteName::D, Accidental::None));
                assert_eq!(c.quality, Quality::Dim);
            }
            _ => panic!("expected a chord"),
        }
    }
}
