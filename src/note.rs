//! # NoteMap
//!
//! Pitch-name ↔ MIDI integer conversion and the enharmonic spelling table.
//!
//! Middle C (`C`, octave 4) is MIDI 60, matching the rest of the crate's
//! convention (`spec.md` §3).

use std::fmt;

/// A note letter, A through G.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoteName {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl NoteName {
    /// Semitone offset from C within an octave (C=0 .. B=11).
    pub const fn semitone_from_c(self) -> i32 {
        match self {
            NoteName::C => 0,
            NoteName::D => 2,
            NoteName::E => 4,
            NoteName::F => 5,
            NoteName::G => 7,
            NoteName::A => 9,
            NoteName::B => 11,
        }
    }

    /// Parse an American letter name (`A`-`G`), case-insensitive.
    pub fn from_american(c: char) -> Option<Self> {
        match c.to_ascii_uppercase() {
            'C' => Some(NoteName::C),
            'D' => Some(NoteName::D),
            'E' => Some(NoteName::E),
            'F' => Some(NoteName::F),
            'G' => Some(NoteName::G),
            'A' => Some(NoteName::A),
            'B' => Some(NoteName::B),
            _ => None,
        }
    }

    /// The note a given number of diatonic scale steps away from this one
    /// (wrapping through the seven letter names). Used by Roman-numeral
    /// evaluation to find the letter name at a scale degree.
    pub fn step(self, steps: i32) -> Self {
        const ORDER: [NoteName; 7] = [
            NoteName::C,
            NoteName::D,
            NoteName::E,
            NoteName::F,
            NoteName::G,
            NoteName::A,
            NoteName::B,
        ];
        let idx = ORDER.iter().position(|n| *n == self).unwrap() as i32;
        let new_idx = (idx + steps).rem_euclid(7);
        ORDER[new_idx as usize]
    }

    /// Number of diatonic letter-steps (0..=6) from `self` to `other`,
    /// wrapping forward through the letter order. The inverse of [`step`]:
    /// `self.step(self.steps_to(other)) == other`.
    pub fn steps_to(self, other: Self) -> i32 {
        const ORDER: [NoteName; 7] = [
            NoteName::C,
            NoteName::D,
            NoteName::E,
            NoteName::F,
            NoteName::G,
            NoteName::A,
            NoteName::B,
        ];
        let from = ORDER.iter().position(|n| *n == self).unwrap() as i32;
        let to = ORDER.iter().position(|n| *n == other).unwrap() as i32;
        (to - from).rem_euclid(7)
    }
}

impl fmt::Display for NoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = match self {
            NoteName::C => 'C',
            NoteName::D => 'D',
            NoteName::E => 'E',
            NoteName::F => 'F',
            NoteName::G => 'G',
            NoteName::A => 'A',
            NoteName::B => 'B',
        };
        write!(f, "{c}")
    }
}

/// Accidental applied to a [`NoteName`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Accidental {
    #[default]
    None,
    Sharp,
    Flat,
}

impl Accidental {
    pub const fn semitone_offset(self) -> i32 {
        match self {
            Accidental::None => 0,
            Accidental::Sharp => 1,
            Accidental::Flat => -1,
        }
    }
}

impl fmt::Display for Accidental {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Accidental::None => Ok(()),
            Accidental::Sharp => f.write_str("#"),
            Accidental::Flat => f.write_str("b"),
        }
    }
}

/// A spelled pitch: letter name, accidental, and octave (MIDI-style, where
/// octave 4 spans C4=60 .. B4=71).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Pitch {
    pub name: NoteName,
    pub accidental: Accidental,
    pub octave: i32,
}

impl Pitch {
    pub const fn new(name: NoteName, accidental: Accidental, octave: i32) -> Self {
        Self {
            name,
            accidental,
            octave,
        }
    }

    /// Convert to a MIDI note number, clamped to the valid 0..=127 range.
    pub fn to_midi(self) -> u8 {
        let base = 12 * (self.octave + 1) + self.name.semitone_from_c() + self.accidental.semitone_offset();
        base.clamp(0, 127) as u8
    }

    /// Middle C: C4, MIDI 60.
    pub const fn middle_c() -> Self {
        Self::new(NoteName::C, Accidental::None, 4)
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.name, self.accidental, self.octave)
    }
}

/// Enharmonic spelling table: pitch class (0-11, C=0) to the preferred sharp
/// and flat spellings. Used when a computed pitch class needs a name but no
/// source spelling survived (e.g. voicing an altered extension).
pub fn pitch_class_name(pitch_class: i32, prefer_flats: bool) -> (NoteName, Accidental) {
    let pc = pitch_class.rem_euclid(12);
    const SHARP_SPELLING: [(NoteName, Accidental); 12] = [
        (NoteName::C, Accidental::None),
        (NoteName::C, Accidental::Sharp),
        (NoteName::D, Accidental::None),
        (NoteName::D, Accidental::Sharp),
        (NoteName::E, Accidental::None),
        (NoteName::F, Accidental::None),
        (NoteName::F, Accidental::Sharp),
        (NoteName::G, Accidental::None),
        (NoteName::G, Accidental::Sharp),
        (NoteName::A, Accidental::None),
        (NoteName::A, Accidental::Sharp),
        (NoteName::B, Accidental::None),
    ];
    const FLAT_SPELLING: [(NoteName, Accidental); 12] = [
        (NoteName::C, Accidental::None),
        (NoteName::D, Accidental::Flat),
        (NoteName::D, Accidental::None),
        (NoteName::E, Accidental::Flat),
        (NoteName::E, Accidental::None),
        (NoteName::F, Accidental::None),
        (NoteName::G, Accidental::Flat),
        (NoteName::G, Accidental::None),
        (NoteName::A, Accidental::Flat),
        (NoteName::A, Accidental::None),
        (NoteName::B, Accidental::Flat),
        (NoteName::B, Accidental::None),
    ];
    if prefer_flats {
        FLAT_SPELLING[pc as usize]
    } else {
        SHARP_SPELLING[pc as usize]
    }
}

/// Pitch class of a spelled note (0-11, independent of octave).
pub fn pitch_class(name: NoteName, accidental: Accidental) -> i32 {
    (name.semitone_from_c() + accidental.semitone_offset()).rem_euclid(12)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn middle_c_is_midi_60() {
        assert_eq!(Pitch::middle_c().to_midi(), 60);
    }

    #[test]
    fn sharp_and_flat_offsets() {
        assert_eq!(Pitch::new(NoteName::C, Accidental::Sharp, 4).to_midi(), 61);
        assert_eq!(Pitch::new(NoteName::D, Accidental::Flat, 4).to_midi(), 61);
    }

    #[test]
    fn step_wraps_through_letters() {
        assert_eq!(NoteName::B.step(1), NoteName::C);
        assert_eq!(NoteName::C.step(-1), NoteName::B);
    }

    #[test]
    fn steps_to_is_the_inverse_of_step() {
        assert_eq!(NoteName::C.steps_to(NoteName::G), 4);
        assert_eq!(NoteName::C.step(NoteName::C.steps_to(NoteName::G)), NoteName::G);
    }

    #[test]
    fn clamps_out_of_range() {
        assert_eq!(Pitch::new(NoteName::C, Accidental::None, -2).to_midi(), 0);
        assert_eq!(Pitch::new(NoteName::B, Accidental::Sharp, 9).to_midi(), 127);
    }

    #[test]
    fn enharmonic_round_trip() {
        let pc = pitch_class(NoteName::C, Accidental::Sharp);
        assert_eq!(pc, 1);
        assert_eq!(pitch_class_name(pc, false), (NoteName::C, Accidental::Sharp));
        assert_eq!(pitch_class_name(pc, true), (NoteName::D, Accidental::Flat));
    }
}
