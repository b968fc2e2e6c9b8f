//! # ChordSymbol
//!
//! Immutable value type for a parsed chord token, plus the serializer that
//! turns one back into canonical text (`spec.md` §3, §8 invariant 1).
//!
//! A chord token is either a concrete chord ([`ChordData`], rooted on an
//! American letter name after European solfège has been mapped over — see
//! [`crate::notation`]), a rest ([`ChordSymbol::Rest`]), or — before Roman
//! numerals are evaluated against a key — a [`crate::chord::roman::RomanChord`]
//! held separately by [`ParsedToken`].

pub mod parser;
pub mod roman;

use crate::note::{Accidental, NoteName};
use crate::rational::Rational;
use std::collections::BTreeSet;
use std::fmt;

pub use parser::{parse_chord_token, ChordParseError, ChordParseErrorKind};
pub use roman::RomanChord;

/// Triad/base quality. `Power` (a "5" chord — root + fifth only) forbids
/// `seventh`, `extension`, and `add_notes` (`spec.md` §3 invariant).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quality {
    Major,
    Minor,
    Dim,
    Aug,
    Sus2,
    Sus4,
    Power,
}

/// Seventh-interval flavor layered on top of the triad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Seventh {
    #[default]
    None,
    Dom7,
    Maj7,
    Min7,
    Dim7,
    M7b5,
    MM7,
}

/// Which extended interval (9th/11th/13th) is present, and its flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionDegree {
    Nine,
    Eleven,
    Thirteen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionKind {
    Plain,
    Maj,
    Minor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtensionSpec {
    pub degree: ExtensionDegree,
    pub kind: ExtensionKind,
}

/// A bare added color tone (`add9`, `add6`, ...) that does not imply a
/// seventh, unlike an `ExtensionSpec`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AddDegree {
    Two,
    Four,
    Six,
    Nine,
    Eleven,
    Thirteen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Flat,
    Sharp,
}

/// A single alteration, e.g. `b5` is `Alteration { degree: 5, sign: Flat }`.
/// Alterations are kept in the order they were written; a later alteration
/// of the same degree replaces an earlier unaltered interval of that degree
/// when the chord is expanded to pitch classes (`spec.md` §4.5 step 1).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Alteration {
    pub degree: u8,
    pub sign: Sign,
}

/// A fully parsed, concrete (non-Roman) chord.
#[derive(Debug, Clone, PartialEq)]
pub struct ChordData {
    pub root: NoteName,
    pub accidental: Accidental,
    pub quality: Quality,
    pub seventh: Seventh,
    pub extension: Option<ExtensionSpec>,
    pub add_notes: BTreeSet<AddDegree>,
    pub alterations: Vec<Alteration>,
    pub bass: Option<(NoteName, Accidental)>,
    pub beats: Option<Rational>,
}

impl ChordData {
    pub fn new(root: NoteName, accidental: Accidental) -> Self {
        Self {
            root,
            accidental,
            quality: Quality::Major,
            seventh: Seventh::None,
            extension: None,
            add_notes: BTreeSet::new(),
            alterations: Vec::new(),
            bass: None,
            beats: None,
        }
    }

    /// The unaltered semitone distance above the root for a (possibly
    /// compound) scale degree, using the major-scale reference that jazz
    /// alteration notation is written against (`b5`, `#11`, ...).
    fn natural_degree_semitone(degree: u8) -> i32 {
        let reduced = ((degree - 1) % 7) + 1;
        let octaves = ((degree - 1) / 7) as i32;
        let base = match reduced {
            1 => 0,
            2 => 2,
            3 => 4,
            4 => 5,
            5 => 7,
            6 => 9,
            7 => 11,
            _ => unreachable!(),
        };
        base + 12 * octaves
    }

    /// Expand to the unordered set of pitch classes (0-11) the chord
    /// sounds, per `spec.md` §4.5 step 1: root, third/none-for-sus, fifth
    /// (altered for dim/aug), seventh, extension, add notes, then
    /// alterations — applied last, replacing any unaltered interval at the
    /// same degree.
    pub fn pitch_classes(&self) -> BTreeSet<i32> {
        let mut intervals: std::collections::BTreeMap<u8, i32> = std::collections::BTreeMap::new();
        intervals.insert(1, 0);
        match self.quality {
            Quality::Power => {
                intervals.insert(5, 7);
            }
            Quality::Sus2 => {
                intervals.insert(2, 2);
                intervals.insert(5, 7);
            }
            Quality::Sus4 => {
                intervals.insert(4, 5);
                intervals.insert(5, 7);
            }
            Quality::Major => {
                intervals.insert(3, 4);
                intervals.insert(5, 7);
            }
            Quality::Minor => {
                intervals.insert(3, 3);
                intervals.insert(5, 7);
            }
            Quality::Dim => {
                intervals.insert(3, 3);
                intervals.insert(5, 6);
            }
            Quality::Aug => {
                intervals.insert(3, 4);
                intervals.insert(5, 8);
            }
        }
        match self.seventh {
            Seventh::None => {}
            Seventh::Dom7 | Seventh::Min7 | Seventh::M7b5 => {
                intervals.insert(7, 10);
            }
            Seventh::Maj7 | Seventh::MM7 => {
                intervals.insert(7, 11);
            }
            Seventh::Dim7 => {
                intervals.insert(7, 9);
            }
        }
        if let Some(ext) = self.extension {
            let degree = match ext.degree {
                ExtensionDegree::Nine => 9,
                ExtensionDegree::Eleven => 11,
                ExtensionDegree::Thirteen => 13,
            };
            intervals.insert(degree, Self::natural_degree_semitone(degree));
            intervals.entry(7).or_insert(10);
        }
        for add in &self.add_notes {
            let degree = match add {
                AddDegree::Two => 2,
                AddDegree::Four => 4,
                AddDegree::Six => 6,
                AddDegree::Nine => 9,
                AddDegree::Eleven => 11,
                AddDegree::Thirteen => 13,
            };
            intervals.insert(degree, Self::natural_degree_semitone(degree));
        }
        for alt in &self.alterations {
            let natural = Self::natural_degree_semitone(alt.degree);
            let offset = natural + if alt.sign == Sign::Flat { -1 } else { 1 };
            intervals.insert(alt.degree, offset);
        }

        let root_pc = crate::note::pitch_class(self.root, self.accidental);
        intervals.values().map(|semitone| (root_pc + semitone).rem_euclid(12)).collect()
    }
}

/// A chord token: either a concrete chord, or a rest (`NC`) of a given
/// duration (`spec.md` §3: "NC Token ... equivalent to ChordSymbol::Rest").
#[derive(Debug, Clone, PartialEq)]
pub enum ChordSymbol {
    Chord(ChordData),
    Rest { beats: Option<Rational> },
}

impl ChordSymbol {
    pub fn beats(&self) -> Option<Rational> {
        match self {
            ChordSymbol::Chord(c) => c.beats,
            ChordSymbol::Rest { beats } => *beats,
        }
    }

    /// Pitch-class set the chord sounds; empty for a rest.
    pub fn pitch_classes(&self) -> BTreeSet<i32> {
        match self {
            ChordSymbol::Chord(c) => c.pitch_classes(),
            ChordSymbol::Rest { .. } => BTreeSet::new(),
        }
    }

    /// Canonical text form. Round-trips through [`parse_chord_token`]:
    /// `parse(serialize(parse(t))) == parse(t)` for any accepted `t`
    /// (`spec.md` §8 invariant 1).
    pub fn serialize(&self) -> String {
        match self {
            ChordSymbol::Rest { beats } => match beats {
                Some(b) => format!("NC*{b}"),
                None => "NC".to_string(),
            },
            ChordSymbol::Chord(c) => {
                let mut s = format!("{}{}", c.root, c.accidental);
                s.push_str(match c.quality {
                    Quality::Major => "",
                    Quality::Minor => "m",
                    Quality::Dim => "dim",
                    Quality::Aug => "aug",
                    Quality::Sus2 => "sus2",
                    Quality::Sus4 => "sus4",
                    Quality::Power => "5",
                });
                s.push_str(match c.seventh {
                    Seventh::None => "",
                    Seventh::Dom7 => "7",
                    Seventh::Maj7 => "maj7",
                    Seventh::Min7 => "m7",
                    Seventh::Dim7 => "dim7",
                    Seventh::M7b5 => "m7b5",
                    Seventh::MM7 => "mM7",
                });
                if let Some(ext) = c.extension {
                    s.push_str(match ext.kind {
                        ExtensionKind::Plain => "",
                        ExtensionKind::Maj => "maj",
                        ExtensionKind::Minor => "m",
                    });
                    s.push_str(match ext.degree {
                        ExtensionDegree::Nine => "9",
                        ExtensionDegree::Eleven => "11",
                        ExtensionDegree::Thirteen => "13",
                    });
                }
                for add in &c.add_notes {
                    s.push_str("add");
                    s.push_str(match add {
                        AddDegree::Two => "2",
                        AddDegree::Four => "4",
                        AddDegree::Six => "6",
                        AddDegree::Nine => "9",
                        AddDegree::Eleven => "11",
                        AddDegree::Thirteen => "13",
                    });
                }
                for alt in &c.alterations {
                    s.push(if alt.sign == Sign::Flat { 'b' } else { '#' });
                    s.push_str(&alt.degree.to_string());
                }
                if let Some((bass_note, bass_acc)) = &c.bass {
                    s.push('/');
                    s.push_str(&bass_note.to_string());
                    s.push_str(&bass_acc.to_string());
                }
                if let Some(beats) = c.beats {
                    s.push('*');
                    s.push_str(&beats.to_string());
                }
                s
            }
        }
    }
}

impl fmt::Display for ChordSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.serialize())
    }
}

/// Result of parsing a single whitespace-delimited token: either a concrete
/// chord/rest, or a Roman-numeral chord still awaiting key resolution
/// (`spec.md` §4.1 "Roman form").
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedToken {
    Concrete(ChordSymbol),
    Roman(RomanChord),
}

impl ParsedToken {
    pub fn beats(&self) -> Option<Rational> {
        match self {
            ParsedToken::Concrete(c) => c.beats(),
            ParsedToken::Roman(r) => r.beats,
        }
    }
}
