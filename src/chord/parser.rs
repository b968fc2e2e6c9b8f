//! Chord token grammar (`spec.md` §4.1).
//!
//! `parse_chord_token` accepts a single non-whitespace word and returns
//! either a concrete chord/rest or a Roman-numeral chord awaiting key
//! resolution. Rejection carries a `ChordParseErrorKind` so the caller (the
//! song parser) can render an invalid-chord marker without aborting the
//! line — per `spec.md` §4.1, "rejection is silent at the token level."

use super::{
    AddDegree, Alteration, ChordData, ChordSymbol, ExtensionDegree, ExtensionKind, ExtensionSpec,
    ParsedToken, Quality, Seventh, Sign,
};
use crate::note::{Accidental, NoteName};
use crate::rational::Rational;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChordParseErrorKind {
    EmptyToken,
    UnknownRoot,
    UnknownQuality,
    BadAlteration,
    BadDuration,
    BadBass,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChordParseError {
    pub kind: ChordParseErrorKind,
    pub token: String,
}

impl fmt::Display for ChordParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self.kind {
            ChordParseErrorKind::EmptyToken => "empty token",
            ChordParseErrorKind::UnknownRoot => "unknown root",
            ChordParseErrorKind::UnknownQuality => "unknown quality",
            ChordParseErrorKind::BadAlteration => "malformed alteration",
            ChordParseErrorKind::BadDuration => "malformed duration",
            ChordParseErrorKind::BadBass => "malformed bass note",
        };
        write!(f, "{reason}: {:?}", self.token)
    }
}

impl std::error::Error for ChordParseError {}

fn err(kind: ChordParseErrorKind, token: &str) -> ChordParseError {
    ChordParseError {
        kind,
        token: token.to_string(),
    }
}

const EUROPEAN_ROOTS: [(&str, NoteName); 7] = [
    ("Sol", NoteName::G),
    ("Do", NoteName::C),
    ("Re", NoteName::D),
    ("Mi", NoteName::E),
    ("Fa", NoteName::F),
    ("La", NoteName::A),
    ("Si", NoteName::B),
];

/// Consume a root name (American letter or European solfège) from the start
/// of `s`. Returns `(root, rest)`.
fn consume_root(s: &str) -> Option<(NoteName, &str)> {
    for (name, note) in EUROPEAN_ROOTS.iter() {
        if let Some(rest) = s.strip_prefix(name) {
            return Some((*note, rest));
        }
    }
    let mut chars = s.chars();
    let first = chars.next()?;
    let root = NoteName::from_american(first)?;
    // Only uppercase American letters are accepted as chord roots; a
    // lowercase letter here is either a Roman numeral (handled earlier) or
    // invalid.
    if !first.is_ascii_uppercase() {
        return None;
    }
    Some((root, chars.as_str()))
}

/// Consume a leading `#` or `b` accidental.
fn consume_accidental(s: &str) -> (Accidental, &str) {
    if let Some(rest) = s.strip_prefix('#') {
        (Accidental::Sharp, rest)
    } else if let Some(rest) = s.strip_prefix('b') {
        (Accidental::Flat, rest)
    } else {
        (Accidental::None, s)
    }
}

/// One entry of the flattened quality/seventh/extension table. Patterns are
/// tried longest-first (maximal munch) so e.g. `"maj7"` wins over `"maj"`
/// and `"m7b5"` wins over `"m"`.
struct QualityEntry {
    pattern: &'static str,
    quality: Quality,
    seventh: Seventh,
    extension: Option<ExtensionSpec>,
}

fn quality_table() -> Vec<QualityEntry> {
    use ExtensionDegree::*;
    use ExtensionKind::*;
    let mut table = vec![
        QualityEntry { pattern: "m7b5", quality: Quality::Dim, seventh: Seventh::M7b5, extension: None },
        QualityEntry { pattern: "m(maj7)", quality: Quality::Minor, seventh: Seventh::MM7, extension: None },
        QualityEntry { pattern: "mM7", quality: Quality::Minor, seventh: Seventh::MM7, extension: None },
        QualityEntry { pattern: "maj7", quality: Quality::Major, seventh: Seventh::Maj7, extension: None },
        QualityEntry { pattern: "M7", quality: Quality::Major, seventh: Seventh::Maj7, extension: None },
        QualityEntry { pattern: "\u{0394}", quality: Quality::Major, seventh: Seventh::Maj7, extension: None }, // Δ
        QualityEntry { pattern: "dim7", quality: Quality::Dim, seventh: Seventh::Dim7, extension: None },
        QualityEntry { pattern: "\u{00b0}7", quality: Quality::Dim, seventh: Seventh::Dim7, extension: None }, // °7
        QualityEntry { pattern: "\u{00f8}7", quality: Quality::Dim, seventh: Seventh::M7b5, extension: None }, // ø7
        QualityEntry { pattern: "\u{00f8}", quality: Quality::Dim, seventh: Seventh::M7b5, extension: None }, // ø
        QualityEntry { pattern: "min7", quality: Quality::Minor, seventh: Seventh::Min7, extension: None },
        QualityEntry { pattern: "m7", quality: Quality::Minor, seventh: Seventh::Min7, extension: None },
        QualityEntry { pattern: "maj9", quality: Quality::Major, seventh: Seventh::Maj7, extension: Some(ExtensionSpec { degree: Nine, kind: Maj }) },
        QualityEntry { pattern: "maj11", quality: Quality::Major, seventh: Seventh::Maj7, extension: Some(ExtensionSpec { degree: Eleven, kind: Maj }) },
        QualityEntry { pattern: "maj13", quality: Quality::Major, seventh: Seventh::Maj7, extension: Some(ExtensionSpec { degree: Thirteen, kind: Maj }) },
        QualityEntry { pattern: "M9", quality: Quality::Major, seventh: Seventh::Maj7, extension: Some(ExtensionSpec { degree: Nine, kind: Maj }) },
        QualityEntry { pattern: "M11", quality: Quality::Major, seventh: Seventh::Maj7, extension: Some(ExtensionSpec { degree: Eleven, kind: Maj }) },
        QualityEntry { pattern: "M13", quality: Quality::Major, seventh: Seventh::Maj7, extension: Some(ExtensionSpec { degree: Thirteen, kind: Maj }) },
        QualityEntry { pattern: "min9", quality: Quality::Minor, seventh: Seventh::Min7, extension: Some(ExtensionSpec { degree: Nine, kind: Minor }) },
        QualityEntry { pattern: "min11", quality: Quality::Minor, seventh: Seventh::Min7, extension: Some(ExtensionSpec { degree: Eleven, kind: Minor }) },
        QualityEntry { pattern: "min13", quality: Quality::Minor, seventh: Seventh::Min7, extension: Some(ExtensionSpec { degree: Thirteen, kind: Minor }) },
        QualityEntry { pattern: "m9", quality: Quality::Minor, seventh: Seventh::Min7, extension: Some(ExtensionSpec { degree: Nine, kind: Minor }) },
        QualityEntry { pattern: "m11", quality: Quality::Minor, seventh: Seventh::Min7, extension: Some(ExtensionSpec { degree: Eleven, kind: Minor }) },
        QualityEntry { pattern: "m13", quality: Quality::Minor, seventh: Seventh::Min7, extension: Some(ExtensionSpec { degree: Thirteen, kind: Minor }) },
        QualityEntry { pattern: "9", quality: Quality::Major, seventh: Seventh::Dom7, extension: Some(ExtensionSpec { degree: Nine, kind: Plain }) },
        QualityEntry { pattern: "11", quality: Quality::Major, seventh: Seventh::Dom7, extension: Some(ExtensionSpec { degree: Eleven, kind: Plain }) },
        QualityEntry { pattern: "13", quality: Quality::Major, seventh: Seventh::Dom7, extension: Some(ExtensionSpec { degree: Thirteen, kind: Plain }) },
        QualityEntry { pattern: "dim", quality: Quality::Dim, seventh: Seventh::None, extension: None },
        QualityEntry { pattern: "\u{00b0}", quality: Quality::Dim, seventh: Seventh::None, extension: None }, // °
        QualityEntry { pattern: "aug", quality: Quality::Aug, seventh: Seventh::None, extension: None },
        QualityEntry { pattern: "sus2", quality: Quality::Sus2, seventh: Seventh::None, extension: None },
        QualityEntry { pattern: "sus4", quality: Quality::Sus4, seventh: Seventh::None, extension: None },
        QualityEntry { pattern: "sus", quality: Quality::Sus4, seventh: Seventh::None, extension: None },
        QualityEntry { pattern: "maj", quality: Quality::Major, seventh: Seventh::None, extension: None },
        QualityEntry { pattern: "min", quality: Quality::Minor, seventh: Seventh::None, extension: None },
        QualityEntry { pattern: "m", quality: Quality::Minor, seventh: Seventh::None, extension: None },
        QualityEntry { pattern: "M", quality: Quality::Major, seventh: Seventh::None, extension: None },
        QualityEntry { pattern: "+", quality: Quality::Aug, seventh: Seventh::None, extension: None },
        QualityEntry { pattern: "5", quality: Quality::Power, seventh: Seventh::None, extension: None },
        QualityEntry { pattern: "7", quality: Quality::Major, seventh: Seventh::Dom7, extension: None },
        QualityEntry { pattern: "", quality: Quality::Major, seventh: Seventh::None, extension: None },
    ];
    table.sort_by(|a, b| b.pattern.len().cmp(&a.pattern.len()));
    table
}

fn consume_quality<'a>(s: &'a str) -> (Quality, Seventh, Option<ExtensionSpec>, &'a str) {
    for entry in quality_table() {
        if s.starts_with(entry.pattern) {
            return (entry.quality, entry.seventh, entry.extension, &s[entry.pattern.len()..]);
        }
    }
    (Quality::Major, Seventh::None, None, s)
}

fn consume_add_notes(mut s: &str) -> (std::collections::BTreeSet<AddDegree>, &str) {
    let mut adds = std::collections::BTreeSet::new();
    while let Some(rest) = s.strip_prefix("add") {
        let (degree, remainder) = if let Some(r) = rest.strip_prefix("13") {
            (AddDegree::Thirteen, r)
        } else if let Some(r) = rest.strip_prefix("11") {
            (AddDegree::Eleven, r)
        } else if let Some(r) = rest.strip_prefix('9') {
            (AddDegree::Nine, r)
        } else if let Some(r) = rest.strip_prefix('6') {
            (AddDegree::Six, r)
        } else if let Some(r) = rest.strip_prefix('4') {
            (AddDegree::Four, r)
        } else if let Some(r) = rest.strip_prefix('2') {
            (AddDegree::Two, r)
        } else {
            break;
        };
        adds.insert(degree);
        s = remainder;
    }
    (adds, s)
}

fn consume_alterations(mut s: &str) -> Result<(Vec<Alteration>, &str), ()> {
    let mut alterations = Vec::new();
    loop {
        let (sign, rest) = if let Some(r) = s.strip_prefix('b') {
            (Sign::Flat, r)
        } else if let Some(r) = s.strip_prefix('#') {
            (Sign::Sharp, r)
        } else {
            break;
        };
        let digit_len = rest.chars().take_while(|c| c.is_ascii_digit()).count();
        if digit_len == 0 {
            return Err(());
        }
        let degree: u8 = rest[..digit_len].parse().map_err(|_| ())?;
        alterations.push(Alteration { degree, sign });
        s = &rest[digit_len..];
    }
    Ok((alterations, s))
}

/// Parse a slash-bass suffix (`/E`, `/Bb`). Extra characters after the
/// accidental are stripped per `spec.md` §4.1 ("`C/Em` is interpreted as
/// `C/E`").
fn consume_bass(s: &str) -> Result<Option<(NoteName, Accidental)>, ()> {
    let Some(rest) = s.strip_prefix('/') else {
        return Ok(None);
    };
    let (root, rest) = consume_root(rest).ok_or(())?;
    let (accidental, _ignored_suffix) = consume_accidental(rest);
    Ok(Some((root, accidental)))
}

/// Split off a trailing `*positive_decimal` duration suffix, if present.
fn split_duration(s: &str) -> Result<(&str, Option<Rational>), ()> {
    match s.rsplit_once('*') {
        Some((body, dur)) => {
            let rational = Rational::from_decimal_str(dur).ok_or(())?;
            Ok((body, Some(rational)))
        }
        None => Ok((s, None)),
    }
}

/// Parse a single whitespace-delimited chord token.
pub fn parse_chord_token(word: &str) -> Result<ParsedToken, ChordParseError> {
    if word.is_empty() {
        return Err(err(ChordParseErrorKind::EmptyToken, word));
    }

    let (body, beats) = split_duration(word).map_err(|_| err(ChordParseErrorKind::BadDuration, word))?;

    if body == "NC" {
        return Ok(ParsedToken::Concrete(ChordSymbol::Rest { beats }));
    }

    if let Some(mut roman) = super::roman::parse(body) {
        roman.beats = beats;
        return Ok(ParsedToken::Roman(roman));
    }

    let Some((root, rest)) = consume_root(body) else {
        return Err(err(ChordParseErrorKind::UnknownRoot, word));
    };
    let (accidental, rest) = consume_accidental(rest);
    let (quality, seventh, extension, rest) = consume_quality(rest);
    let (add_notes, rest) = consume_add_notes(rest);
    let (alterations, rest) =
        consume_alterations(rest).map_err(|_| err(ChordParseErrorKind::BadAlteration, word))?;
    let bass = consume_bass(rest).map_err(|_| err(ChordParseErrorKind::BadBass, word))?;
    let rest = match rest.find('/') {
        Some(_) => "",
        None => rest,
    };
    if !rest.is_empty() {
        return Err(err(ChordParseErrorKind::UnknownQuality, word));
    }

    if quality == Quality::Power && (seventh != Seventh::None || extension.is_some() || !add_notes.is_empty()) {
        return Err(err(ChordParseErrorKind::UnknownQuality, word));
    }

    let mut chord = ChordData::new(root, accidental);
    chord.quality = quality;
    chord.seventh = seventh;
    chord.extension = extension;
    chord.add_notes = add_notes;
    chord.alterations = alterations;
    chord.bass = bass;
    chord.beats = beats;

    Ok(ParsedToken::Concrete(ChordSymbol::Chord(chord)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn concrete(word: &str) -> ChordData {
        match parse_chord_token(word).unwrap() {
            ParsedToken::Concrete(ChordSymbol::Chord(c)) => c,
            other => panic!("expected a concrete chord, got {other:?}"),
        }
    }

    #[test]
    fn parses_bare_major() {
        let c = concrete("C");
        assert_eq!(c.root, NoteName::C);
        assert_eq!(c.quality, Quality::Major);
        assert_eq!(c.seventh, Seventh::None);
    }

    #[test]
    fn parses_slash_chord_with_sharp_minor() {
        let c = concrete("C#m7b5/E");
        assert_eq!(c.root, NoteName::C);
        assert_eq!(c.accidental, Accidental::Sharp);
        assert_eq!(c.quality, Quality::Dim);
        assert_eq!(c.seventh, Seventh::M7b5);
        assert_eq!(c.bass, Some((NoteName::E, Accidental::None)));
    }

    #[test]
    fn half_diminished_alteration_matches_m7b5() {
        // spec.md S6: Cm7b5 and Cø both yield the half-diminished 7th.
        let a = concrete("Cm7b5");
        let b = concrete("C\u{00f8}");
        assert_eq!(a.quality, b.quality);
        assert_eq!(a.seventh, b.seventh);
        assert_eq!(a.quality, Quality::Dim);
        assert_eq!(a.seventh, Seventh::M7b5);
    }

    #[test]
    fn sus_alone_means_sus4() {
        assert_eq!(concrete("Gsus").quality, Quality::Sus4);
    }

    #[test]
    fn bass_strips_suffix_beyond_accidental() {
        let c = concrete("C/Em");
        assert_eq!(c.bass, Some((NoteName::E, Accidental::None)));
    }

    #[test]
    fn nc_with_duration_is_rest() {
        match parse_chord_token("NC*2").unwrap() {
            ParsedToken::Concrete(ChordSymbol::Rest { beats }) => {
                assert_eq!(beats, Rational::new(2, 1));
            }
            other => panic!("expected rest, got {other:?}"),
        }
    }

    #[test]
    fn duration_suffix_attaches_to_whole_token() {
        let c = concrete("C*1.5");
        assert_eq!(c.beats, Rational::new(3, 2));
    }

    #[test]
    fn power_chord_forbids_extensions() {
        assert!(parse_chord_token("C5add9").is_err());
    }

    #[test]
    fn unparseable_token_is_an_error_not_a_panic() {
        let e = parse_chord_token("Xyzzy").unwrap_err();
        assert_eq!(e.kind, ChordParseErrorKind::UnknownRoot);
    }

    #[test]
    fn roman_token_dispatches_to_roman_form() {
        match parse_chord_token("vii\u{00b0}7").unwrap() {
            ParsedToken::Roman(r) => assert_eq!(r.degree, 7),
            other => panic!("expected roman, got {other:?}"),
        }
    }

    #[test]
    fn round_trip_through_serialize() {
        for token in ["C", "Am", "G7", "Cmaj7", "Dm7b5", "F#m7", "Bb/D", "Csus4", "NC*2"] {
            let parsed = parse_chord_token(token).unwrap();
            if let ParsedToken::Concrete(symbol) = &parsed {
                let serialized = symbol.serialize();
                let reparsed = parse_chord_token(&serialized).unwrap();
                assert_eq!(parsed, reparsed, "round trip failed for {token}");
            }
        }
    }
}
