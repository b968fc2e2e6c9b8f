//! # Directive Parser
//!
//! Parses `{ name : value }` forms (`spec.md` §4.4) into a [`Directive`].
//! Unknown directive names are syntactically accepted but carried as
//! [`Directive::Unknown`] so the song parser can render them as present but
//! inert; forms whose value doesn't match their name's grammar become
//! [`Directive::Invalid`] and contribute no semantics, matching `spec.md`
//! §4.3 point 3 ("malformed forms are retained ... but contribute no
//! semantics").

use crate::note::{Accidental, NoteName};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TempoExpr {
    Absolute(i32),
    Delta(i32),
    Percent(i32),
    Multiplier(f64),
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMode {
    Major,
    Minor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSig {
    pub num: u8,
    pub unit: u8,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopTarget {
    Start,
    Label(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    Tempo(TempoExpr),
    TimeSig(TimeSig),
    Key {
        root: NoteName,
        accidental: Accidental,
        mode: KeyMode,
    },
    Label(String),
    Loop {
        target: LoopTarget,
        count: u8,
    },
    Capo(i32),
    Volume(u8),
    /// Syntactically well-formed but an unrecognized directive name.
    Unknown { name: String, value: String },
    /// A `{...}` form whose value didn't match its name's grammar.
    Invalid { raw: String },
}

/// Split a line into its balanced `{...}` forms, in order, ignoring
/// anything outside braces. Forms are not nested in this grammar; a second
/// `{` before the matching `}` starts a new form (the unmatched opener is
/// dropped, since it cannot be a well-formed directive).
pub fn split_directive_forms(line: &str) -> Vec<&str> {
    let mut forms = Vec::new();
    let mut rest = line;
    while let Some(open) = rest.find('{') {
        let after_open = &rest[open + 1..];
        match after_open.find('}') {
            Some(close) => {
                forms.push(&after_open[..close]);
                rest = &after_open[close + 1..];
            }
            None => break,
        }
    }
    forms
}

/// True if `line`'s non-whitespace content consists entirely of one or more
/// `{...}` forms (`spec.md` §4.3 point 3).
pub fn is_directive_line(line: &str) -> bool {
    let mut rest = line;
    let mut saw_form = false;
    loop {
        let trimmed = rest.trim_start();
        if trimmed.is_empty() {
            return saw_form;
        }
        let Some(stripped) = trimmed.strip_prefix('{') else {
            return false;
        };
        let Some(close) = stripped.find('}') else {
            return false;
        };
        saw_form = true;
        rest = &stripped[close + 1..];
    }
}

fn parse_key_root(s: &str) -> Option<(NoteName, Accidental, &str)> {
    const EUROPEAN: [(&str, NoteName); 7] = [
        ("Sol", NoteName::G),
        ("Do", NoteName::C),
        ("Re", NoteName::D),
        ("Mi", NoteName::E),
        ("Fa", NoteName::F),
        ("La", NoteName::A),
        ("Si", NoteName::B),
    ];
    let (root, rest) = EUROPEAN
        .iter()
        .find_map(|(name, note)| s.strip_prefix(name).map(|r| (*note, r)))
        .or_else(|| {
            let mut chars = s.chars();
            let first = chars.next()?;
            if !first.is_ascii_uppercase() {
                return None;
            }
            NoteName::from_american(first).map(|n| (n, chars.as_str()))
        })?;
    let (accidental, rest) = if let Some(r) = rest.strip_prefix('#') {
        (Accidental::Sharp, r)
    } else if let Some(r) = rest.strip_prefix('b') {
        (Accidental::Flat, r)
    } else {
        (Accidental::None, rest)
    };
    Some((root, accidental, rest))
}

fn parse_tempo_value(value: &str) -> Option<TempoExpr> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("reset") || value.eq_ignore_ascii_case("original") {
        return Some(TempoExpr::Reset);
    }
    if let Some(pct) = value.strip_suffix('%') {
        return pct.trim().parse().ok().map(TempoExpr::Percent);
    }
    if let Some(mult) = value.strip_suffix(['x', 'X', '\u{00d7}']) {
        return mult.trim().parse().ok().map(TempoExpr::Multiplier);
    }
    match value.chars().next() {
        Some('+') => value[1..].parse().ok().map(TempoExpr::Delta),
        Some('-') => value.parse().ok().map(TempoExpr::Delta),
        Some(c) if c.is_ascii_digit() => value.parse().ok().map(TempoExpr::Absolute),
        _ => None,
    }
}

fn parse_time_value(value: &str) -> Option<TimeSig> {
    let (num_str, unit_str) = value.trim().split_once('/')?;
    let num: u8 = num_str.trim().parse().ok()?;
    let unit: u8 = unit_str.trim().parse().ok()?;
    if (1..=16).contains(&num) && matches!(unit, 1 | 2 | 4 | 8 | 16) {
        Some(TimeSig { num, unit })
    } else {
        None
    }
}

fn parse_key_value(value: &str) -> Option<(NoteName, Accidental, KeyMode)> {
    let value = value.trim();
    let (root, accidental, rest) = parse_key_root(value)?;
    let mode = if rest.eq_ignore_ascii_case("m") || rest.eq_ignore_ascii_case("min") {
        KeyMode::Minor
    } else if rest.is_empty() {
        KeyMode::Major
    } else {
        return None;
    };
    Some((root, accidental, mode))
}

fn is_label_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn parse_loop_value(value: &str) -> Option<(LoopTarget, u8)> {
    let mut parts = value.trim().split_whitespace();
    let name = parts.next()?;
    let target = if name == "@start" {
        LoopTarget::Start
    } else if is_label_identifier(name) {
        LoopTarget::Label(name.to_string())
    } else {
        return None;
    };
    let count = match parts.next() {
        Some(n) => n.parse::<i32>().ok()?,
        None => 2,
    };
    if parts.next().is_some() {
        return None;
    }
    Some((target, count.clamp(1, 100) as u8))
}

/// Parse the content of one `{...}` form (braces already stripped).
pub fn parse_directive_form(form: &str) -> Directive {
    let raw = form.to_string();
    let Some((name, value)) = form.split_once(':') else {
        log::warn!("skipping malformed directive {{{raw}}}: missing ':'");
        return Directive::Invalid { raw };
    };
    let name = name.trim();
    let value = value.trim();
    let normalized = name.to_ascii_lowercase();
    let normalized = if normalized == "tempo" { "bpm".to_string() } else { normalized };

    match normalized.as_str() {
        "bpm" => parse_tempo_value(value).map(Directive::Tempo),
        "time" => parse_time_value(value).map(Directive::TimeSig),
        "key" => parse_key_value(value).map(|(root, accidental, mode)| Directive::Key { root, accidental, mode }),
        "label" => {
            if is_label_identifier(value) {
                Some(Directive::Label(value.to_string()))
            } else {
                None
            }
        }
        "loop" => parse_loop_value(value).map(|(target, count)| Directive::Loop { target, count }),
        "capo" => value.parse::<i32>().ok().map(Directive::Capo),
        "volume" => value.parse::<u8>().ok().filter(|v| *v <= 127).map(Directive::Volume),
        _ => {
            return Directive::Unknown {
                name: name.to_string(),
                value: value.to_string(),
            }
        }
    }
    .unwrap_or_else(|| {
        log::warn!("skipping malformed directive {{{raw}}}: value doesn't match '{name}'s grammar");
        Directive::Invalid { raw }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_multiple_forms_on_one_line() {
        let forms = split_directive_forms("{tempo: 120} {time: 4/4}");
        assert_eq!(forms, vec!["tempo: 120", "time: 4/4"]);
    }

    #[test]
    fn directive_line_detection_requires_only_forms() {
        assert!(is_directive_line("{tempo: 120}"));
        assert!(is_directive_line("{tempo: 120} {time: 4/4}"));
        assert!(!is_directive_line("C G {tempo: 120}"));
        assert!(!is_directive_line(""));
    }

    #[test]
    fn tempo_alias_and_variants() {
        assert_eq!(parse_directive_form("tempo: 120"), Directive::Tempo(TempoExpr::Absolute(120)));
        assert_eq!(parse_directive_form("bpm: +10"), Directive::Tempo(TempoExpr::Delta(10)));
        assert_eq!(parse_directive_form("bpm: -10"), Directive::Tempo(TempoExpr::Delta(-10)));
        assert_eq!(parse_directive_form("bpm: 150%"), Directive::Tempo(TempoExpr::Percent(150)));
        assert_eq!(parse_directive_form("bpm: 2x"), Directive::Tempo(TempoExpr::Multiplier(2.0)));
        assert_eq!(parse_directive_form("bpm: reset"), Directive::Tempo(TempoExpr::Reset));
    }

    #[test]
    fn time_sig_rejects_out_of_range() {
        assert_eq!(parse_directive_form("time: 4/4"), Directive::TimeSig(TimeSig { num: 4, unit: 4 }));
        assert_eq!(parse_directive_form("time: 17/4"), Directive::Invalid { raw: "time: 17/4".to_string() });
        assert_eq!(parse_directive_form("time: 4/3"), Directive::Invalid { raw: "time: 4/3".to_string() });
    }

    #[test]
    fn key_directive_with_minor_flag() {
        assert_eq!(
            parse_directive_form("key: Ebm"),
            Directive::Key { root: NoteName::E, accidental: Accidental::Flat, mode: KeyMode::Minor }
        );
    }

    #[test]
    fn loop_defaults_count_to_two() {
        assert_eq!(
            parse_directive_form("loop: @start"),
            Directive::Loop { target: LoopTarget::Start, count: 2 }
        );
        assert_eq!(
            parse_directive_form("loop: verse 5"),
            Directive::Loop { target: LoopTarget::Label("verse".to_string()), count: 5 }
        );
    }

    #[test]
    fn loop_count_clamped_to_100() {
        assert_eq!(
            parse_directive_form("loop: verse 500"),
            Directive::Loop { target: LoopTarget::Label("verse".to_string()), count: 100 }
        );
    }

    #[test]
    fn unknown_directive_is_retained_not_invalid() {
        assert_eq!(
            parse_directive_form("reverb: on"),
            Directive::Unknown { name: "reverb".to_string(), value: "on".to_string() }
        );
    }

    #[test]
    fn malformed_form_without_colon_is_invalid() {
        assert_eq!(parse_directive_form("not a directive"), Directive::Invalid { raw: "not a directive".to_string() });
    }
}
