//! # SongParser
//!
//! Turns chord-sheet text into a [`SongProgram`]: an ordered list of
//! classified [`Line`]s plus a label table (`spec.md` §4.3). The pass is a
//! single top-to-bottom walk; classification of a line only ever looks at
//! that line's own tokens.

use crate::chord::{parse_chord_token, ChordParseError, ChordSymbol, ParsedToken};
use crate::directive::{self, Directive};
use crate::notation::NotationKind;
use std::collections::HashMap;
use std::ops::Range;

/// A token or directive's location in the source text, for highlight and
/// click-to-play mapping (`spec.md` §3 "each token records its source
/// span").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub line: usize,
    pub start: usize,
    pub end: usize,
}

/// One whitespace-delimited word on a [`ChordLine`][Line::ChordLine], with
/// its parse outcome. A parse failure doesn't invalidate the line — it
/// becomes an invalid-chord marker (`spec.md` §4.1 "rejection is silent at
/// the token level").
#[derive(Debug, Clone)]
pub struct ChordToken {
    pub text: String,
    pub span: Span,
    pub parsed: Result<ParsedToken, ChordParseError>,
}

impl ChordToken {
    pub fn is_valid(&self) -> bool {
        self.parsed.is_ok()
    }

    pub fn symbol(&self) -> Option<&ChordSymbol> {
        match &self.parsed {
            Ok(ParsedToken::Concrete(symbol)) => Some(symbol),
            _ => None,
        }
    }
}

/// One directive form on a [`DirectiveLine`][Line::DirectiveLine].
#[derive(Debug, Clone)]
pub struct DirectiveToken {
    pub directive: Directive,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum Line {
    ChordLine(Vec<ChordToken>),
    LyricLine(String),
    CommentLine(String),
    DirectiveLine(Vec<DirectiveToken>),
}

/// An ordered program of lines plus a label table (`spec.md` §3).
/// `@start` always maps to line 0; label redefinition is not an error —
/// the last `{label: ...}` directive for a given name wins.
#[derive(Debug, Clone)]
pub struct SongProgram {
    pub lines: Vec<Line>,
    pub labels: HashMap<String, usize>,
}

impl SongProgram {
    /// Resolve a loop target to a line index. `@start` always resolves to
    /// line 0 regardless of the label table.
    pub fn resolve_label(&self, target: &crate::directive::LoopTarget) -> Option<usize> {
        match target {
            crate::directive::LoopTarget::Start => Some(0),
            crate::directive::LoopTarget::Label(name) => self.labels.get(name).copied(),
        }
    }
}

/// Split `s` on ASCII/Unicode whitespace, returning each token with its
/// byte-offset span within `s`.
fn whitespace_tokens_with_spans(s: &str) -> Vec<(&str, Range<usize>)> {
    let mut tokens = Vec::new();
    let mut start: Option<usize> = None;
    for (idx, ch) in s.char_indices() {
        if ch.is_whitespace() {
            if let Some(begin) = start.take() {
                tokens.push((&s[begin..idx], begin..idx));
            }
        } else if start.is_none() {
            start = Some(idx);
        }
    }
    if let Some(begin) = start {
        tokens.push((&s[begin..], begin..s.len()));
    }
    tokens
}

/// Strip a trailing `//` comment that starts outside any `{...}` directive
/// form (`spec.md` §4.3 point 2). Returns `(code, comment)`.
fn strip_trailing_comment(line: &str) -> (&str, Option<&str>) {
    let bytes = line.as_bytes();
    let mut depth = 0i32;
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => depth -= 1,
            b'/' if depth == 0 && i + 1 < bytes.len() && bytes[i + 1] == b'/' => {
                return (&line[..i], Some(&line[i + 2..]));
            }
            _ => {}
        }
        i += 1;
    }
    (line, None)
}

/// A short token (length < 2) that fails to parse is dropped from the
/// ratio entirely rather than counted as a miss — otherwise a lone filler
/// word like "a" or "to" next to real chords would drag a chord line below
/// threshold. Bare single-letter chords (`C`, `G`, ...) still parse and so
/// still count normally. In Roman mode nothing is dropped, since `I`/`V`
/// are legitimate full-weight tokens there (`spec.md` §4.3 point 4).
fn classify_chord_tokens(tokens: &[ChordToken], notation: NotationKind) -> bool {
    let mut total = 0usize;
    let mut valid = 0usize;
    for token in tokens {
        let short = token.text.chars().count() < 2;
        if short && notation != NotationKind::Roman && !token.is_valid() {
            continue;
        }
        total += 1;
        if token.is_valid() {
            valid += 1;
        }
    }
    total > 0 && (valid as f64 / total as f64) >= 0.6
}

fn parse_line(line_index: usize, code: &str, notation: NotationKind) -> Line {
    if directive::is_directive_line(code) {
        let mut tokens = Vec::new();
        let mut cursor = 0usize;
        for form in directive::split_directive_forms(code) {
            // Recover the form's span: the braces enclosing `form` start at
            // or after `cursor` in `code`.
            let open = code[cursor..].find('{').map(|p| cursor + p).unwrap_or(cursor);
            let close = open + form.len() + 2; // "{" + form + "}"
            tokens.push(DirectiveToken {
                directive: directive::parse_directive_form(form),
                span: Span { line: line_index, start: open, end: close.min(code.len()) },
            });
            cursor = close;
        }
        return Line::DirectiveLine(tokens);
    }

    let raw_tokens = whitespace_tokens_with_spans(code);
    let chord_tokens: Vec<ChordToken> = raw_tokens
        .into_iter()
        .map(|(text, range)| ChordToken {
            text: text.to_string(),
            span: Span { line: line_index, start: range.start, end: range.end },
            parsed: parse_chord_token(text),
        })
        .collect();

    if classify_chord_tokens(&chord_tokens, notation) {
        Line::ChordLine(chord_tokens)
    } else {
        Line::LyricLine(code.to_string())
    }
}

/// Parse a complete chord-sheet document. `notation` is the document's
/// currently active notation mode, which affects the short-token exemption
/// used during chord-line classification (`spec.md` §4.3 point 4).
pub fn parse_song(text: &str, notation: NotationKind) -> SongProgram {
    let mut lines = Vec::new();
    let mut labels = HashMap::new();

    for (line_index, raw_line) in text.split('\n').enumerate() {
        let trimmed_start = raw_line.trim_start();
        if trimmed_start.starts_with("//") {
            lines.push(Line::CommentLine(raw_line.to_string()));
            continue;
        }

        let (code, _comment) = strip_trailing_comment(raw_line);
        let line = parse_line(line_index, code, notation);
        if let Line::DirectiveLine(tokens) = &line {
            for token in tokens {
                if let Directive::Label(name) = &token.directive {
                    labels.insert(name.clone(), line_index);
                }
            }
        }
        lines.push(line);
    }

    SongProgram { lines, labels }
}
