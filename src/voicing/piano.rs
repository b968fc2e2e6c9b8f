//! Piano voicing (`spec.md` §4.5): octave assignment plus voice-leading
//! against the previous chord's sounding pitches.

use super::VoicedChord;
use crate::plan::ResolvedChord;
use std::collections::BTreeSet;

/// Octaves considered when voice-leading a target pitch class; a ~two
/// octave window centered on the instrument's middle register.
const CANDIDATE_OCTAVES: [i32; 4] = [3, 4, 5, 6];

fn midi_for(pitch_class: i32, octave: i32) -> u8 {
    (12 * (octave + 1) + pitch_class).clamp(0, 127) as u8
}

/// Root in octave 4, remaining tones stacked ascending into octave 4 or 5
/// (`spec.md` §4.5 piano step 2).
fn initial_voicing(root_pc: i32, pcs: &BTreeSet<i32>) -> Vec<(i32, i32)> {
    let mut notes = vec![(root_pc, 4)];
    for &pc in pcs.iter().filter(|&&p| p != root_pc) {
        let octave = if pc > root_pc { 4 } else { 5 };
        notes.push((pc, octave));
    }
    notes.sort_by_key(|&(pc, octave)| octave * 12 + pc);
    notes
}

/// The octave for `pc` that minimizes distance to the closest previous
/// pitch of the same or a neighbouring pitch class, lower octave breaking
/// ties (`spec.md` §4.5 piano step 3). Falls back to `fallback` when no
/// previous pitch shares or neighbours `pc`.
fn best_octave_against_previous(pc: i32, previous_pitches: &[u8], fallback: i32) -> i32 {
    let mut best: Option<(i32, i32)> = None; // (distance, octave)
    for &octave in &CANDIDATE_OCTAVES {
        let midi = midi_for(pc, octave) as i32;
        for &prev in previous_pitches {
            let prev_pc = prev as i32 % 12;
            let neighbouring = prev_pc == pc || (prev_pc - pc).rem_euclid(12) == 1 || (pc - prev_pc).rem_euclid(12) == 1;
            if !neighbouring {
                continue;
            }
            let dist = (midi - prev as i32).abs();
            let better = match best {
                None => true,
                Some((best_dist, best_octave)) => dist < best_dist || (dist == best_dist && octave < best_octave),
            };
            if better {
                best = Some((dist, octave));
            }
        }
    }
    best.map(|(_, octave)| octave).unwrap_or(fallback)
}

pub fn voice(chord: &ResolvedChord, previous: Option<&VoicedChord>) -> VoicedChord {
    let Some(root_pc) = chord.root_pitch_class() else {
        return VoicedChord::default();
    };
    let pcs = chord.notes();
    let initial = initial_voicing(root_pc, &pcs);
    let previous_pitches: Vec<u8> = previous.map(|v| v.voiced_pitches.clone()).unwrap_or_default();

    let mut pitches: Vec<u8> = initial
        .iter()
        .map(|&(pc, fallback_octave)| {
            let octave = if previous_pitches.is_empty() {
                fallback_octave
            } else {
                best_octave_against_previous(pc, &previous_pitches, fallback_octave)
            };
            midi_for(pc, octave)
        })
        .collect();
    pitches.sort_unstable();
    pitches.dedup();

    let bass_pc = chord.bass_pitch_class().unwrap_or(root_pc);
    let velocities = vec![90u8; pitches.len()];

    VoicedChord {
        bass_pitch: Some(midi_for(bass_pc, 2)),
        bass_velocity: 110,
        voiced_pitches: pitches,
        velocities,
    }
}
