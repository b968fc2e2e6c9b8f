//! End-to-end scenario tests for the chord-sheet engine (`spec.md` §8).
//!
//! Each test walks the full pipeline — `parse_song` → `build_plan` →
//! `voicing::voice` — against one of the spec's literal scenarios.

use chordsheet::chord::roman::Mode;
use chordsheet::directive::{TempoExpr, TimeSig};
use chordsheet::note::{Accidental, NoteName};
use chordsheet::plan::{apply_tempo, PlanStep};
use chordsheet::voicing::{voice, VoicingKind};
use chordsheet::{build_plan, parse_song, KeyContext, NotationKind};

fn c_major() -> KeyContext {
    KeyContext::new(NoteName::C, Accidental::None, Mode::Major)
}

fn four_four() -> TimeSig {
    TimeSig { num: 4, unit: 4 }
}

fn play_chords(plan: &chordsheet::PlaybackPlan) -> Vec<String> {
    plan.steps
        .iter()
        .filter_map(|step| match step {
            PlanStep::Play { chord, .. } => Some(chord.symbol.serialize()),
            _ => None,
        })
        .collect()
}

/// S1: C Am F G at 120 BPM / 4/4. Every step is 4 beats (2.0s); C's pitches
/// are {C2,C4,E4,G4} with bass velocity 110, and Am voice-leads holding
/// C4/E4 while G4 moves to A4.
#[test]
fn s1_simple_progression_voices_and_holds_common_tones() {
    let program = parse_song("C Am F G", NotationKind::American);
    let plan = build_plan(&program, 0, 120, four_four(), c_major(), NotationKind::American).unwrap();

    assert_eq!(plan.steps.len(), 4);
    for step in &plan.steps {
        match step {
            PlanStep::Play { beats, .. } => {
                assert_eq!(beats.to_f64(), 4.0);
                let seconds = beats.to_f64() * (60.0 / 120.0);
                assert_eq!(seconds, 2.0);
            }
            other => panic!("expected a Play step, got {other:?}"),
        }
    }

    let PlanStep::Play { chord: c_chord, .. } = &plan.steps[0] else { unreachable!() };
    let c_voiced = voice(VoicingKind::Piano, c_chord, None);
    assert_eq!(c_voiced.bass_pitch, Some(36)); // C2
    assert_eq!(c_voiced.bass_velocity, 110);
    assert_eq!(c_voiced.voiced_pitches, vec![60, 64, 67]); // C4 E4 G4

    let PlanStep::Play { chord: am_chord, .. } = &plan.steps[1] else { unreachable!() };
    let am_voiced = voice(VoicingKind::Piano, am_chord, Some(&c_voiced));
    assert!(am_voiced.voiced_pitches.contains(&60)); // C4 held
    assert!(am_voiced.voiced_pitches.contains(&64)); // E4 held
    assert!(am_voiced.voiced_pitches.iter().any(|&p| p % 12 == 9)); // G4 moved to an A
    assert!(!am_voiced.voiced_pitches.contains(&67)); // G4 did not stay
}

/// S2: {bpm:120} {time:3/4} C*3 G*3 — two Play steps of 3 beats = 1.5s each.
#[test]
fn s2_directives_and_explicit_durations() {
    let program = parse_song("{bpm: 120}\n{time: 3/4}\nC*3 G*3", NotationKind::American);
    let plan = build_plan(&program, 0, 120, four_four(), c_major(), NotationKind::American).unwrap();

    let play_steps: Vec<_> = plan
        .steps
        .iter()
        .filter_map(|step| match step {
            PlanStep::Play { beats, .. } => Some(*beats),
            _ => None,
        })
        .collect();
    assert_eq!(play_steps.len(), 2);
    for beats in play_steps {
        assert_eq!(beats.to_f64(), 3.0);
        assert_eq!(beats.to_f64() * (60.0 / 120.0), 1.5);
    }
}

/// S3: bpm 100 → C → +40 → C → reset → C. Scheduler-observed BPM sequence
/// at the three C steps is 100, 140, 100.
#[test]
fn s3_relative_tempo_and_reset() {
    let program = parse_song("{bpm: 100}\nC\n{bpm: +40}\nC\n{bpm: reset}\nC", NotationKind::American);
    let plan = build_plan(&program, 0, 100, four_four(), c_major(), NotationKind::American).unwrap();

    let mut observed = Vec::new();
    let mut current = plan.initial_tempo;
    for step in &plan.steps {
        match step {
            PlanStep::ContextChange { tempo: Some(expr), .. } => {
                current = apply_tempo(current, plan.initial_tempo, *expr);
            }
            PlanStep::Play { .. } => observed.push(current),
            _ => {}
        }
    }
    assert_eq!(observed, vec![100, 140, 100]);
}

/// S4: labeled section looped once more. Under the "count excludes the
/// original pass" reading (`SPEC_FULL.md` §9), `{loop: v 2}` yields C G C G.
#[test]
fn s4_labels_and_loops_unroll_to_four_plays() {
    let program = parse_song("{label: v}\nC G\n{loop: v 2}", NotationKind::American);
    let plan = build_plan(&program, 0, 120, four_four(), c_major(), NotationKind::American).unwrap();
    assert_eq!(play_chords(&plan), vec!["C", "G", "C", "G"]);
}

/// S5: C, a 2-beat rest, G. previous_voiced must still be C's voicing going
/// into G, since a rest never updates it.
#[test]
fn s5_rest_preserves_previous_voicing_across_the_silence() {
    let program = parse_song("C NC*2 G", NotationKind::American);
    let plan = build_plan(&program, 0, 120, four_four(), c_major(), NotationKind::American).unwrap();

    let play_steps: Vec<_> = plan
        .steps
        .iter()
        .filter_map(|step| match step {
            PlanStep::Play { chord, beats, .. } => Some((chord.clone(), *beats)),
            _ => None,
        })
        .collect();
    assert_eq!(play_steps.len(), 3);
    assert!(play_steps[1].0.is_rest());
    assert_eq!(play_steps[1].1.to_f64(), 2.0);

    let c_voiced = voice(VoicingKind::Piano, &play_steps[0].0, None);
    // The rest produces a silent voicing and is never threaded forward as
    // `previous_voiced` — G is voice-led directly against C.
    let rest_voiced = voice(VoicingKind::Piano, &play_steps[1].0, Some(&c_voiced));
    assert!(rest_voiced.is_silent());
    let g_voiced = voice(VoicingKind::Piano, &play_steps[2].0, Some(&c_voiced));
    assert!(!g_voiced.is_silent());
}

/// S6: Cm7b5 and Cø both yield {C, Eb, Gb, Bb}.
#[test]
fn s6_half_diminished_alteration_and_its_symbol_alias() {
    use chordsheet::chord::{parse_chord_token, ParsedToken};
    use std::collections::BTreeSet;

    let expected: BTreeSet<i32> = [0, 3, 6, 10].into_iter().collect(); // C Eb Gb Bb

    let flat_five = match parse_chord_token("Cm7b5").unwrap() {
        ParsedToken::Concrete(symbol) => symbol,
        ParsedToken::Roman(_) => panic!("expected a concrete chord"),
    };
    assert_eq!(flat_five.pitch_classes(), expected);

    let symbol_alias = match parse_chord_token("Cø").unwrap() {
        ParsedToken::Concrete(symbol) => symbol,
        ParsedToken::Roman(_) => panic!("expected a concrete chord"),
    };
    assert_eq!(symbol_alias.pitch_classes(), expected);
}

/// Invariant 5 (`spec.md` §8): building a plan is a pure function of its
/// inputs — the same document, start line, and context always produce an
/// identical plan.
#[test]
fn plan_building_is_deterministic() {
    let program = parse_song("{label: v}\nC G Am\n{loop: v 3}", NotationKind::American);
    let first = build_plan(&program, 0, 120, four_four(), c_major(), NotationKind::American).unwrap();
    let second = build_plan(&program, 0, 120, four_four(), c_major(), NotationKind::American).unwrap();
    assert_eq!(first, second);
}

/// Invariant 4 (`spec.md` §8): a LyricLine above a ChordLine doesn't change
/// the ChordLine's classification or token resolution.
#[test]
fn lyric_line_above_a_chord_line_does_not_change_its_classification() {
    use chordsheet::Line;

    let with_lyric = parse_song("Once upon a midnight dreary\nC G", NotationKind::American);
    let without_lyric = parse_song("C G", NotationKind::American);

    let (Line::ChordLine(with), Line::ChordLine(without)) = (&with_lyric.lines[1], &without_lyric.lines[0]) else {
        panic!("expected chord lines");
    };
    assert_eq!(with.len(), without.len());
    for (a, b) in with.iter().zip(without.iter()) {
        assert_eq!(a.text, b.text);
        assert_eq!(a.is_valid(), b.is_valid());
    }
}
