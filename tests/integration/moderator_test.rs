//! Moderator Integration Tests
//!
//! Priority order of the intervention checks on realistic persona answers.

use focus_panel::models::InterventionKind;
use focus_panel::services::moderator::{detect, detect_intervention, follow_up_question};

fn red_flags() -> Vec<String> {
    vec![
        "unlimited data means no cap at all".to_string(),
        "free trial means never paying".to_string(),
    ]
}

#[test]
fn test_literal_reading_beats_hedging_and_emotion() {
    let text = "I guess I'd hate finding out the unlimited data has a cap after all.";
    let verdict = detect(text, &red_flags()).unwrap();

    assert_eq!(verdict.kind, InterventionKind::LiteralInterpretation);
    assert_eq!(verdict.trigger, red_flags()[0]);
    assert_eq!(
        verdict.follow_up_question(),
        follow_up_question(InterventionKind::LiteralInterpretation)
    );
}

#[test]
fn test_hedging_beats_emotion() {
    let text = "Not sure, though I love the colours.";
    assert_eq!(
        detect_intervention(text, &red_flags()),
        Some(InterventionKind::NeedsProbing)
    );
}

#[test]
fn test_plain_answer_needs_no_follow_up() {
    let text = "Clear offer, reasonable price, I would consider it.";
    assert_eq!(detect_intervention(text, &red_flags()), None);
    assert_eq!(detect_intervention(text, &[]), None);
}
