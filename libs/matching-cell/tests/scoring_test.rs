// libs/matching-cell/tests/scoring_test.rs
use assert_matches::assert_matches;

use matching_cell::models::{IntakeAnswers, IssueDuration, MatchingError, SymptomFlag, UrgencyTier};
use matching_cell::services::scoring::UrgencyScoringService;

fn answers(
    pain_level: u8,
    issue_duration: IssueDuration,
    symptom_flags: Vec<SymptomFlag>,
) -> IntakeAnswers {
    IntakeAnswers {
        pain_level,
        issue_duration,
        symptom_flags,
        max_travel_distance_km: None,
    }
}

#[test]
fn identical_answers_score_identically() {
    let scorer = UrgencyScoringService::new();
    let intake = answers(6, IssueDuration::Days, vec![SymptomFlag::Bleeding]);

    let first = scorer.score(&intake).unwrap();
    let second = scorer.score(&intake).unwrap();

    assert_eq!(first, second);
}

#[test]
fn tier_boundaries_are_inclusive_on_the_lower_bound() {
    let scorer = UrgencyScoringService::new();

    // 1 (pain 0) + 4 (week) + 2 (cosmetic) = 7 -> routine
    let score_7 = answers(0, IssueDuration::Week, vec![SymptomFlag::CosmeticOnly]);
    // 1 (pain 0) + 2 (longer) + 5 (sensitivity) = 8 -> moderate
    let score_8 = answers(0, IssueDuration::Longer, vec![SymptomFlag::Sensitivity]);
    // 4 (pain 3) + 2 (longer) + 7 (bleeding) = 13 -> moderate
    let score_13 = answers(3, IssueDuration::Longer, vec![SymptomFlag::Bleeding]);
    // 7 (pain 5) + 2 (longer) + 5 (sensitivity) = 14 -> high
    let score_14 = answers(5, IssueDuration::Longer, vec![SymptomFlag::Sensitivity]);
    // 10 (pain 9) + 2 (longer) + 7 (bleeding) = 19 -> high
    let score_19 = answers(9, IssueDuration::Longer, vec![SymptomFlag::Bleeding]);
    // 10 (pain 10) + 8 (today) + 2 (cosmetic) = 20 -> emergency
    let score_20 = answers(10, IssueDuration::Today, vec![SymptomFlag::CosmeticOnly]);

    let cases = [
        (score_7, 7, UrgencyTier::Routine),
        (score_8, 8, UrgencyTier::Moderate),
        (score_13, 13, UrgencyTier::Moderate),
        (score_14, 14, UrgencyTier::High),
        (score_19, 19, UrgencyTier::High),
        (score_20, 20, UrgencyTier::Emergency),
    ];

    for (intake, expected_score, expected_tier) in cases {
        let assessment = scorer.score(&intake).unwrap();
        assert_eq!(assessment.score, expected_score);
        assert_eq!(assessment.tier, expected_tier);
    }
}

#[test]
fn only_the_most_severe_symptom_counts() {
    let scorer = UrgencyScoringService::new();

    let all_flags = answers(
        0,
        IssueDuration::Longer,
        vec![
            SymptomFlag::Swelling,
            SymptomFlag::Bleeding,
            SymptomFlag::Sensitivity,
            SymptomFlag::CosmeticOnly,
        ],
    );
    let swelling_only = answers(0, IssueDuration::Longer, vec![SymptomFlag::Swelling]);

    // Checking every box must not score higher than the worst flag alone.
    assert_eq!(
        scorer.score(&all_flags).unwrap(),
        scorer.score(&swelling_only).unwrap()
    );
}

#[test]
fn empty_symptom_flags_contribute_nothing() {
    let scorer = UrgencyScoringService::new();

    let without = scorer.score(&answers(6, IssueDuration::Days, vec![])).unwrap();
    let with = scorer
        .score(&answers(6, IssueDuration::Days, vec![SymptomFlag::Sensitivity]))
        .unwrap();

    assert_eq!(with.score - without.score, 5);
}

#[test]
fn out_of_range_pain_level_is_rejected() {
    let scorer = UrgencyScoringService::new();
    let intake = answers(11, IssueDuration::Today, vec![]);

    let result = scorer.score(&intake);
    assert_matches!(result, Err(MatchingError::InvalidInput(_)));
}

#[test]
fn non_positive_travel_distance_is_rejected() {
    let scorer = UrgencyScoringService::new();
    let mut intake = answers(4, IssueDuration::Days, vec![]);
    intake.max_travel_distance_km = Some(-5.0);

    let result = scorer.score(&intake);
    assert_matches!(result, Err(MatchingError::InvalidInput(_)));

    intake.max_travel_distance_km = Some(0.0);
    assert_matches!(scorer.score(&intake), Err(MatchingError::InvalidInput(_)));
}

#[test]
fn severe_intake_reaches_emergency_tier() {
    let scorer = UrgencyScoringService::new();

    // pain 9 -> 10, today -> 8, swelling -> 9
    let intake = answers(9, IssueDuration::Today, vec![SymptomFlag::Swelling]);
    let assessment = scorer.score(&intake).unwrap();

    assert_eq!(assessment.score, 27);
    assert_eq!(assessment.tier, UrgencyTier::Emergency);
}
