// libs/matching-cell/src/services/scoring.rs
use tracing::debug;

use crate::models::{IntakeAnswers, IssueDuration, MatchingError, SymptomFlag, UrgencyAssessment, UrgencyTier};

// Tier cutoffs, inclusive on the lower bound.
const EMERGENCY_CUTOFF: u32 = 20;
const HIGH_CUTOFF: u32 = 14;
const MODERATE_CUTOFF: u32 = 8;

/// Maps triage answers to an urgency score and tier. Pure and
/// deterministic; identical answers always produce the identical
/// assessment.
pub struct UrgencyScoringService;

impl UrgencyScoringService {
    pub fn new() -> Self {
        Self
    }

    pub fn score(&self, answers: &IntakeAnswers) -> Result<UrgencyAssessment, MatchingError> {
        self.validate(answers)?;

        let pain = Self::pain_contribution(answers.pain_level);
        let duration = Self::duration_contribution(answers.issue_duration);
        let symptoms = Self::symptom_contribution(&answers.symptom_flags);

        let score = pain + duration + symptoms;
        let tier = Self::tier_for(score);

        debug!(
            "Scored intake: pain={} duration={} symptoms={} -> score={} tier={}",
            pain, duration, symptoms, score, tier
        );

        Ok(UrgencyAssessment { score, tier })
    }

    pub fn validate(&self, answers: &IntakeAnswers) -> Result<(), MatchingError> {
        if answers.pain_level > 10 {
            return Err(MatchingError::InvalidInput(format!(
                "pain_level must be between 0 and 10, got {}",
                answers.pain_level
            )));
        }

        if let Some(distance) = answers.max_travel_distance_km {
            if !distance.is_finite() || distance <= 0.0 {
                return Err(MatchingError::InvalidInput(format!(
                    "max_travel_distance_km must be positive, got {}",
                    distance
                )));
            }
        }

        Ok(())
    }

    fn pain_contribution(pain_level: u8) -> u32 {
        match pain_level {
            8..=10 => 10,
            5..=7 => 7,
            2..=4 => 4,
            _ => 1,
        }
    }

    fn duration_contribution(duration: IssueDuration) -> u32 {
        match duration {
            IssueDuration::Today => 8,
            IssueDuration::Days => 6,
            IssueDuration::Week => 4,
            IssueDuration::Longer => 2,
        }
    }

    /// Only the most severe flag counts. Summing would let a patient
    /// reach the emergency tier by checking every box.
    fn symptom_contribution(flags: &[SymptomFlag]) -> u32 {
        flags
            .iter()
            .map(|flag| match flag {
                SymptomFlag::Swelling => 9,
                SymptomFlag::Bleeding => 7,
                SymptomFlag::Sensitivity => 5,
                SymptomFlag::CosmeticOnly => 2,
            })
            .max()
            .unwrap_or(0)
    }

    fn tier_for(score: u32) -> UrgencyTier {
        if score >= EMERGENCY_CUTOFF {
            UrgencyTier::Emergency
        } else if score >= HIGH_CUTOFF {
            UrgencyTier::High
        } else if score >= MODERATE_CUTOFF {
            UrgencyTier::Moderate
        } else {
            UrgencyTier::Routine
        }
    }
}

impl Default for UrgencyScoringService {
    fn default() -> Self {
        Self::new()
    }
}
