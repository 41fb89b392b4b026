//! Rule-based suspicion scoring
//!
//! The score is the sum of the weights of every rule that fires, clamped to
//! 0-100. Rules are plain data (see [`ScoringConfig`]); this module only
//! walks the table in declaration order. All rules are evaluated, none
//! short-circuits another, and a rule whose descriptor is undefined simply
//! does not fire.
//!
//! ```text
//! Flag                    | Condition            | Weight
//! ------------------------|----------------------|-------
//! flat_variation_low      | flat_std < 0.02      | +20
//! hf_ratio_variation_low  | hf_ratio_std < 0.15  | +15
//! pitch_variation_low     | f0_cv < 0.05         | +20
//! pitch_jumps             | f0_std > 80          | +10
//! loudness_constant       | rms_std < 0.01       | +15
//! zcr_low                 | zcr_mean < 0.03      | +5
//! ```
//!
//! The default table tops out at 85. There is no "sounds human" rule: an
//! empty reason list means no pattern was found, not that the clip is
//! genuine.

use super::Descriptors;
use crate::config::{Rule, ScoringConfig};
use serde::{Deserialize, Serialize};

/// Outcome of scoring one descriptor set
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SuspicionScore {
    /// 0-100
    pub score: f64,
    /// One explanation per triggered rule, in rule order
    pub reasons: Vec<String>,
    /// Identifier of each triggered rule, parallel to `reasons`
    pub flags: Vec<String>,
}

impl SuspicionScore {
    pub fn is_empty(&self) -> bool {
        self.reasons.is_empty()
    }
}

/// Whether `rule` fires on `descriptors` (never for undefined values)
pub fn fires(rule: &Rule, descriptors: &Descriptors) -> bool {
    descriptors
        .get(rule.key)
        .map_or(false, |value| rule.comparison.holds(value, rule.threshold))
}

/// Score a descriptor set against an ordered rule table
pub fn score(descriptors: &Descriptors, config: &ScoringConfig) -> SuspicionScore {
    let mut total = 0.0;
    let mut reasons = Vec::new();
    let mut flags = Vec::new();

    for rule in config.rules.iter().filter(|rule| fires(rule, descriptors)) {
        total += rule.weight;
        reasons.push(rule.reason.clone());
        flags.push(rule.flag.clone());
    }

    log::debug!("score {:.1} from {} rule(s): {:?}", total, flags.len(), flags);

    SuspicionScore {
        score: total.clamp(0.0, 100.0),
        reasons,
        flags,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::DescriptorKey;
    use crate::config::Comparison;

    /// Descriptor set that trips none of the default rules
    fn quiet_set() -> Descriptors {
        Descriptors {
            flat_mean: 0.3,
            flat_std: 0.1,
            centroid_mean: 1500.0,
            rolloff_mean: 3500.0,
            hf_ratio_mean: 0.4,
            hf_ratio_std: 0.3,
            f0_mean: Some(180.0),
            f0_std: Some(30.0),
            f0_cv: Some(30.0 / 180.0),
            zcr_mean: 0.08,
            rms_mean: 0.1,
            rms_std: 0.05,
        }
    }

    /// Descriptor set that trips every default rule
    fn loud_set() -> Descriptors {
        Descriptors {
            flat_std: 0.001,
            hf_ratio_std: 0.01,
            f0_mean: Some(2000.0),
            f0_std: Some(90.0),
            f0_cv: Some(0.045),
            rms_std: 0.001,
            zcr_mean: 0.01,
            ..quiet_set()
        }
    }

    // ==========================================================================
    // BASIC SCORING
    // ==========================================================================

    #[test]
    fn test_no_rules_fire() {
        let result = score(&quiet_set(), &ScoringConfig::default());
        assert_eq!(result.score, 0.0);
        assert!(result.reasons.is_empty());
        assert!(result.flags.is_empty());
        assert!(result.is_empty());
    }

    #[test]
    fn test_all_rules_fire() {
        let result = score(&loud_set(), &ScoringConfig::default());
        assert_eq!(result.score, 85.0);
        assert_eq!(result.reasons.len(), 6);
        assert_eq!(
            result.flags,
            vec![
                "flat_variation_low",
                "hf_ratio_variation_low",
                "pitch_variation_low",
                "pitch_jumps",
                "loudness_constant",
                "zcr_low",
            ]
        );
    }

    #[test]
    fn test_thresholds_are_strict() {
        let d = Descriptors {
            flat_std: 0.02,
            hf_ratio_std: 0.15,
            f0_cv: Some(0.05),
            f0_std: Some(80.0),
            rms_std: 0.01,
            zcr_mean: 0.03,
            ..quiet_set()
        };
        assert_eq!(score(&d, &ScoringConfig::default()).score, 0.0);
    }

    // ==========================================================================
    // RULE INDEPENDENCE
    // ==========================================================================
    //
    // Flipping exactly one rule's condition must move the score by exactly
    // that rule's weight and add or remove exactly its reason.
    // ==========================================================================

    fn trip(d: &mut Descriptors, key: DescriptorKey) {
        match key {
            DescriptorKey::FlatStd => d.flat_std = 0.001,
            DescriptorKey::HfRatioStd => d.hf_ratio_std = 0.01,
            DescriptorKey::F0Cv => d.f0_cv = Some(0.01),
            DescriptorKey::F0Std => d.f0_std = Some(120.0),
            DescriptorKey::RmsStd => d.rms_std = 0.001,
            DescriptorKey::ZcrMean => d.zcr_mean = 0.01,
            other => panic!("no default rule on {}", other),
        }
    }

    #[test]
    fn test_toggling_one_rule_from_empty() {
        let config = ScoringConfig::default();
        let base = score(&quiet_set(), &config);

        for rule in &config.rules {
            let mut d = quiet_set();
            trip(&mut d, rule.key);
            let result = score(&d, &config);

            assert_eq!(result.score - base.score, rule.weight, "rule {}", rule.flag);
            assert_eq!(result.reasons, vec![rule.reason.clone()]);
            assert_eq!(result.flags, vec![rule.flag.clone()]);
        }
    }

    #[test]
    fn test_toggling_one_rule_from_full() {
        let config = ScoringConfig::default();
        let full = score(&loud_set(), &config);

        for (i, rule) in config.rules.iter().enumerate() {
            let mut d = loud_set();
            // Restore the quiet value for just this descriptor
            match rule.key {
                DescriptorKey::F0Cv => d.f0_cv = quiet_set().f0_cv,
                DescriptorKey::F0Std => d.f0_std = quiet_set().f0_std,
                key => {
                    let quiet = quiet_set();
                    match key {
                        DescriptorKey::FlatStd => d.flat_std = quiet.flat_std,
                        DescriptorKey::HfRatioStd => d.hf_ratio_std = quiet.hf_ratio_std,
                        DescriptorKey::RmsStd => d.rms_std = quiet.rms_std,
                        DescriptorKey::ZcrMean => d.zcr_mean = quiet.zcr_mean,
                        other => panic!("no default rule on {}", other),
                    }
                }
            }
            let result = score(&d, &config);

            assert_eq!(full.score - result.score, rule.weight, "rule {}", rule.flag);
            let mut expected = full.reasons.clone();
            expected.remove(i);
            assert_eq!(result.reasons, expected);
        }
    }

    // ==========================================================================
    // UNDEFINED PITCH
    // ==========================================================================

    #[test]
    fn test_undefined_pitch_never_fires() {
        let d = Descriptors {
            f0_mean: None,
            f0_std: None,
            f0_cv: None,
            ..loud_set()
        };
        let result = score(&d, &ScoringConfig::default());

        assert_eq!(result.score, 85.0 - 20.0 - 10.0);
        assert!(!result.flags.iter().any(|f| f.starts_with("pitch")));
    }

    // ==========================================================================
    // ORDERING, RANGE & DETERMINISM
    // ==========================================================================

    #[test]
    fn test_reason_order_follows_table() {
        let config = ScoringConfig::default();
        let mut d = quiet_set();
        // Trip in reverse order
        trip(&mut d, DescriptorKey::ZcrMean);
        trip(&mut d, DescriptorKey::F0Cv);
        trip(&mut d, DescriptorKey::FlatStd);

        let result = score(&d, &config);
        assert_eq!(
            result.reasons,
            vec![
                config.rules[0].reason.clone(),
                config.rules[2].reason.clone(),
                config.rules[5].reason.clone(),
            ]
        );
    }

    #[test]
    fn test_score_is_clamped() {
        let config = ScoringConfig {
            rules: (0..5)
                .map(|i| {
                    Rule::new(
                        &format!("r{}", i),
                        DescriptorKey::RmsMean,
                        Comparison::Above,
                        0.0,
                        40.0,
                        "loud",
                    )
                })
                .collect(),
        };
        let result = score(&quiet_set(), &config);
        assert_eq!(result.score, 100.0);
        assert_eq!(result.reasons.len(), 5);
    }

    #[test]
    fn test_score_range_over_grid() {
        let config = ScoringConfig::default();
        for flat_std in [0.0, 0.01, 0.5] {
            for f0_cv in [None, Some(0.0), Some(1.0)] {
                for rms_std in [0.0, 0.02] {
                    let d = Descriptors {
                        flat_std,
                        f0_cv,
                        rms_std,
                        ..quiet_set()
                    };
                    let s = score(&d, &config).score;
                    assert!((0.0..=100.0).contains(&s), "score {}", s);
                }
            }
        }
    }

    #[test]
    fn test_scoring_is_deterministic() {
        let config = ScoringConfig::default();
        assert_eq!(score(&loud_set(), &config), score(&loud_set(), &config));
    }

    #[test]
    fn test_empty_table() {
        let result = score(&loud_set(), &ScoringConfig { rules: vec![] });
        assert_eq!(result, SuspicionScore::default());
    }
}
