//! Classifier
//!
//! Ordered rule evaluation over (score, signal set); first matching rule
//! wins. Deterministic: identical input always produces the identical
//! classification.

use super::{ClassType, Classification};
use crate::config::ClassifierConfig;
use crate::signal::{names, Signal};

pub fn classify(score: u8, signals: &[Signal], config: &ClassifierConfig) -> Classification {
    let trusted = signals.iter().any(|s| s.name == names::IDENTITY_TRUSTED);

    // Rule 1: low score from a recognized trusted actor.
    if score < config.benign_max && trusted {
        return Classification {
            kind: ClassType::Good,
            category: "trusted".to_string(),
            confidence: score,
        };
    }

    // Rule 2: above the bad threshold; category from the highest-priority
    // matching rule.
    if score >= config.bad_min {
        let category = config
            .category_rules
            .iter()
            .find(|rule| signals.iter().any(|s| s.name.starts_with(&rule.prefix)))
            .map(|rule| rule.category.clone())
            .unwrap_or_else(|| config.default_category.clone());

        return Classification {
            kind: ClassType::Bad,
            category,
            confidence: score,
        };
    }

    // Rule 3: everything else stays undecided.
    Classification {
        kind: ClassType::Unknown,
        category: config.default_category.clone(),
        confidence: score,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(names: &[&str]) -> Vec<Signal> {
        names.iter().map(|n| Signal::new(*n, 10)).collect()
    }

    #[test]
    fn test_trusted_low_score_is_good() {
        let signals = named(&[names::IDENTITY_TRUSTED]);
        let c = classify(5, &signals, &ClassifierConfig::default());
        assert_eq!(c.kind, ClassType::Good);
        assert_eq!(c.category, "trusted");
    }

    #[test]
    fn test_low_score_without_trusted_signal_stays_unknown() {
        let c = classify(5, &[], &ClassifierConfig::default());
        assert_eq!(c.kind, ClassType::Unknown);
    }

    #[test]
    fn test_trusted_signal_with_high_score_is_not_good() {
        let signals = named(&[names::IDENTITY_TRUSTED, names::RATE_HIGH]);
        let c = classify(75, &signals, &ClassifierConfig::default());
        assert_eq!(c.kind, ClassType::Bad);
    }

    #[test]
    fn test_bad_category_priority_order() {
        // Automation outranks rate in the default rule order.
        let signals = named(&[names::RATE_HIGH, names::IDENTITY_AUTOMATION]);
        let c = classify(80, &signals, &ClassifierConfig::default());
        assert_eq!(c.kind, ClassType::Bad);
        assert_eq!(c.category, "scanner");

        let rate_only = named(&[names::RATE_HIGH]);
        let c = classify(80, &rate_only, &ClassifierConfig::default());
        assert_eq!(c.category, "scraper");
    }

    #[test]
    fn test_bad_without_matching_rule_uses_default_category() {
        let signals = named(&["custom.weirdness"]);
        let c = classify(90, &signals, &ClassifierConfig::default());
        assert_eq!(c.kind, ClassType::Bad);
        assert_eq!(c.category, "anomalous");
    }

    #[test]
    fn test_confidence_equals_score() {
        for score in [0u8, 30, 61, 100] {
            let c = classify(score, &[], &ClassifierConfig::default());
            assert_eq!(c.confidence, score);
        }
    }

    #[test]
    fn test_determinism() {
        let signals = named(&[names::RATE_ELEVATED, names::IDENTITY_MISSING]);
        let a = classify(65, &signals, &ClassifierConfig::default());
        let b = classify(65, &signals, &ClassifierConfig::default());
        assert_eq!(a, b);
    }
}
