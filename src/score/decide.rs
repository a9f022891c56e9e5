//! Mitigation decider
//!
//! Maps (score, classification) to an action on the fixed severity lattice
//! allow < monitor < rate_limit < challenge < block. Monotonic in score for
//! a fixed classification type.

use super::{Action, ClassType, Classification};
use crate::config::DeciderConfig;

pub fn decide(score: u8, classification: &Classification, config: &DeciderConfig) -> Action {
    // Hard safety guard, not an incidental consequence of thresholds:
    // a good-classified entity is never blocked.
    if classification.kind == ClassType::Good {
        return Action::Allow;
    }

    if score >= config.block_min {
        Action::Block
    } else if score >= config.challenge_min {
        Action::Challenge
    } else if score >= config.rate_limit_min {
        Action::RateLimit
    } else if score >= config.monitor_min {
        Action::Monitor
    } else {
        Action::Allow
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classification(kind: ClassType, confidence: u8) -> Classification {
        Classification {
            kind,
            category: "test".to_string(),
            confidence,
        }
    }

    #[test]
    fn test_good_is_always_allow() {
        let config = DeciderConfig::default();
        for score in 0..=100u8 {
            let c = classification(ClassType::Good, score);
            assert_eq!(decide(score, &c, &config), Action::Allow);
        }
    }

    #[test]
    fn test_good_is_never_blocked_even_with_degenerate_breakpoints() {
        // All breakpoints at zero would block everything that is not
        // guarded explicitly.
        let config = DeciderConfig {
            monitor_min: 0,
            rate_limit_min: 0,
            challenge_min: 0,
            block_min: 0,
        };
        let c = classification(ClassType::Good, 100);
        assert_eq!(decide(100, &c, &config), Action::Allow);
    }

    #[test]
    fn test_monotonic_in_score_for_bad() {
        let config = DeciderConfig::default();
        let mut previous = Action::Allow;
        for score in 0..=100u8 {
            let c = classification(ClassType::Bad, score);
            let action = decide(score, &c, &config);
            assert!(action >= previous, "action regressed at score {}", score);
            previous = action;
        }
    }

    #[test]
    fn test_default_bands() {
        let config = DeciderConfig::default();
        let unknown = classification(ClassType::Unknown, 0);
        assert_eq!(decide(10, &unknown, &config), Action::Allow);
        assert_eq!(decide(20, &unknown, &config), Action::Monitor);
        assert_eq!(decide(45, &unknown, &config), Action::RateLimit);
        assert_eq!(decide(70, &unknown, &config), Action::Challenge);
        assert_eq!(decide(90, &unknown, &config), Action::Block);
    }
}
