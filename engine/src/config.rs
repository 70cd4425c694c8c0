use std::time::Duration;

use chrono_tz::Tz;

/// Numeric policy for accepting a semantic match without clarification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AcceptancePolicy {
    /// Top score at or above which a match is accepted outright
    pub threshold: f64,
    /// Lower bar that still accepts a match when it is a clear winner
    pub fallback_threshold: f64,
    /// Minimum distance between the top two scores for a clear winner
    pub min_gap: f64,
    /// Alternatives surfaced when the result is ambiguous
    pub max_alternatives: usize,
}

impl Default for AcceptancePolicy {
    fn default() -> Self {
        Self {
            threshold: 0.45,
            fallback_threshold: 0.40,
            min_gap: 0.08,
            max_alternatives: 3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub acceptance: AcceptancePolicy,
    /// Classified intents below this confidence are ignored
    pub classifier_min_confidence: f64,
    /// Candidates fetched from the semantic resolver per query
    pub semantic_top_k: usize,
    /// Offset added to the spoken local hour to obtain the stored hour
    pub storage_offset_hours: i32,
    /// Zone used for "today", the assumed year, and displayed dates
    pub timezone: Tz,
    /// Contexts untouched for longer than this are evicted by the sweeper
    pub context_idle_ttl: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            acceptance: AcceptancePolicy::default(),
            classifier_min_confidence: 0.70,
            semantic_top_k: 5,
            storage_offset_hours: -2,
            timezone: chrono_tz::Asia::Jerusalem,
            context_idle_ttl: Duration::from_secs(24 * 60 * 60),
        }
    }
}
