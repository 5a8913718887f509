//! Score statistics for a session.

use crate::store::LegacyUrlRecord;
use serde::Serialize;

/// Match quality bucket of a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScoreBand {
    Excellent,
    Good,
    Fair,
    Fallback,
}

impl ScoreBand {
    pub fn of(score: u8) -> Self {
        match score {
            90.. => ScoreBand::Excellent,
            70..=89 => ScoreBand::Good,
            50..=69 => ScoreBand::Fair,
            _ => ScoreBand::Fallback,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreBand::Excellent => "excellent",
            ScoreBand::Good => "good",
            ScoreBand::Fair => "fair",
            ScoreBand::Fallback => "fallback",
        }
    }
}

/// Counts over one session's records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionStats {
    pub total: usize,
    pub matched: usize,
    pub pending: usize,
    pub excellent: usize,
    pub good: usize,
    pub fair: usize,
    pub fallback: usize,
}

impl SessionStats {
    pub fn from_records(records: &[LegacyUrlRecord]) -> Self {
        let mut stats = Self {
            total: records.len(),
            ..Self::default()
        };
        for record in records {
            if !record.is_matched() {
                stats.pending += 1;
                continue;
            }
            stats.matched += 1;
            match ScoreBand::of(record.score) {
                ScoreBand::Excellent => stats.excellent += 1,
                ScoreBand::Good => stats.good += 1,
                ScoreBand::Fair => stats.fair += 1,
                ScoreBand::Fallback => stats.fallback += 1,
            }
        }
        stats
    }

    /// Matched share of all records, in percent.
    pub fn match_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.matched as f64 * 100.0 / self.total as f64
    }
}
