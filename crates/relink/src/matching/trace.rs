//! Structured match events.
//!
//! Strategies report what they considered through a [`MatchObserver`]; the
//! match result never depends on what the observer does with it.

use crate::matching::strategies::Strategy;
use serde::Serialize;
use std::sync::Mutex;
use tracing::debug;

/// Why a legacy URL was deliberately left without a redirect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Not an absolute URL with a host.
    Unparsable,
    /// Path is only a locale segment in a multi-domain catalog.
    LocaleOnlyPath,
    /// The same path exists on the catalog's `.com` domain.
    IdenticalPathOnCom,
}

/// One step of the match pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum MatchEvent {
    /// A candidate became the best one so far for a strategy.
    Candidate {
        strategy: Strategy,
        old_url: String,
        candidate: String,
        similarity: f64,
        score: f64,
    },
    Matched {
        strategy: Strategy,
        old_url: String,
        new_url: String,
        score: u8,
    },
    Skipped {
        old_url: String,
        reason: SkipReason,
    },
    NoMatch {
        old_url: String,
    },
}

/// Receiver for [`MatchEvent`]s. Called from worker threads.
pub trait MatchObserver: Send + Sync {
    fn on_event(&self, event: MatchEvent);
}

/// Forwards events to `tracing` at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl MatchObserver for TracingObserver {
    fn on_event(&self, event: MatchEvent) {
        match event {
            MatchEvent::Candidate {
                strategy,
                old_url,
                candidate,
                similarity,
                score,
            } => debug!(%strategy, %old_url, %candidate, similarity, score, "candidate"),
            MatchEvent::Matched {
                strategy,
                old_url,
                new_url,
                score,
            } => debug!(%strategy, %old_url, %new_url, score, "matched"),
            MatchEvent::Skipped { old_url, reason } => debug!(%old_url, ?reason, "skipped"),
            MatchEvent::NoMatch { old_url } => debug!(%old_url, "no match"),
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<MatchEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<MatchEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Events about `old_url`, in the order they were recorded.
    pub fn events_for(&self, old_url: &str) -> Vec<MatchEvent> {
        self.events()
            .into_iter()
            .filter(|e| e.old_url() == old_url)
            .collect()
    }
}

impl MatchObserver for RecordingObserver {
    fn on_event(&self, event: MatchEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl MatchEvent {
    pub fn old_url(&self) -> &str {
        match self {
            MatchEvent::Candidate { old_url, .. }
            | MatchEvent::Matched { old_url, .. }
            | MatchEvent::Skipped { old_url, .. }
            | MatchEvent::NoMatch { old_url } => old_url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_observer_filters_by_url() {
        let obs = RecordingObserver::new();
        obs.on_event(MatchEvent::NoMatch {
            old_url: "https://a.com/x".into(),
        });
        obs.on_event(MatchEvent::Skipped {
            old_url: "https://b.com/tr".into(),
            reason: SkipReason::LocaleOnlyPath,
        });
        assert_eq!(obs.events().len(), 2);
        assert_eq!(
            obs.events_for("https://b.com/tr"),
            vec![MatchEvent::Skipped {
                old_url: "https://b.com/tr".into(),
                reason: SkipReason::LocaleOnlyPath,
            }]
        );
    }

    #[test]
    fn test_event_serialization() {
        let event = MatchEvent::Matched {
            strategy: Strategy::SameDomain,
            old_url: "https://shop.com/products/a".into(),
            new_url: "https://shop.com/products/b".into(),
            score: 88,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["event"], "matched");
        assert_eq!(json["strategy"], "same_domain");
        assert_eq!(json["score"], 88);
    }
}
