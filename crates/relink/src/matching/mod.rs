//! Legacy URL matching against a catalog.

pub mod engine;
pub mod locale;
pub mod strategies;
pub mod trace;

pub use engine::{MatchEngine, Outcome};
pub use locale::{LocaleResolver, LocaleStats};
pub use strategies::{Match, Strategy};
pub use trace::{MatchEvent, MatchObserver, RecordingObserver, SkipReason, TracingObserver};
