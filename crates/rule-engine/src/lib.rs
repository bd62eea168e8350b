//! Dispatches the four transformation rule kinds against a graph in
//! declared order (§4.5).

mod aggregation;
pub mod cancellation;
mod cross_link;
mod derived_node;
pub mod engine;
mod enrich_properties;
pub mod error;
mod id_template;
mod resolve;

pub use cancellation::{CancellationToken, NeverCancelled};
pub use engine::{RuleEngine, RuleOutcome, RuleState};
pub use error::{ApplyError, RuleEngineError, RuleEngineResult};
