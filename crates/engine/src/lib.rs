//! Fact aggregation engine.
//!
//! A run discovers the available [fact producers](producer::FactProducer),
//! executes each behind its own failure boundary, merges the successful
//! results with last-write-wins, and overlays them onto the conditional
//! document consumed by the device-management agent.
//!
//! ```text
//! registry::discover -> coordinator::run -> normalize::merge -> StateStore::apply
//! ```

pub mod config;
pub mod coordinator;
pub mod error;
pub mod external;
pub mod normalize;
pub mod pipeline;
pub mod prefs;
pub mod process;
pub mod producer;
pub mod registry;
pub mod store;
pub mod value;

pub use config::Settings;
pub use coordinator::RunOutcome;
pub use error::{ConfigError, EngineError, ProducerError, Result, StoreError};
pub use hostfacts_worker::JobBudget;
pub use pipeline::{RunReport, run_once};
pub use prefs::{ManagedInstallsPlist, PreferenceSource, StaticPreference};
pub use producer::{FactProducer, ProducerHandle, ProducerResult, ProducerSource};
pub use store::{ApplyOutcome, PriorState, StateStore};
pub use value::{FactMap, FactValue, Record};

// Used by `fact_producer!` expansions in downstream crates.
#[doc(hidden)]
pub use {inventory, paste};
