//! Session and registry logic for the mbroker publish/subscribe broker.
//!
//! Wires [`mbroker_store`]'s byte-log storage to the wire protocol in
//! [`mbroker_proto`]: a bounded registration queue, a fixed box registry
//! with per-box wakeups, and the five session state machines dispatched
//! from a worker pool.

mod broker;
mod config;
mod dispatcher;
mod error;
mod invariants;
mod metrics;
mod queue;
mod registry;
mod session;

pub use broker::{Broker, SHUTDOWN_GRACE};
pub use config::BrokerConfig;
pub use error::{QueueError, SessionError};
pub use metrics::RegistryMetrics;
pub use queue::BoundedQueue;
pub use registry::BoxRegistry;
pub use session::dispatch as handle_registration;
