//! Location acquisition: providers, the permission gate, and the flow.
//!
//! Providers are the only code that touches the outside world.
//! The flow decides what to ask them and when; the tracker runs it.

mod consent;
pub mod flow;
mod fixed;
mod gpsd;
mod provider;
mod tracker;

pub use consent::{Consented, PermissionPolicy, PermissionPrompt};
pub use fixed::FixedProvider;
pub use gpsd::{DEFAULT_ADDRESS as DEFAULT_GPSD_ADDRESS, GpsdProvider};
pub use provider::{LocationProvider, PermissionStatus, ProviderError};
pub use tracker::LocationTracker;
