//! Docker Swarm secrets plugin with automatic rotation
//!
//! The binary serves the Docker secret-provider plugin protocol on a unix
//! socket. Every lookup goes through a [`secrets::SecretsProvider`]; values
//! that were delivered are tracked, and a background scheduler rotates the
//! swarm secret objects when the backend value changes.
//!
//! ```text
//!   dockerd ──► methods (axum) ──► Driver ──► SecretsProvider ──► backend
//!                                    │
//!                                    ├─► SecretTracker
//!                                    │        ▲
//!                                    └─► RotationScheduler ──► Rotator ──► OrchestratorClient
//! ```

pub mod config;
pub mod constants;
pub mod driver;
pub mod error;
pub mod methods;
pub mod rotation;
pub mod scheduler;
pub mod shutdown;
pub mod state;
pub mod stats;
pub mod tracker;

pub use config::{DriverConfig, PluginConfig};
pub use driver::{should_not_reuse, Driver, SecretResponse};
pub use error::{CleanupError, DriverError, RotationError};
pub use rotation::{RotationOutcome, Rotator};
pub use scheduler::{CycleReport, RotationScheduler, SchedulerState};
pub use state::AppState;
pub use stats::RotationStats;
pub use tracker::{Delivery, SecretTracker};
