//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! GET /healthCheck
//!     → controller.rs (declared through the routing engine)
//!     → every HealthValidator::validate, concurrently
//!     → worst status wins → {status, otherModules}
//! ```
//!
//! # Design Decisions
//! - The endpoint always answers 200; the body carries the verdict
//! - Validators never fail; problems are reported as a status

pub mod controller;
pub mod store;
pub mod validator;

pub use controller::HealthController;
pub use store::StoreHealthCheck;
pub use validator::{HealthReport, HealthStatus, HealthValidator};
