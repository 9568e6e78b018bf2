//! Secret Generator Controller Library
//!
//! Generator state tracking and garbage collection for a Kubernetes
//! secret-synchronization operator.
//!
//! Generators create external artifacts (tokens, passwords, service account
//! credentials) while an owning resource is reconciled. This library records
//! those artifacts in the owning resource's status, commits or rolls back that
//! record together with the reconcile, and destroys artifacts once they are
//! superseded or the owner goes away.
//!
//! ## Quick Start
//!
//! ```rust
//! use secret_generator_controller::prelude::*;
//! ```

pub mod config;
pub mod constants;
pub mod crd;
pub mod generator;
pub mod observability;
pub mod prelude;
pub mod runtime;
pub mod server;
pub mod statemanager;
