//! # Configuration
//!
//! Process-level settings for the generator runtime.
//!
//! - `controller`: environment-driven controller configuration
//! - `duration`: Kubernetes duration string parsing

pub mod controller;
pub mod duration;

pub use controller::ControllerConfig;
pub use duration::parse_kubernetes_duration;
