//! # Prelude
//!
//! Re-exports commonly used types and traits for convenience.
//!
//! ```rust
//! use secret_generator_controller::prelude::*;
//! ```

// Ledger and generator resources
pub use crate::crd::*;

// Generator contract and resolution
pub use crate::generator::{
    Generator, GeneratorError, GeneratorOutput, GeneratorRegistry, GeneratorTag, RegistryError,
};

// State management
pub use crate::statemanager::{
    cleanup_immediate, garbage_collect, gc_key, AggregateError, GcEntry, GcScheduler,
    StateError, StateManager,
};

// Runtime wiring
pub use crate::config::ControllerConfig;
pub use crate::runtime::GeneratorRuntime;
