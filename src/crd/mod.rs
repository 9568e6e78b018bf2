//! # Custom Resource Definitions
//!
//! CRD and status types for generator state tracking.
//!
//! ## Module Structure
//!
//! - `state.rs` - The generator ledger embedded in owning resources' status
//! - `generators.rs` - Built-in generator resources (`Fake`, `UUID`)

mod generators;
mod state;

// Re-export all public types
pub use generators::{Fake, FakeSpec, Uuid, UuidSpec};
pub use state::{
    GeneratorGcState, GeneratorLedger, GeneratorResourceState, HasGeneratorState,
};
