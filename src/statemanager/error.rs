//! # State Manager Errors
//!
//! Per-entry failures and the aggregate returned by a whole pass.

use crate::generator::{GeneratorError, RegistryError};
use thiserror::Error;

/// Failure to complete bookkeeping for a single ledger entry
#[derive(Debug, Error)]
pub enum StateError {
    #[error("Failed to resolve generator for {key}: {source}")]
    Resolve {
        key: String,
        #[source]
        source: RegistryError,
    },
    #[error("Failed to clean up generated resource {key}: {source}")]
    Cleanup {
        key: String,
        #[source]
        source: GeneratorError,
    },
}

impl StateError {
    /// Ledger key the failure belongs to
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            StateError::Resolve { key, .. } | StateError::Cleanup { key, .. } => key,
        }
    }
}

/// Every error encountered during one commit, rollback, or sweep, in order
///
/// A pass never stops at the first failure; callers get the full list.
#[derive(Debug, Default, Error)]
#[error("{}", join_errors(.errors))]
pub struct AggregateError {
    errors: Vec<StateError>,
}

impl AggregateError {
    #[must_use]
    pub fn errors(&self) -> &[StateError] {
        &self.errors
    }

    #[must_use]
    pub fn into_errors(self) -> Vec<StateError> {
        self.errors
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub(crate) fn push(&mut self, error: StateError) {
        self.errors.push(error);
    }

    pub(crate) fn into_result(self) -> Result<(), Self> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

fn join_errors(errors: &[StateError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
