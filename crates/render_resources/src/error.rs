//! Error types for resource creation and strict handle validation
//!
//! Lookups on the hot path never produce these; stale handles there are
//! reported as `None`/`false`. Errors are reserved for backend construction
//! failures, rejected descriptions, and callers that explicitly ask for
//! fail-fast validation.

use crate::config::ConfigError;
use crate::resources::handle::ResourceType;

/// Errors raised by the resource device and its backends
#[derive(thiserror::Error, Debug)]
pub enum ResourceError {
    /// The backend could not construct a native resource
    ///
    /// Backends must leave nothing allocated when returning this.
    #[error("Failed to create {kind}: {reason}")]
    CreationFailed {
        /// Kind of resource being created
        kind: ResourceType,
        /// Backend supplied reason
        reason: String,
    },

    /// A creation description was rejected before reaching the backend
    #[error("Invalid {kind} description: {reason}")]
    InvalidDescription {
        /// Kind of resource being described
        kind: ResourceType,
        /// What was wrong with it
        reason: String,
    },

    /// The sentinel handle was presented where a live resource is required
    #[error("Invalid {kind} handle: no resource was ever allocated for it")]
    InvalidHandle {
        /// Kind of the handle
        kind: ResourceType,
    },

    /// The handle does not match what its slot currently holds
    #[error(
        "Stale {kind} handle: expected id {id} generation {expected_generation}, \
         slot has generation {} ({})",
        describe_generation(.actual_generation),
        describe_occupancy(.occupied)
    )]
    StaleHandle {
        /// Kind of the handle
        kind: ResourceType,
        /// Slot id carried by the handle
        id: u32,
        /// Generation carried by the handle
        expected_generation: u32,
        /// Generation stored in the slot, `None` if the id is out of range
        actual_generation: Option<u32>,
        /// Whether the slot currently holds a resource
        occupied: bool,
    },

    /// Device configuration was rejected
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

fn describe_generation(generation: &Option<u32>) -> String {
    generation.map_or_else(|| "none".to_string(), |g| g.to_string())
}

fn describe_occupancy(occupied: &bool) -> &'static str {
    if *occupied { "occupied" } else { "empty" }
}

/// Result type for resource operations
pub type ResourceResult<T> = Result<T, ResourceError>;

impl ResourceError {
    /// Shorthand for a backend construction failure
    pub fn creation_failed(kind: ResourceType, reason: impl Into<String>) -> Self {
        Self::CreationFailed {
            kind,
            reason: reason.into(),
        }
    }

    /// Shorthand for a rejected description
    pub fn invalid_description(kind: ResourceType, reason: impl Into<String>) -> Self {
        Self::InvalidDescription {
            kind,
            reason: reason.into(),
        }
    }

    /// Whether this error came from presenting a dead or sentinel handle
    pub fn is_handle_error(&self) -> bool {
        matches!(self, Self::InvalidHandle { .. } | Self::StaleHandle { .. })
    }
}
