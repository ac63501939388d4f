//! Testing utilities for context propagation.
//!
//! This module provides:
//! - Identity fixtures and flow helpers
//! - Mock providers and work item handlers
//! - Assertions for captured and resolved identities

mod assertions;
mod fixtures;
mod mocks;

pub use assertions::{assert_identity, assert_inbound_request, assert_synthetic_request};
pub use fixtures::{identity_snapshot, TestIdentity};
pub use mocks::{FailingHandler, RecordedItem, RecordingHandler, StaticRequestProvider};
