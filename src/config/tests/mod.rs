//! Unit tests for steptrack configuration types.
//!
//! This module contains tests organised into:
//! - [`helpers`] - Shared fixtures and helper functions
//! - [`types_tests`] - Basic type, deserialisation and name resolution tests
//! - [`layer_precedence_tests`] - `MergeComposer` layer precedence tests

mod helpers;
