// Copyright 2025 the KeepTrack Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types reported by host capabilities.

use alloc::string::String;

/// A selector could not be parsed or evaluated by the host.
///
/// Hosts return this from [`Dom::closest`](crate::Dom::closest) and
/// [`Dom::query_selector`](crate::Dom::query_selector). The engine never
/// propagates it: a target selector that fails is treated as "no target".
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid selector `{selector}`: {reason}")]
pub struct SelectorError {
    /// The selector text as written in the attribute.
    pub selector: String,
    /// Host-specific description of the failure.
    pub reason: String,
}

impl SelectorError {
    /// Creates a new selector error.
    pub fn new(selector: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            reason: reason.into(),
        }
    }
}
