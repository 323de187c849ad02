/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 27/1/26
******************************************************************************/

//! Validation configuration.
//!
//! This module provides the options shared by every validation run of an
//! orchestrator.

use ironcheck_core::message::MessageType;
use ironcheck_validation::CompareOptions;
use serde::{Deserialize, Serialize};

/// Policy for combining a custom validation callback with the structural
/// validators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationMode {
    /// The callback replaces the structural payload validators.
    ///
    /// Header validation still runs.
    #[default]
    Exclusive,
    /// The callback runs in addition to the structural validators.
    Combined,
}

/// Configuration for validation runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Whether header names are compared case-insensitively.
    pub header_name_ignore_case: bool,
    /// Callback exclusivity policy.
    pub validation_mode: ValidationMode,
    /// Whether schema checks run when a context names a schema.
    pub schema_validation: bool,
    /// Whether an unknown `@matcher@` is an error rather than a literal.
    pub fail_on_unknown_matcher: bool,
    /// Forced message type, overriding inference.
    pub default_message_type: Option<MessageType>,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ValidationConfig {
    /// Creates a configuration with default settings.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            header_name_ignore_case: false,
            validation_mode: ValidationMode::Exclusive,
            schema_validation: true,
            fail_on_unknown_matcher: true,
            default_message_type: None,
        }
    }

    /// Sets header name case handling.
    #[must_use]
    pub const fn with_header_name_ignore_case(mut self, ignore_case: bool) -> Self {
        self.header_name_ignore_case = ignore_case;
        self
    }

    /// Sets the validation mode.
    #[must_use]
    pub const fn with_validation_mode(mut self, mode: ValidationMode) -> Self {
        self.validation_mode = mode;
        self
    }

    /// Enables or disables schema checks.
    #[must_use]
    pub const fn with_schema_validation(mut self, enabled: bool) -> Self {
        self.schema_validation = enabled;
        self
    }

    /// Sets unknown matcher handling.
    #[must_use]
    pub const fn with_fail_on_unknown_matcher(mut self, fail: bool) -> Self {
        self.fail_on_unknown_matcher = fail;
        self
    }

    /// Forces a message type.
    #[must_use]
    pub fn with_default_message_type(mut self, message_type: MessageType) -> Self {
        self.default_message_type = Some(message_type);
        self
    }

    /// Returns the comparison flags derived from this configuration.
    #[must_use]
    pub const fn compare_options(&self) -> CompareOptions {
        CompareOptions {
            header_name_ignore_case: self.header_name_ignore_case,
            schema_validation: self.schema_validation,
            fail_on_unknown_matcher: self.fail_on_unknown_matcher,
        }
    }
}
