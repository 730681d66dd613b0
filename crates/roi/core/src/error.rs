// Dotlanth
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Error taxonomy shared by every report operation

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Kind of resource an id failed to resolve to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Report,
    Version,
    Template,
    Section,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResourceKind::Report => "report",
            ResourceKind::Version => "version",
            ResourceKind::Template => "template",
            ResourceKind::Section => "section",
        };
        f.write_str(name)
    }
}

/// Errors returned by the report engine
///
/// Pure operations only ever produce `NotFound`, `InvalidArgument` and `Conflict`.
/// `Forbidden` and `Collaborator` come from the service layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoiError {
    #[error("{kind} not found: {id}")]
    NotFound { kind: ResourceKind, id: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Collaborator failure: {0}")]
    Collaborator(String),
}

impl RoiError {
    pub fn not_found(kind: ResourceKind, id: impl Into<String>) -> Self {
        RoiError::NotFound { kind, id: id.into() }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        RoiError::InvalidArgument(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        RoiError::Conflict(message.into())
    }

    /// Stable identifier for the error kind
    pub fn error_type(&self) -> &'static str {
        match self {
            RoiError::NotFound { .. } => "not_found",
            RoiError::InvalidArgument(_) => "invalid_argument",
            RoiError::Conflict(_) => "conflict",
            RoiError::Forbidden(_) => "forbidden",
            RoiError::Collaborator(_) => "collaborator",
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, RoiError::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, RoiError::Conflict(_))
    }
}

impl From<serde_json::Error> for RoiError {
    fn from(err: serde_json::Error) -> Self {
        RoiError::InvalidArgument(format!("malformed JSON: {err}"))
    }
}

/// Type alias for report engine results
pub type RoiResult<T> = Result<T, RoiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_message() {
        let err = RoiError::not_found(ResourceKind::Version, "v-1");
        assert_eq!(err.to_string(), "version not found: v-1");
        assert!(err.is_not_found());
        assert_eq!(err.error_type(), "not_found");
    }

    #[test]
    fn test_error_types_are_distinct() {
        let errors = [
            RoiError::invalid("x"),
            RoiError::conflict("x"),
            RoiError::Forbidden("x".to_string()),
            RoiError::Collaborator("x".to_string()),
        ];
        let kinds: Vec<_> = errors.iter().map(RoiError::error_type).collect();
        assert_eq!(kinds, vec!["invalid_argument", "conflict", "forbidden", "collaborator"]);
    }

    #[test]
    fn test_json_error_maps_to_invalid_argument() {
        let err: RoiError = serde_json::from_str::<serde_json::Value>("{").unwrap_err().into();
        assert_eq!(err.error_type(), "invalid_argument");
    }
}
