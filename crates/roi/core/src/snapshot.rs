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

//! Version Snapshots
//!
//! A snapshot is an immutable capture of a report's section list. Sections are deep
//! copied when the snapshot is taken, so later edits to the live list never reach a
//! stored snapshot. Only the name and description can change after capture.

use crate::section::Section;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Id under which the live section list takes part in comparisons
///
/// Snapshot ids are UUIDs and [`crate::history::VersionHistory`] refuses to hold a
/// snapshot with this id, so the sentinel cannot shadow a stored version.
pub const CURRENT_VERSION_ID: &str = "current";

/// Unique identifier for snapshots
pub type VersionId = String;

/// Point-in-time capture of a report's sections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionSnapshot {
    id: VersionId,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    sections: Vec<Section>,
    created_by: String,
    created_at: DateTime<Utc>,
}

impl VersionSnapshot {
    /// Capture `sections` under a fresh id
    pub fn capture(name: impl Into<String>, description: Option<String>, sections: &[Section], created_by: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), name, description, sections, created_by, created_at)
    }

    /// Capture `sections` under a caller-chosen id
    pub fn with_id(id: impl Into<String>, name: impl Into<String>, description: Option<String>, sections: &[Section], created_by: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description,
            sections: sections.to_vec(),
            created_by: created_by.into(),
            created_at,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn created_by(&self) -> &str {
        &self.created_by
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// Change the descriptive metadata; content stays untouched
    pub(crate) fn rename(&mut self, name: String, description: Option<String>) {
        self.name = name;
        self.description = description;
    }

    /// Lightweight listing entry without the section payload
    pub fn summary(&self) -> VersionSummary {
        VersionSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            section_count: self.sections.len(),
            created_by: self.created_by.clone(),
            created_at: self.created_at,
        }
    }
}

/// Listing view of a snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionSummary {
    pub id: VersionId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub section_count: usize,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

/// One side of a version comparison
#[derive(Debug, Clone, Copy)]
pub enum Comparand<'a> {
    /// A stored snapshot
    Snapshot(&'a VersionSnapshot),
    /// The report's live sections, compared as if they were a snapshot with id `"current"`
    Live(&'a [Section]),
}

impl<'a> Comparand<'a> {
    pub fn id(&self) -> &'a str {
        match *self {
            Comparand::Snapshot(snapshot) => snapshot.id(),
            Comparand::Live(_) => CURRENT_VERSION_ID,
        }
    }

    pub fn sections(&self) -> &'a [Section] {
        match *self {
            Comparand::Snapshot(snapshot) => snapshot.sections(),
            Comparand::Live(sections) => sections,
        }
    }
}

impl<'a> From<&'a VersionSnapshot> for Comparand<'a> {
    fn from(snapshot: &'a VersionSnapshot) -> Self {
        Comparand::Snapshot(snapshot)
    }
}
