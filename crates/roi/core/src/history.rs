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

//! Version History
//!
//! Ordered, create-only list of snapshots owned by one report. Snapshots can be
//! renamed or deleted, never edited. Names are unique within a history; ids are
//! UUIDs and never equal to [`CURRENT_VERSION_ID`].

use crate::error::{ResourceKind, RoiError, RoiResult};
use crate::section::Section;
use crate::snapshot::{CURRENT_VERSION_ID, Comparand, VersionSnapshot, VersionSummary};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::debug;

/// Retention settings for a version history
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryConfig {
    /// Maximum number of snapshots kept; the oldest are pruned first
    pub max_versions: Option<usize>,
}

/// Snapshots of one report, oldest first
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<VersionSnapshot>", into = "Vec<VersionSnapshot>")]
pub struct VersionHistory {
    versions: Vec<VersionSnapshot>,
}

impl VersionHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a history from stored snapshots
    pub fn from_snapshots(versions: Vec<VersionSnapshot>) -> RoiResult<Self> {
        let mut seen = HashSet::with_capacity(versions.len());
        for snapshot in &versions {
            check_not_reserved(snapshot.id())?;
            if !seen.insert(snapshot.id()) {
                return Err(RoiError::invalid(format!("duplicate version id '{}'", snapshot.id())));
            }
        }
        Ok(Self { versions })
    }

    /// Capture `sections` as a new snapshot
    ///
    /// Fails with `InvalidArgument` on a blank name and `Conflict` when the name is taken.
    pub fn create(&mut self, name: &str, description: Option<String>, sections: &[Section], author: &str, now: DateTime<Utc>, config: &HistoryConfig) -> RoiResult<&VersionSnapshot> {
        let name = normalize_name(name)?;
        if self.find_by_name(&name).is_some() {
            return Err(RoiError::conflict(format!("a version named '{name}' already exists")));
        }

        let snapshot = VersionSnapshot::capture(name, description, sections, author, now);
        let id = snapshot.id().to_string();
        debug!(version_id = %id, sections = sections.len(), "capturing version snapshot");
        self.versions.push(snapshot);

        if let Some(max) = config.max_versions {
            self.prune_to(max.max(1));
        }
        self.get(&id)
    }

    /// Create a snapshot under a generated name that does not collide
    pub fn create_with_unique_name(&mut self, base: &str, description: Option<String>, sections: &[Section], author: &str, now: DateTime<Utc>, config: &HistoryConfig) -> RoiResult<&VersionSnapshot> {
        let name = self.unique_name(base);
        self.create(&name, description, sections, author, now, config)
    }

    fn unique_name(&self, base: &str) -> String {
        if self.find_by_name(base).is_none() {
            return base.to_string();
        }
        (2..)
            .map(|n| format!("{base} #{n}"))
            .find(|candidate| self.find_by_name(candidate).is_none())
            .unwrap_or_else(|| base.to_string())
    }

    pub fn get(&self, id: &str) -> RoiResult<&VersionSnapshot> {
        self.find(id).ok_or_else(|| RoiError::not_found(ResourceKind::Version, id))
    }

    pub fn find(&self, id: &str) -> Option<&VersionSnapshot> {
        self.versions.iter().find(|v| v.id() == id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&VersionSnapshot> {
        self.versions.iter().find(|v| v.name() == name)
    }

    pub fn list(&self) -> &[VersionSnapshot] {
        &self.versions
    }

    pub fn summaries(&self) -> Vec<VersionSummary> {
        self.versions.iter().map(VersionSnapshot::summary).collect()
    }

    pub fn latest(&self) -> Option<&VersionSnapshot> {
        self.versions.last()
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    /// Change a snapshot's name and description
    pub fn rename(&mut self, id: &str, name: &str, description: Option<String>) -> RoiResult<&VersionSnapshot> {
        let name = normalize_name(name)?;
        if self.find_by_name(&name).is_some_and(|other| other.id() != id) {
            return Err(RoiError::conflict(format!("a version named '{name}' already exists")));
        }

        let snapshot = self
            .versions
            .iter_mut()
            .find(|v| v.id() == id)
            .ok_or_else(|| RoiError::not_found(ResourceKind::Version, id))?;
        snapshot.rename(name, description);
        Ok(snapshot)
    }

    pub fn delete(&mut self, id: &str) -> RoiResult<VersionSnapshot> {
        let position = self.versions.iter().position(|v| v.id() == id).ok_or_else(|| RoiError::not_found(ResourceKind::Version, id))?;
        Ok(self.versions.remove(position))
    }

    /// Resolve a version id to a comparison side; `"current"` selects `live`
    pub fn resolve<'a>(&'a self, id: &str, live: &'a [Section]) -> RoiResult<Comparand<'a>> {
        if id == CURRENT_VERSION_ID {
            return Ok(Comparand::Live(live));
        }
        self.get(id).map(Comparand::Snapshot)
    }

    /// Drop the oldest snapshots until at most `max` remain
    pub fn prune_to(&mut self, max: usize) -> Vec<VersionSnapshot> {
        if self.versions.len() <= max {
            return Vec::new();
        }
        let excess = self.versions.len() - max;
        let pruned: Vec<_> = self.versions.drain(..excess).collect();
        debug!(pruned = pruned.len(), kept = self.versions.len(), "pruned old version snapshots");
        pruned
    }
}

impl TryFrom<Vec<VersionSnapshot>> for VersionHistory {
    type Error = RoiError;

    fn try_from(versions: Vec<VersionSnapshot>) -> Result<Self, Self::Error> {
        Self::from_snapshots(versions)
    }
}

impl From<VersionHistory> for Vec<VersionSnapshot> {
    fn from(history: VersionHistory) -> Self {
        history.versions
    }
}

fn normalize_name(name: &str) -> RoiResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(RoiError::invalid("version name is required"));
    }
    Ok(name.to_string())
}

fn check_not_reserved(id: &str) -> RoiResult<()> {
    if id == CURRENT_VERSION_ID {
        return Err(RoiError::invalid(format!("'{CURRENT_VERSION_ID}' is reserved for the live report state")));
    }
    Ok(())
}
