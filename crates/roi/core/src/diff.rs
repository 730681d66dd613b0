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

//! Version Difference Implementation
//!
//! Computes which sections were added, removed or modified between two versions of
//! a report. Either side may be a stored snapshot or the live section list.
//!
//! # Algorithm
//!
//! - Sections are matched by id.
//! - Ids only on the target side are *added*, ids only on the source side are *removed*.
//!   Both lists carry id, title and type only, keeping the result small.
//! - Sections on both sides are compared field by field: `title` and `content` by string
//!   equality, `data` and `metadata` key by key with [`deep_equal_opt`]. Unchanged keys are
//!   not reported, and a `null` key counts as missing.
//!
//! Added entries follow the target's section order; removed and modified entries follow
//! the source's order.

use crate::equality::deep_equal_opt;
use crate::section::{Section, SectionType, index_by_id};
use crate::snapshot::Comparand;
use crate::value::{Map, Value};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Identity of a section that appears on only one side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionRef {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub section_type: SectionType,
}

impl From<&Section> for SectionRef {
    fn from(section: &Section) -> Self {
        Self {
            id: section.id.clone(),
            title: section.title.clone(),
            section_type: section.section_type,
        }
    }
}

/// Before/after pair for a changed field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldChange<T> {
    pub from: T,
    pub to: T,
}

/// Key-level changes inside a `data` or `metadata` map
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapChanges {
    pub added: BTreeMap<String, Value>,
    pub removed: BTreeMap<String, Value>,
    pub modified: BTreeMap<String, FieldChange<Value>>,
}

impl MapChanges {
    /// Compare two optional maps; an absent map behaves as an empty one
    ///
    /// A key holding `null` on one side and missing on the other is not a change.
    pub fn compute(from: Option<&Map>, to: Option<&Map>) -> Self {
        let empty = Map::new();
        let from = from.unwrap_or(&empty);
        let to = to.unwrap_or(&empty);
        let mut changes = MapChanges::default();

        let keys: BTreeSet<&String> = from.keys().chain(to.keys()).collect();
        for key in keys {
            let (old, new) = (from.get(key), to.get(key));
            if deep_equal_opt(old, new) {
                continue;
            }
            match (old, new) {
                (Some(old), Some(new)) => {
                    changes.modified.insert(key.clone(), FieldChange { from: old.clone(), to: new.clone() });
                }
                (Some(old), None) => {
                    changes.removed.insert(key.clone(), old.clone());
                }
                (None, Some(new)) => {
                    changes.added.insert(key.clone(), new.clone());
                }
                (None, None) => {}
            }
        }

        changes
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }

    pub fn change_count(&self) -> usize {
        self.added.len() + self.removed.len() + self.modified.len()
    }

    fn reversed(&self) -> Self {
        Self {
            added: self.removed.clone(),
            removed: self.added.clone(),
            modified: self
                .modified
                .iter()
                .map(|(key, change)| (key.clone(), FieldChange { from: change.to.clone(), to: change.from.clone() }))
                .collect(),
        }
    }
}

/// Field-level differences between two versions of one section
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionDifferences {
    pub has_changes: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_changed: Option<FieldChange<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_changed: Option<FieldChange<Option<String>>>,
    #[serde(default, skip_serializing_if = "MapChanges::is_empty")]
    pub data_changes: MapChanges,
    #[serde(default, skip_serializing_if = "MapChanges::is_empty")]
    pub metadata_changes: MapChanges,
}

impl SectionDifferences {
    fn reversed(&self) -> Self {
        Self {
            has_changes: self.has_changes,
            title_changed: self.title_changed.as_ref().map(|c| FieldChange { from: c.to.clone(), to: c.from.clone() }),
            content_changed: self.content_changed.as_ref().map(|c| FieldChange { from: c.to.clone(), to: c.from.clone() }),
            data_changes: self.data_changes.reversed(),
            metadata_changes: self.metadata_changes.reversed(),
        }
    }
}

/// A section present on both sides whose fields differ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifiedSection {
    pub id: String,
    pub differences: SectionDifferences,
}

/// Per-kind counters of a diff
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffSummary {
    pub added_count: usize,
    pub removed_count: usize,
    pub modified_count: usize,
    pub unchanged_count: usize,
}

/// Difference between two versions of a report
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffResult {
    pub from_version: String,
    pub to_version: String,
    pub added_sections: Vec<SectionRef>,
    pub removed_sections: Vec<SectionRef>,
    pub modified_sections: Vec<ModifiedSection>,
    pub summary: DiffSummary,
}

impl DiffResult {
    /// True when no section was added, removed or modified
    pub fn is_empty(&self) -> bool {
        self.added_sections.is_empty() && self.removed_sections.is_empty() && self.modified_sections.is_empty()
    }

    /// Number of added, removed and modified sections
    pub fn change_count(&self) -> usize {
        self.added_sections.len() + self.removed_sections.len() + self.modified_sections.len()
    }

    pub fn added_ids(&self) -> Vec<&str> {
        self.added_sections.iter().map(|s| s.id.as_str()).collect()
    }

    pub fn removed_ids(&self) -> Vec<&str> {
        self.removed_sections.iter().map(|s| s.id.as_str()).collect()
    }

    pub fn modified(&self, id: &str) -> Option<&SectionDifferences> {
        self.modified_sections.iter().find(|m| m.id == id).map(|m| &m.differences)
    }

    /// The diff that leads from the target back to the source
    pub fn reversed(&self) -> DiffResult {
        DiffResult {
            from_version: self.to_version.clone(),
            to_version: self.from_version.clone(),
            added_sections: self.removed_sections.clone(),
            removed_sections: self.added_sections.clone(),
            modified_sections: self
                .modified_sections
                .iter()
                .map(|m| ModifiedSection {
                    id: m.id.clone(),
                    differences: m.differences.reversed(),
                })
                .collect(),
            summary: DiffSummary {
                added_count: self.summary.removed_count,
                removed_count: self.summary.added_count,
                ..self.summary
            },
        }
    }
}

/// Computes differences between report versions
pub struct VersionDiffer;

impl VersionDiffer {
    /// Compare `from` against `to`
    pub fn diff(from: Comparand<'_>, to: Comparand<'_>) -> DiffResult {
        let mut result = Self::diff_sections(from.sections(), to.sections());
        result.from_version = from.id().to_string();
        result.to_version = to.id().to_string();
        result
    }

    /// Compare two raw section lists
    pub fn diff_sections(from: &[Section], to: &[Section]) -> DiffResult {
        let from_index = index_by_id(from);
        let to_index = index_by_id(to);
        let mut result = DiffResult::default();

        for section in from {
            match to_index.get(section.id.as_str()) {
                None => result.removed_sections.push(SectionRef::from(section)),
                Some(other) => {
                    let differences = Self::compare_sections(section, other);
                    if differences.has_changes {
                        result.modified_sections.push(ModifiedSection {
                            id: section.id.clone(),
                            differences,
                        });
                    } else {
                        result.summary.unchanged_count += 1;
                    }
                }
            }
        }

        for section in to {
            if !from_index.contains_key(section.id.as_str()) {
                result.added_sections.push(SectionRef::from(section));
            }
        }

        result.summary.added_count = result.added_sections.len();
        result.summary.removed_count = result.removed_sections.len();
        result.summary.modified_count = result.modified_sections.len();
        result
    }

    /// Field-level comparison of two versions of the same section
    pub fn compare_sections(from: &Section, to: &Section) -> SectionDifferences {
        let title_changed = (from.title != to.title).then(|| FieldChange {
            from: from.title.clone(),
            to: to.title.clone(),
        });
        let content_changed = (from.content != to.content).then(|| FieldChange {
            from: from.content.clone(),
            to: to.content.clone(),
        });
        let data_changes = MapChanges::compute(from.data.as_ref(), to.data.as_ref());
        let metadata_changes = MapChanges::compute(from.metadata.as_ref(), to.metadata.as_ref());

        let has_changes = title_changed.is_some() || content_changed.is_some() || !data_changes.is_empty() || !metadata_changes.is_empty();

        SectionDifferences {
            has_changes,
            title_changed,
            content_changed,
            data_changes,
            metadata_changes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::VersionSnapshot;
    use crate::value::map_from_json;
    use chrono::Utc;
    use serde_json::json;

    fn base_sections() -> Vec<Section> {
        vec![
            Section::new("intro", "Introduction", SectionType::Text).with_content("Hello"),
            Section::new("roi", "ROI", SectionType::Roi).with_data(map_from_json(json!({"totalInvestment": 100, "totalReturn": 150, "notes": ["a", "b"]}))),
            Section::new("ops", "Operations", SectionType::Operational).with_data(map_from_json(json!({"laborEfficiency": 65}))),
        ]
    }

    #[test]
    fn test_snapshot_against_itself_is_empty() {
        let snapshot = VersionSnapshot::capture("v1", None, &base_sections(), "u1", Utc::now());
        let diff = VersionDiffer::diff(Comparand::Snapshot(&snapshot), Comparand::Snapshot(&snapshot));

        assert!(diff.is_empty());
        assert_eq!(diff.change_count(), 0);
        assert_eq!(
            diff.summary,
            DiffSummary {
                added_count: 0,
                removed_count: 0,
                modified_count: 0,
                unchanged_count: 3,
            }
        );
    }

    #[test]
    fn test_added_and_removed_sections() {
        let from = base_sections();
        let mut to = base_sections();
        to.retain(|s| s.id != "ops");
        to.push(Section::new("chart", "Throughput Chart", SectionType::Chart));

        let diff = VersionDiffer::diff_sections(&from, &to);
        assert_eq!(diff.added_ids(), vec!["chart"]);
        assert_eq!(diff.removed_ids(), vec!["ops"]);
        assert_eq!(diff.removed_sections[0].section_type, SectionType::Operational);
        assert_eq!(diff.summary.unchanged_count, 2);
    }

    #[test]
    fn test_title_and_content_changes() {
        let from = base_sections();
        let mut to = base_sections();
        to[0].title = "Overview".to_string();
        to[0].content = None;

        let diff = VersionDiffer::diff_sections(&from, &to);
        let changes = diff.modified("intro").unwrap();
        assert!(changes.has_changes);
        assert_eq!(changes.title_changed.as_ref().unwrap().to, "Overview");
        assert_eq!(changes.content_changed.as_ref().unwrap().from.as_deref(), Some("Hello"));
        assert!(changes.data_changes.is_empty());
        assert_eq!(diff.summary.modified_count, 1);
    }

    #[test]
    fn test_data_key_classification() {
        let from = base_sections();
        let mut to = base_sections();
        to[1].data = Some(map_from_json(json!({"totalInvestment": 120, "notes": ["a", "b"], "npv": 10})));

        let diff = VersionDiffer::diff_sections(&from, &to);
        let data = &diff.modified("roi").unwrap().data_changes;
        assert_eq!(data.added.keys().collect::<Vec<_>>(), vec!["npv"]);
        assert_eq!(data.removed.keys().collect::<Vec<_>>(), vec!["totalReturn"]);
        assert_eq!(data.modified.keys().collect::<Vec<_>>(), vec!["totalInvestment"]);
        assert_eq!(data.modified["totalInvestment"].from, Value::from(100));
        assert_eq!(data.change_count(), 3);
    }

    #[test]
    fn test_list_reorder_is_a_modification() {
        let from = base_sections();
        let mut to = base_sections();
        to[1].data = Some(map_from_json(json!({"totalInvestment": 100, "totalReturn": 150, "notes": ["b", "a"]})));

        let diff = VersionDiffer::diff_sections(&from, &to);
        assert!(diff.modified("roi").unwrap().data_changes.modified.contains_key("notes"));
    }

    #[test]
    fn test_metadata_compared_independently() {
        let from = base_sections();
        let mut to = base_sections();
        to[2].stamp_metadata("reviewed", true);

        let diff = VersionDiffer::diff_sections(&from, &to);
        let changes = diff.modified("ops").unwrap();
        assert!(changes.data_changes.is_empty());
        assert_eq!(changes.metadata_changes.added.get("reviewed"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_absent_data_equals_empty_data() {
        let from = vec![Section::new("a", "A", SectionType::Text)];
        let to = vec![Section::new("a", "A", SectionType::Text).with_data(Map::new())];
        assert!(VersionDiffer::diff_sections(&from, &to).is_empty());
    }

    #[test]
    fn test_null_key_equals_missing_key() {
        let from = vec![Section::new("a", "A", SectionType::Text).with_data(map_from_json(json!({"k": null, "x": 1})))];
        let to = vec![Section::new("a", "A", SectionType::Text).with_data(map_from_json(json!({"x": 1})))];
        assert!(VersionDiffer::diff_sections(&from, &to).is_empty());
        assert!(VersionDiffer::diff_sections(&to, &from).is_empty());

        let no_data = vec![Section::new("a", "A", SectionType::Text)];
        let null_only = vec![Section::new("a", "A", SectionType::Text).with_data(map_from_json(json!({"k": null})))];
        let diff = VersionDiffer::diff_sections(&null_only, &no_data);
        assert!(diff.is_empty());
        assert_eq!(diff.summary.unchanged_count, 1);
    }

    #[test]
    fn test_null_to_value_is_a_modification() {
        let from = vec![Section::new("a", "A", SectionType::Text).with_data(map_from_json(json!({"k": null})))];
        let to = vec![Section::new("a", "A", SectionType::Text).with_data(map_from_json(json!({"k": 2})))];
        let diff = VersionDiffer::diff_sections(&from, &to);
        let data = &diff.modified("a").unwrap().data_changes;
        assert_eq!(data.modified.keys().collect::<Vec<_>>(), vec!["k"]);
        assert!(data.added.is_empty());
    }

    #[test]
    fn test_live_comparison_uses_current_id() {
        let snapshot = VersionSnapshot::capture("v1", None, &base_sections(), "u1", Utc::now());
        let mut live = base_sections();
        live[0].content = Some("Changed".to_string());

        let diff = VersionDiffer::diff(Comparand::Snapshot(&snapshot), Comparand::Live(&live));
        assert_eq!(diff.from_version, snapshot.id());
        assert_eq!(diff.to_version, "current");
        assert_eq!(diff.summary.modified_count, 1);
    }

    #[test]
    fn test_reverse_swaps_sides() {
        let from = base_sections();
        let mut to = base_sections();
        to.remove(0);
        to[0].title = "Returns".to_string();

        let forward = VersionDiffer::diff_sections(&from, &to);
        let backward = VersionDiffer::diff_sections(&to, &from);
        let reversed = forward.reversed();

        assert_eq!(reversed.added_ids(), backward.added_ids());
        assert_eq!(reversed.removed_ids(), backward.removed_ids());
        assert_eq!(reversed.modified("roi").unwrap().title_changed, backward.modified("roi").unwrap().title_changed);
        assert_eq!(reversed.summary, backward.summary);
    }

    #[test]
    fn test_wire_shape() {
        let from = base_sections();
        let mut to = base_sections();
        to[0].title = "Overview".to_string();
        let wire = serde_json::to_value(VersionDiffer::diff_sections(&from, &to)).unwrap();

        assert_eq!(wire["summary"]["modifiedCount"], 1);
        assert_eq!(wire["modifiedSections"][0]["differences"]["titleChanged"]["from"], "Introduction");
        assert!(wire["modifiedSections"][0]["differences"].get("dataChanges").is_none());
    }
}
