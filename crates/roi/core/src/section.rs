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

//! Report Sections
//!
//! A report (or template) is an ordered list of sections. Section ids are unique
//! within one list, never globally: two reports may both hold a section `"summary"`.

use crate::error::{RoiError, RoiResult};
use crate::value::{Map, Value, validate_map};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

/// Declared type of a section
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionType {
    Text,
    Chart,
    Table,
    Recommendation,
    Roi,
    Operational,
    Financial,
}

impl SectionType {
    pub const ALL: [SectionType; 7] = [
        SectionType::Text,
        SectionType::Chart,
        SectionType::Table,
        SectionType::Recommendation,
        SectionType::Roi,
        SectionType::Operational,
        SectionType::Financial,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SectionType::Text => "text",
            SectionType::Chart => "chart",
            SectionType::Table => "table",
            SectionType::Recommendation => "recommendation",
            SectionType::Roi => "roi",
            SectionType::Operational => "operational",
            SectionType::Financial => "financial",
        }
    }
}

impl fmt::Display for SectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SectionType {
    type Err = RoiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        SectionType::ALL
            .into_iter()
            .find(|t| t.as_str() == wanted)
            .ok_or_else(|| RoiError::invalid(format!("unknown section type '{s}'")))
    }
}

/// One content block of a report or template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub section_type: SectionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Map>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map>,
    #[serde(default)]
    pub order: i64,
}

impl Section {
    pub fn new(id: impl Into<String>, title: impl Into<String>, section_type: SectionType) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            section_type,
            content: None,
            data: None,
            metadata: None,
            order: 0,
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = Some(content.into());
        self
    }

    pub fn with_data(mut self, data: Map) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_metadata(mut self, metadata: Map) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_order(mut self, order: i64) -> Self {
        self.order = order;
        self
    }

    pub fn data_field(&self, key: &str) -> Option<&Value> {
        self.data.as_ref().and_then(|data| data.get(key))
    }

    pub fn metadata_field(&self, key: &str) -> Option<&Value> {
        self.metadata.as_ref().and_then(|metadata| metadata.get(key))
    }

    /// Set one metadata entry, creating the map if needed
    pub fn stamp_metadata(&mut self, key: &str, value: impl Into<Value>) {
        self.metadata.get_or_insert_with(Map::new).insert(key.to_string(), value.into());
    }

    pub fn validate(&self) -> RoiResult<()> {
        if self.id.trim().is_empty() {
            return Err(RoiError::invalid("section id must not be empty"));
        }
        validate_map(self.data.as_ref(), &format!("sections[{}].data", self.id))?;
        validate_map(self.metadata.as_ref(), &format!("sections[{}].metadata", self.id))
    }
}

/// Ordered section list with unique ids
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Section>", into = "Vec<Section>")]
pub struct SectionList {
    sections: Vec<Section>,
}

impl SectionList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a list, rejecting duplicate ids and malformed values
    pub fn from_sections(sections: Vec<Section>) -> RoiResult<Self> {
        let mut seen = HashSet::with_capacity(sections.len());
        for section in &sections {
            section.validate()?;
            if !seen.insert(section.id.as_str()) {
                return Err(RoiError::invalid(format!("duplicate section id '{}'", section.id)));
            }
        }
        Ok(Self { sections })
    }

    pub fn as_slice(&self) -> &[Section] {
        &self.sections
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Section> {
        self.sections.iter()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn index_by_id(&self) -> HashMap<&str, &Section> {
        index_by_id(&self.sections)
    }

    pub fn max_order(&self) -> Option<i64> {
        max_order(&self.sections)
    }

    /// Sections sorted by their `order` field, ties kept in list order
    pub fn in_display_order(&self) -> Vec<&Section> {
        let mut ordered: Vec<&Section> = self.sections.iter().collect();
        ordered.sort_by_key(|s| s.order);
        ordered
    }

    pub fn find_by_type_or_title_hint(&self, section_type: SectionType, hint: &str) -> Option<&Section> {
        find_section_by_type_or_title_hint(&self.sections, section_type, hint)
    }

    pub fn into_vec(self) -> Vec<Section> {
        self.sections
    }
}

impl TryFrom<Vec<Section>> for SectionList {
    type Error = RoiError;

    fn try_from(sections: Vec<Section>) -> Result<Self, Self::Error> {
        Self::from_sections(sections)
    }
}

impl From<SectionList> for Vec<Section> {
    fn from(list: SectionList) -> Self {
        list.sections
    }
}

impl AsRef<[Section]> for SectionList {
    fn as_ref(&self) -> &[Section] {
        &self.sections
    }
}

impl<'a> IntoIterator for &'a SectionList {
    type Item = &'a Section;
    type IntoIter = std::slice::Iter<'a, Section>;

    fn into_iter(self) -> Self::IntoIter {
        self.sections.iter()
    }
}

pub fn index_by_id(sections: &[Section]) -> HashMap<&str, &Section> {
    sections.iter().map(|s| (s.id.as_str(), s)).collect()
}

pub fn max_order(sections: &[Section]) -> Option<i64> {
    sections.iter().map(|s| s.order).max()
}

/// Locate the section a metric category reads from
///
/// Lookup order:
/// 1. the first section whose declared type is `section_type`;
/// 2. otherwise the first section whose title contains `hint`, case-insensitively.
///
/// Later sections of the same type are never consulted.
pub fn find_section_by_type_or_title_hint<'a>(sections: &'a [Section], section_type: SectionType, hint: &str) -> Option<&'a Section> {
    sections.iter().find(|s| s.section_type == section_type).or_else(|| {
        let hint = hint.to_lowercase();
        sections.iter().find(|s| s.title.to_lowercase().contains(&hint))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::map_from_json;
    use serde_json::json;

    fn sample() -> Vec<Section> {
        vec![
            Section::new("a", "Executive Summary", SectionType::Text).with_order(0),
            Section::new("b", "ROI Overview", SectionType::Table).with_order(2),
            Section::new("c", "Returns", SectionType::Roi).with_order(1),
        ]
    }

    #[test]
    fn test_section_type_parsing() {
        assert_eq!("roi".parse::<SectionType>().unwrap(), SectionType::Roi);
        assert_eq!(" Financial ".parse::<SectionType>().unwrap(), SectionType::Financial);
        assert!("pie".parse::<SectionType>().is_err());
    }

    #[test]
    fn test_section_wire_shape() {
        let section = Section::new("s1", "Costs", SectionType::Financial).with_data(map_from_json(json!({"implementationCost": 10})));
        let wire = serde_json::to_value(&section).unwrap();
        assert_eq!(wire, json!({"id": "s1", "title": "Costs", "type": "financial", "data": {"implementationCost": 10}, "order": 0}));

        let back: Section = serde_json::from_value(wire).unwrap();
        assert_eq!(back, section);
    }

    #[test]
    fn test_list_rejects_duplicate_ids() {
        let mut sections = sample();
        sections.push(Section::new("a", "Again", SectionType::Chart));
        let err = SectionList::from_sections(sections).unwrap_err();
        assert_eq!(err, RoiError::invalid("duplicate section id 'a'"));
    }

    #[test]
    fn test_list_deserialization_validates() {
        let raw = json!([{"id": "x", "title": "t", "type": "text"}, {"id": "x", "title": "u", "type": "text"}]);
        assert!(serde_json::from_value::<SectionList>(raw).is_err());
    }

    #[test]
    fn test_list_lookups() {
        let list = SectionList::from_sections(sample()).unwrap();
        assert_eq!(list.len(), 3);
        assert!(list.contains("b"));
        assert_eq!(list.max_order(), Some(2));
        let order: Vec<_> = list.in_display_order().iter().map(|s| s.id.as_str()).collect();
        assert_eq!(order, vec!["a", "c", "b"]);
        assert_eq!(list.index_by_id().len(), 3);
    }

    #[test]
    fn test_type_lookup_wins_over_title_hint() {
        let list = SectionList::from_sections(sample()).unwrap();
        let found = list.find_by_type_or_title_hint(SectionType::Roi, "roi").unwrap();
        assert_eq!(found.id, "c");
    }

    #[test]
    fn test_title_hint_fallback_is_case_insensitive() {
        let sections = vec![
            Section::new("a", "Summary", SectionType::Text),
            Section::new("b", "Warehouse roi figures", SectionType::Table),
        ];
        let found = find_section_by_type_or_title_hint(&sections, SectionType::Roi, "ROI").unwrap();
        assert_eq!(found.id, "b");
        assert!(find_section_by_type_or_title_hint(&sections, SectionType::Financial, "financial").is_none());
    }

    #[test]
    fn test_stamp_metadata_creates_map() {
        let mut section = Section::new("a", "t", SectionType::Text);
        section.stamp_metadata("lastModifiedBy", "u1");
        assert_eq!(section.metadata_field("lastModifiedBy"), Some(&Value::from("u1")));
    }

    #[test]
    fn test_validate_rejects_blank_id() {
        assert!(Section::new(" ", "t", SectionType::Text).validate().is_err());
    }
}
