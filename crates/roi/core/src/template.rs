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

//! Report Templates and Template Merging
//!
//! A template is an ordered list of section templates. Applying it to a report
//! produces a new section list under one of three strategies:
//!
//! - `replace`: drop the current sections, instantiate every template section;
//! - `append`: keep the current sections, add instantiated template sections after them;
//! - `merge`: fold each template section into the first current section of the same
//!   type, appending the ones that have no match.
//!
//! Inputs are never mutated. Instantiated sections receive fresh UUID ids.

use crate::error::{RoiError, RoiResult};
use crate::section::{Section, SectionType, max_order};
use crate::value::{Map, validate_map};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;
use uuid::Uuid;

/// Section blueprint held by a template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SectionTemplate {
    pub title: String,
    #[serde(rename = "type")]
    pub section_type: SectionType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Map>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map>,
}

impl SectionTemplate {
    pub fn new(title: impl Into<String>, section_type: SectionType) -> Self {
        Self {
            title: title.into(),
            section_type,
            content: None,
            data: None,
            metadata: None,
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
}

/// Reusable report layout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub sections: Vec<SectionTemplate>,
    #[serde(default)]
    pub created_by: String,
}

impl Template {
    pub fn new(id: impl Into<String>, name: impl Into<String>, sections: Vec<SectionTemplate>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            category: None,
            sections,
            created_by: String::new(),
        }
    }

    pub fn validate(&self) -> RoiResult<()> {
        if self.id.trim().is_empty() {
            return Err(RoiError::invalid("template id must not be empty"));
        }
        for (i, section) in self.sections.iter().enumerate() {
            validate_map(section.data.as_ref(), &format!("template.sections[{i}].data"))?;
            validate_map(section.metadata.as_ref(), &format!("template.sections[{i}].metadata"))?;
        }
        Ok(())
    }
}

/// How template sections combine with a report's sections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeStrategy {
    Replace,
    Append,
    Merge,
}

impl MergeStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            MergeStrategy::Replace => "replace",
            MergeStrategy::Append => "append",
            MergeStrategy::Merge => "merge",
        }
    }
}

impl fmt::Display for MergeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MergeStrategy {
    type Err = RoiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "replace" => Ok(MergeStrategy::Replace),
            "append" => Ok(MergeStrategy::Append),
            "merge" => Ok(MergeStrategy::Merge),
            other => Err(RoiError::invalid(format!("unknown merge strategy '{other}', expected replace, append or merge"))),
        }
    }
}

/// Who applies a template and when
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyContext {
    pub actor: String,
    pub now: DateTime<Utc>,
}

impl ApplyContext {
    pub fn new(actor: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self { actor: actor.into(), now }
    }
}

/// Applies templates onto section lists
pub struct TemplateMerger {
    context: ApplyContext,
}

impl TemplateMerger {
    pub fn new(context: ApplyContext) -> Self {
        Self { context }
    }

    /// Parse `strategy` and apply; an unknown name fails before any work is done
    pub fn apply_named(&self, template: &Template, current: &[Section], strategy: &str) -> RoiResult<Vec<Section>> {
        let strategy = strategy.parse::<MergeStrategy>()?;
        Ok(self.apply(template, current, strategy))
    }

    pub fn apply(&self, template: &Template, current: &[Section], strategy: MergeStrategy) -> Vec<Section> {
        debug!(template_id = %template.id, %strategy, current = current.len(), incoming = template.sections.len(), "applying template");
        match strategy {
            MergeStrategy::Replace => self.replace(template),
            MergeStrategy::Append => self.append(template, current),
            MergeStrategy::Merge => self.merge(template, current),
        }
    }

    fn replace(&self, template: &Template) -> Vec<Section> {
        template.sections.iter().enumerate().map(|(i, blueprint)| self.instantiate(template, blueprint, i as i64)).collect()
    }

    fn append(&self, template: &Template, current: &[Section]) -> Vec<Section> {
        let start = next_order(current);
        let mut result = current.to_vec();
        result.extend(template.sections.iter().enumerate().map(|(i, blueprint)| self.instantiate(template, blueprint, start + i as i64)));
        result
    }

    fn merge(&self, template: &Template, current: &[Section]) -> Vec<Section> {
        let mut result = current.to_vec();

        let mut by_type: HashMap<SectionType, usize> = HashMap::new();
        for (position, section) in result.iter().enumerate() {
            by_type.entry(section.section_type).or_insert(position);
        }

        let mut next = next_order(current);
        let mut appended = Vec::new();
        for blueprint in &template.sections {
            match by_type.get(&blueprint.section_type) {
                Some(&position) => self.merge_into(&mut result[position], blueprint),
                None => {
                    appended.push(self.instantiate(template, blueprint, next));
                    next += 1;
                }
            }
        }

        result.extend(appended);
        result
    }

    /// Template title and content win when non-empty; data is a shallow union with template keys winning
    fn merge_into(&self, section: &mut Section, blueprint: &SectionTemplate) {
        if !blueprint.title.is_empty() {
            section.title = blueprint.title.clone();
        }
        if let Some(content) = blueprint.content.as_ref().filter(|c| !c.is_empty()) {
            section.content = Some(content.clone());
        }
        if let Some(incoming) = &blueprint.data {
            let data = section.data.get_or_insert_with(Map::new);
            for (key, value) in incoming {
                data.insert(key.clone(), value.clone());
            }
        }
        section.stamp_metadata("lastModified", self.context.now.to_rfc3339());
        section.stamp_metadata("lastModifiedBy", self.context.actor.as_str());
    }

    fn instantiate(&self, template: &Template, blueprint: &SectionTemplate, order: i64) -> Section {
        let mut section = Section {
            id: Uuid::new_v4().to_string(),
            title: blueprint.title.clone(),
            section_type: blueprint.section_type,
            content: blueprint.content.clone(),
            data: blueprint.data.clone(),
            metadata: blueprint.metadata.clone(),
            order,
        };
        section.stamp_metadata("createdAt", self.context.now.to_rfc3339());
        section.stamp_metadata("createdBy", self.context.actor.as_str());
        section.stamp_metadata("templateId", template.id.as_str());
        section
    }
}

/// First free order slot after the current sections; 0 for an empty list
fn next_order(sections: &[Section]) -> i64 {
    max_order(sections).map_or(0, |max| max + 1)
}
