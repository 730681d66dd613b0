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

//! Reports
//!
//! A report owns its live sections and its version history. Operations here are pure
//! state transitions on an in-memory report; persisting the result is up to the caller.

use crate::access::ReportAccessInfo;
use crate::diff::{DiffResult, VersionDiffer};
use crate::error::RoiResult;
use crate::history::{HistoryConfig, VersionHistory};
use crate::metrics::{EngagementMetrics, MetricSelection, MetricsAggregator, ReportMetrics};
use crate::section::{Section, SectionList};
use crate::snapshot::{VersionSnapshot, VersionSummary};
use crate::template::{ApplyContext, MergeStrategy, Template, TemplateMerger};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Reader activity counters kept on the report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementCounters {
    #[serde(default)]
    pub view_count: u64,
    #[serde(default)]
    pub download_count: u64,
    #[serde(default)]
    pub comment_count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: String,
    pub title: String,
    pub owner_id: String,
    #[serde(default)]
    pub is_public: bool,
    #[serde(default)]
    pub shared_with: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    #[serde(default)]
    sections: SectionList,
    #[serde(default)]
    versions: VersionHistory,
    #[serde(default)]
    pub engagement: EngagementCounters,
    /// Bumped by the repository on every successful save
    #[serde(default)]
    pub revision: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// How a restore treats the live sections it overwrites
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestoreOptions {
    pub auto_backup: bool,
    pub actor: String,
}

impl RestoreOptions {
    pub fn new(actor: impl Into<String>) -> Self {
        Self { auto_backup: true, actor: actor.into() }
    }

    pub fn without_backup(mut self) -> Self {
        self.auto_backup = false;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreOutcome {
    pub restored: VersionSummary,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub backup: Option<VersionSummary>,
}

impl Report {
    pub fn new(id: impl Into<String>, title: impl Into<String>, owner_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            owner_id: owner_id.into(),
            is_public: false,
            shared_with: Vec::new(),
            template_id: None,
            sections: SectionList::new(),
            versions: VersionHistory::new(),
            engagement: EngagementCounters::default(),
            revision: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_sections(mut self, sections: Vec<Section>) -> RoiResult<Self> {
        self.sections = SectionList::from_sections(sections)?;
        Ok(self)
    }

    pub fn sections(&self) -> &[Section] {
        self.sections.as_slice()
    }

    pub fn section_list(&self) -> &SectionList {
        &self.sections
    }

    pub fn versions(&self) -> &VersionHistory {
        &self.versions
    }

    pub fn access_info(&self) -> ReportAccessInfo<'_> {
        ReportAccessInfo {
            owner_id: &self.owner_id,
            is_public: self.is_public,
            shared_with: &self.shared_with,
        }
    }

    /// Swap in a new live section list after checking ids and values
    pub fn replace_sections(&mut self, sections: Vec<Section>, now: DateTime<Utc>) -> RoiResult<()> {
        self.sections = SectionList::from_sections(sections)?;
        self.updated_at = now;
        Ok(())
    }

    /// Capture the live sections as a named version
    pub fn create_version(&mut self, name: &str, description: Option<String>, author: &str, now: DateTime<Utc>, config: &HistoryConfig) -> RoiResult<&VersionSnapshot> {
        self.updated_at = now;
        self.versions.create(name, description, self.sections.as_slice(), author, now, config)
    }

    /// Replace the live sections with a stored version's sections
    ///
    /// With `auto_backup` the current live sections are captured first under
    /// `Auto-backup before restoring '<name>'`. The restored version is copied out
    /// before the backup is taken so retention pruning cannot drop it mid-restore.
    pub fn restore_version(&mut self, version_id: &str, options: &RestoreOptions, now: DateTime<Utc>, config: &HistoryConfig) -> RoiResult<RestoreOutcome> {
        let target = self.versions.get(version_id)?.clone();
        let sections = SectionList::from_sections(target.sections().to_vec())?;

        let backup = if options.auto_backup {
            let name = format!("Auto-backup before restoring '{}'", target.name());
            let description = Some(format!("Automatic backup taken before restoring version {}", target.id()));
            let snapshot = self.versions.create_with_unique_name(&name, description, self.sections.as_slice(), &options.actor, now, config)?;
            Some(snapshot.summary())
        } else {
            None
        };

        self.sections = sections;
        self.updated_at = now;
        info!(report_id = %self.id, version_id = %target.id(), backup = backup.is_some(), "restored report version");

        Ok(RestoreOutcome { restored: target.summary(), backup })
    }

    pub fn rename_version(&mut self, version_id: &str, name: &str, description: Option<String>, now: DateTime<Utc>) -> RoiResult<&VersionSnapshot> {
        self.updated_at = now;
        self.versions.rename(version_id, name, description)
    }

    pub fn delete_version(&mut self, version_id: &str, now: DateTime<Utc>) -> RoiResult<VersionSnapshot> {
        let removed = self.versions.delete(version_id)?;
        self.updated_at = now;
        Ok(removed)
    }

    /// Diff two versions; either id may be `"current"` for the live sections
    pub fn compare_versions(&self, from_id: &str, to_id: &str) -> RoiResult<DiffResult> {
        let from = self.versions.resolve(from_id, self.sections.as_slice())?;
        let to = self.versions.resolve(to_id, self.sections.as_slice())?;
        Ok(VersionDiffer::diff(from, to))
    }

    /// Fold `template` into the live sections and remember which template was used
    pub fn apply_template(&mut self, template: &Template, strategy: MergeStrategy, context: &ApplyContext) -> RoiResult<()> {
        let merged = TemplateMerger::new(context.clone()).apply(template, self.sections.as_slice(), strategy);
        self.replace_sections(merged, context.now)?;
        self.template_id = Some(template.id.clone());
        debug!(report_id = %self.id, template_id = %template.id, sections = self.sections.len(), "template applied to report");
        Ok(())
    }

    pub fn metrics(&self, selection: &MetricSelection) -> ReportMetrics {
        MetricsAggregator::report_metrics(self.sections.as_slice(), &self.engagement(), selection)
    }

    pub fn engagement(&self) -> EngagementMetrics {
        EngagementMetrics {
            view_count: self.engagement.view_count as f64,
            download_count: self.engagement.download_count as f64,
            comment_count: self.engagement.comment_count as f64,
            share_count: self.shared_with.len() as f64,
            version_count: self.versions.len() as f64,
        }
    }

    pub fn record_view(&mut self) {
        self.engagement.view_count += 1;
    }

    pub fn record_download(&mut self) {
        self.engagement.download_count += 1;
    }

    pub fn record_comment(&mut self, now: DateTime<Utc>) {
        self.engagement.comment_count += 1;
        self.updated_at = now;
    }

    /// Share with `user_id`; returns false when already shared or the user is the owner
    pub fn share_with(&mut self, user_id: &str, now: DateTime<Utc>) -> bool {
        if user_id == self.owner_id || self.shared_with.iter().any(|u| u == user_id) {
            return false;
        }
        self.shared_with.push(user_id.to_string());
        self.updated_at = now;
        true
    }
}
