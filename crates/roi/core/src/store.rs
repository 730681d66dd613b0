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

//! Report persistence contract
//!
//! `save_report` is a compare-and-swap on [`Report::revision`]: the stored revision must
//! equal the incoming one, and a successful save bumps it. A stale write surfaces as
//! `Conflict`; retrying is the caller's business.

use crate::error::{ResourceKind, RoiError, RoiResult};
use crate::report::Report;
use crate::template::Template;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::debug;

/// Report listing filter; unset fields match everything
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_public: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_after: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_before: Option<DateTime<Utc>>,
}

impl ReportFilter {
    pub fn owned_by(owner_id: impl Into<String>) -> Self {
        Self {
            owner_id: Some(owner_id.into()),
            ..Default::default()
        }
    }

    pub fn matches(&self, report: &Report) -> bool {
        self.owner_id.as_ref().is_none_or(|owner| *owner == report.owner_id)
            && self.ids.as_ref().is_none_or(|ids| ids.iter().any(|id| *id == report.id))
            && self.template_id.as_ref().is_none_or(|template| report.template_id.as_ref() == Some(template))
            && self.is_public.is_none_or(|public| public == report.is_public)
            && self.created_after.is_none_or(|after| report.created_at >= after)
            && self.created_before.is_none_or(|before| report.created_at < before)
    }
}

#[async_trait]
pub trait ReportRepository: Send + Sync {
    async fn load_report(&self, id: &str) -> RoiResult<Report>;

    /// Store `report` if its revision is current; returns the new revision
    async fn save_report(&self, report: &Report) -> RoiResult<u64>;

    async fn load_template(&self, id: &str) -> RoiResult<Template>;

    async fn save_template(&self, template: &Template) -> RoiResult<()>;

    async fn list_reports(&self, filter: &ReportFilter) -> RoiResult<Vec<Report>>;
}

/// Process-local repository backed by hash maps
#[derive(Default)]
pub struct InMemoryRepository {
    reports: RwLock<HashMap<String, Report>>,
    templates: RwLock<HashMap<String, Template>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a report without a revision check
    pub async fn insert_report(&self, report: Report) {
        self.reports.write().await.insert(report.id.clone(), report);
    }

    pub async fn report_count(&self) -> usize {
        self.reports.read().await.len()
    }
}

#[async_trait]
impl ReportRepository for InMemoryRepository {
    async fn load_report(&self, id: &str) -> RoiResult<Report> {
        self.reports.read().await.get(id).cloned().ok_or_else(|| RoiError::not_found(ResourceKind::Report, id))
    }

    async fn save_report(&self, report: &Report) -> RoiResult<u64> {
        let mut reports = self.reports.write().await;
        let stored_revision = reports.get(&report.id).map(|stored| stored.revision).unwrap_or(0);
        if stored_revision != report.revision {
            return Err(RoiError::conflict(format!(
                "report '{}' was modified concurrently (expected revision {}, found {})",
                report.id, report.revision, stored_revision
            )));
        }

        let mut saved = report.clone();
        saved.revision += 1;
        let revision = saved.revision;
        reports.insert(saved.id.clone(), saved);
        debug!(report_id = %report.id, revision, "report saved");
        Ok(revision)
    }

    async fn load_template(&self, id: &str) -> RoiResult<Template> {
        self.templates.read().await.get(id).cloned().ok_or_else(|| RoiError::not_found(ResourceKind::Template, id))
    }

    async fn save_template(&self, template: &Template) -> RoiResult<()> {
        template.validate()?;
        self.templates.write().await.insert(template.id.clone(), template.clone());
        Ok(())
    }

    async fn list_reports(&self, filter: &ReportFilter) -> RoiResult<Vec<Report>> {
        let reports = self.reports.read().await;
        let mut matched: Vec<Report> = reports.values().filter(|report| filter.matches(report)).cloned().collect();
        matched.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(matched)
    }
}
