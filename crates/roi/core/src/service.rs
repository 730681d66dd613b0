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

//! Report service
//!
//! Orchestrates one read-modify-write per call: load the report, authorize the caller,
//! run the pure operation, save through the repository's revision check, then record
//! an audit event and notify the owner. Audit and notification failures are logged
//! and do not undo the saved change.

use crate::access::{Access, Authorizer, DefaultAuthorizer, Principal};
use crate::config::ServiceConfig;
use crate::diff::DiffResult;
use crate::document::{DocumentFormat, ReportDocument};
use crate::error::{RoiError, RoiResult};
use crate::events::{AuditAction, AuditEvent, AuditSink, Notifier, TracingAuditSink, TracingNotifier};
use crate::metrics::{AggregateMetrics, EngagementMetrics, MetricSelection, MetricsAggregator, ReportMetrics};
use crate::recommendation::{Recommendation, RecommendationEngine};
use crate::report::{Report, RestoreOptions, RestoreOutcome};
use crate::section::Section;
use crate::snapshot::VersionSummary;
use crate::store::{ReportFilter, ReportRepository};
use crate::template::{ApplyContext, MergeStrategy};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub struct ReportService {
    repository: Arc<dyn ReportRepository>,
    authorizer: Arc<dyn Authorizer>,
    audit: Arc<dyn AuditSink>,
    notifier: Arc<dyn Notifier>,
    engine: RecommendationEngine,
    config: ServiceConfig,
}

impl ReportService {
    /// Service with the default authorizer, tracing-backed audit and notification, and the default rule set
    pub fn new(repository: Arc<dyn ReportRepository>, config: ServiceConfig) -> Self {
        Self {
            repository,
            authorizer: Arc::new(DefaultAuthorizer),
            audit: Arc::new(TracingAuditSink),
            notifier: Arc::new(TracingNotifier),
            engine: RecommendationEngine::with_default_rules(),
            config,
        }
    }

    pub fn with_authorizer(mut self, authorizer: Arc<dyn Authorizer>) -> Self {
        self.authorizer = authorizer;
        self
    }

    pub fn with_audit_sink(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = audit;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn with_recommendation_engine(mut self, engine: RecommendationEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    #[instrument(skip(self, principal, description), fields(user_id = %principal.user_id))]
    pub async fn create_version(&self, principal: &Principal, report_id: &str, name: &str, description: Option<String>) -> RoiResult<VersionSummary> {
        let mut report = self.load_authorized(principal, report_id, Access::Write).await?;
        let summary = report.create_version(name, description, &principal.user_id, Utc::now(), &self.config.history())?.summary();
        self.save(&mut report).await?;

        info!(version_id = %summary.id, "version created");
        let event = AuditEvent::new(AuditAction::VersionCreated, report_id, &principal.user_id, summary.created_at).with_details(json!({"versionId": summary.id, "name": summary.name}));
        let message = format!("{} saved version '{}' of '{}'", principal.user_id, summary.name, report.title);
        self.after_mutation(principal, &report, event, message).await;
        Ok(summary)
    }

    #[instrument(skip(self, principal), fields(user_id = %principal.user_id))]
    pub async fn list_versions(&self, principal: &Principal, report_id: &str) -> RoiResult<Vec<VersionSummary>> {
        let report = self.load_authorized(principal, report_id, Access::Read).await?;
        Ok(report.versions().summaries())
    }

    #[instrument(skip(self, principal, description), fields(user_id = %principal.user_id))]
    pub async fn rename_version(&self, principal: &Principal, report_id: &str, version_id: &str, name: &str, description: Option<String>) -> RoiResult<VersionSummary> {
        let mut report = self.load_authorized(principal, report_id, Access::Write).await?;
        let now = Utc::now();
        let summary = report.rename_version(version_id, name, description, now)?.summary();
        self.save(&mut report).await?;

        let event = AuditEvent::new(AuditAction::VersionRenamed, report_id, &principal.user_id, now).with_details(json!({"versionId": version_id, "name": summary.name}));
        let message = format!("{} renamed a version of '{}' to '{}'", principal.user_id, report.title, summary.name);
        self.after_mutation(principal, &report, event, message).await;
        Ok(summary)
    }

    #[instrument(skip(self, principal), fields(user_id = %principal.user_id))]
    pub async fn delete_version(&self, principal: &Principal, report_id: &str, version_id: &str) -> RoiResult<VersionSummary> {
        let mut report = self.load_authorized(principal, report_id, Access::Write).await?;
        let now = Utc::now();
        let removed = report.delete_version(version_id, now)?.summary();
        self.save(&mut report).await?;

        let event = AuditEvent::new(AuditAction::VersionDeleted, report_id, &principal.user_id, now).with_details(json!({"versionId": removed.id, "name": removed.name}));
        let message = format!("{} deleted version '{}' of '{}'", principal.user_id, removed.name, report.title);
        self.after_mutation(principal, &report, event, message).await;
        Ok(removed)
    }

    /// Restore a version; `auto_backup` of `None` follows the configured default
    ///
    /// The automatic backup is recorded under the configured system actor, the audit
    /// event under the caller.
    #[instrument(skip(self, principal), fields(user_id = %principal.user_id))]
    pub async fn restore_version(&self, principal: &Principal, report_id: &str, version_id: &str, auto_backup: Option<bool>) -> RoiResult<RestoreOutcome> {
        let mut report = self.load_authorized(principal, report_id, Access::Write).await?;
        let options = RestoreOptions {
            auto_backup: auto_backup.unwrap_or(self.config.auto_backup_on_restore),
            actor: self.config.system_actor.clone(),
        };
        let now = Utc::now();
        let outcome = report.restore_version(version_id, &options, now, &self.config.history())?;
        self.save(&mut report).await?;

        let event = AuditEvent::new(AuditAction::VersionRestored, report_id, &principal.user_id, now).with_details(json!({
            "versionId": outcome.restored.id,
            "backupVersionId": outcome.backup.as_ref().map(|b| b.id.clone()),
        }));
        let message = format!("{} restored version '{}' of '{}'", principal.user_id, outcome.restored.name, report.title);
        self.after_mutation(principal, &report, event, message).await;
        Ok(outcome)
    }

    #[instrument(skip(self, principal), fields(user_id = %principal.user_id))]
    pub async fn compare_versions(&self, principal: &Principal, report_id: &str, from_version: &str, to_version: &str) -> RoiResult<DiffResult> {
        let report = self.load_authorized(principal, report_id, Access::Read).await?;
        report.compare_versions(from_version, to_version)
    }

    /// Apply a stored template; the strategy name is checked before anything is loaded
    #[instrument(skip(self, principal), fields(user_id = %principal.user_id))]
    pub async fn apply_template(&self, principal: &Principal, report_id: &str, template_id: &str, strategy: &str) -> RoiResult<Vec<Section>> {
        let strategy = strategy.parse::<MergeStrategy>()?;
        let mut report = self.load_authorized(principal, report_id, Access::Write).await?;
        let template = self.repository.load_template(template_id).await?;

        let context = ApplyContext::new(principal.user_id.clone(), Utc::now());
        report.apply_template(&template, strategy, &context)?;
        self.save(&mut report).await?;

        let event = AuditEvent::new(AuditAction::TemplateApplied, report_id, &principal.user_id, context.now).with_details(json!({
            "templateId": template.id,
            "strategy": strategy.as_str(),
            "sectionCount": report.sections().len(),
        }));
        let message = format!("{} applied template '{}' to '{}'", principal.user_id, template.name, report.title);
        self.after_mutation(principal, &report, event, message).await;
        Ok(report.sections().to_vec())
    }

    #[instrument(skip(self, principal, selection), fields(user_id = %principal.user_id))]
    pub async fn report_metrics(&self, principal: &Principal, report_id: &str, selection: &MetricSelection) -> RoiResult<ReportMetrics> {
        let report = self.load_authorized(principal, report_id, Access::Read).await?;
        Ok(report.metrics(selection))
    }

    /// Aggregate over the reports matching `filter` that the caller may read
    #[instrument(skip(self, principal, filter, selection), fields(user_id = %principal.user_id))]
    pub async fn aggregate_metrics(&self, principal: &Principal, filter: &ReportFilter, selection: &MetricSelection) -> RoiResult<AggregateMetrics> {
        let reports: Vec<Report> = self
            .repository
            .list_reports(filter)
            .await?
            .into_iter()
            .filter(|report| self.authorizer.authorize(principal, Access::Read, &report.access_info()))
            .collect();
        info!(reports = reports.len(), "aggregating metrics");
        Ok(MetricsAggregator::aggregate_metrics(&reports, selection))
    }

    #[instrument(skip(self, principal), fields(user_id = %principal.user_id))]
    pub async fn recommendations(&self, principal: &Principal, report_id: &str) -> RoiResult<Vec<Recommendation>> {
        let report = self.load_authorized(principal, report_id, Access::Read).await?;
        Ok(self.engine.generate(&report.metrics(&MetricSelection::all())))
    }

    #[instrument(skip(self, principal), fields(user_id = %principal.user_id))]
    pub async fn record_view(&self, principal: &Principal, report_id: &str) -> RoiResult<EngagementMetrics> {
        let mut report = self.load_authorized(principal, report_id, Access::Read).await?;
        report.record_view();
        self.save(&mut report).await?;
        Ok(report.engagement())
    }

    /// Share a report with another user; returns false when it was already shared with them
    #[instrument(skip(self, principal), fields(user_id = %principal.user_id))]
    pub async fn share_report(&self, principal: &Principal, report_id: &str, user_id: &str) -> RoiResult<bool> {
        if user_id.trim().is_empty() {
            return Err(RoiError::invalid("user id to share with is required"));
        }
        let mut report = self.load_authorized(principal, report_id, Access::Write).await?;
        let now = Utc::now();
        if !report.share_with(user_id, now) {
            return Ok(false);
        }
        self.save(&mut report).await?;

        self.record_audit(AuditEvent::new(AuditAction::ReportShared, report_id, &principal.user_id, now).with_details(json!({"sharedWith": user_id})))
            .await;
        self.send_notification(user_id, &format!("{} shared '{}' with you", principal.user_id, report.title)).await;
        Ok(true)
    }

    /// Count a comment on the report; anyone who can read it may comment
    #[instrument(skip(self, principal), fields(user_id = %principal.user_id))]
    pub async fn add_comment(&self, principal: &Principal, report_id: &str) -> RoiResult<u64> {
        let mut report = self.load_authorized(principal, report_id, Access::Read).await?;
        let now = Utc::now();
        report.record_comment(now);
        self.save(&mut report).await?;

        let event = AuditEvent::new(AuditAction::CommentAdded, report_id, &principal.user_id, now);
        let message = format!("{} commented on '{}'", principal.user_id, report.title);
        self.after_mutation(principal, &report, event, message).await;
        Ok(report.engagement.comment_count)
    }

    /// Build the export document and count the download
    #[instrument(skip(self, principal), fields(user_id = %principal.user_id))]
    pub async fn export_document(&self, principal: &Principal, report_id: &str, format: DocumentFormat) -> RoiResult<ReportDocument> {
        let mut report = self.load_authorized(principal, report_id, Access::Read).await?;
        let now = Utc::now();
        let document = ReportDocument::build(&report, format, &principal.user_id, now, &self.engine);
        report.record_download();
        self.save(&mut report).await?;

        self.record_audit(AuditEvent::new(AuditAction::ReportExported, report_id, &principal.user_id, now).with_details(json!({"format": format.extension()})))
            .await;
        Ok(document)
    }

    async fn load_authorized(&self, principal: &Principal, report_id: &str, access: Access) -> RoiResult<Report> {
        let report = self.repository.load_report(report_id).await?;
        if !self.authorizer.authorize(principal, access, &report.access_info()) {
            warn!(report_id, user_id = %principal.user_id, ?access, "access denied");
            return Err(RoiError::Forbidden(format!("user '{}' may not {} report '{}'", principal.user_id, access_verb(access), report_id)));
        }
        Ok(report)
    }

    async fn save(&self, report: &mut Report) -> RoiResult<()> {
        report.revision = self.repository.save_report(report).await?;
        Ok(())
    }

    async fn after_mutation(&self, principal: &Principal, report: &Report, event: AuditEvent, message: String) {
        self.record_audit(event).await;
        if self.config.notify_owner && principal.user_id != report.owner_id {
            self.send_notification(&report.owner_id, &message).await;
        }
    }

    async fn record_audit(&self, event: AuditEvent) {
        let action = event.action;
        if let Err(e) = self.audit.record(event).await {
            warn!(%action, error = %e, "failed to record audit event");
        }
    }

    async fn send_notification(&self, user_id: &str, message: &str) {
        if let Err(e) = self.notifier.notify(user_id, message).await {
            warn!(user_id, error = %e, "failed to send notification");
        }
    }
}

fn access_verb(access: Access) -> &'static str {
    match access {
        Access::Read => "read",
        Access::Write => "modify",
    }
}
