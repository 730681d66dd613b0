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

//! End-to-end report flows through the service layer

use async_trait::async_trait;
use chrono::Utc;
use roi_core::value::map_from_json;
use roi_core::{
    AuditAction, AuditEvent, AuditSink, CURRENT_VERSION_ID, DocumentFormat, InMemoryAuditLog, InMemoryNotifier, InMemoryRepository, MetricCategory, MetricSelection, Principal, Report,
    ReportFilter, ReportRepository, ReportService, RoiError, RoiResult, Section, SectionTemplate, SectionType, ServiceConfig, Template,
};
use serde_json::json;
use std::sync::Arc;

struct Harness {
    repository: Arc<InMemoryRepository>,
    audit: Arc<InMemoryAuditLog>,
    notifier: Arc<InMemoryNotifier>,
    service: ReportService,
}

async fn harness(config: ServiceConfig) -> Harness {
    let repository = Arc::new(InMemoryRepository::new());
    let audit = Arc::new(InMemoryAuditLog::new());
    let notifier = Arc::new(InMemoryNotifier::new());

    let report = Report::new("r1", "North Hub ROI", "alice", Utc::now())
        .with_sections(vec![
            Section::new("intro", "Introduction", SectionType::Text).with_content("Baseline"),
            Section::new("roi", "ROI", SectionType::Roi)
                .with_data(map_from_json(json!({"totalInvestment": 200000, "totalReturn": 260000, "roiPercentage": 12, "paybackPeriod": 30})))
                .with_order(1),
            Section::new("ops", "Operations", SectionType::Operational).with_data(map_from_json(json!({"laborEfficiency": 65}))).with_order(2),
        ])
        .expect("valid sections");
    repository.save_report(&report).await.expect("seed report");

    let template = Template::new(
        "tpl-ops",
        "Operations Review",
        vec![
            SectionTemplate::new("Operational Metrics", SectionType::Operational).with_data(map_from_json(json!({"spaceUtilization": 70}))),
            SectionTemplate::new("Cost Breakdown", SectionType::Financial).with_data(map_from_json(json!({"implementationCost": 650000}))),
        ],
    );
    repository.save_template(&template).await.expect("seed template");

    let service = ReportService::new(repository.clone(), config).with_audit_sink(audit.clone()).with_notifier(notifier.clone());
    Harness { repository, audit, notifier, service }
}

#[tokio::test]
async fn test_version_lifecycle() {
    let h = harness(ServiceConfig::default()).await;
    let alice = Principal::user("alice");

    let v1 = h.service.create_version(&alice, "r1", "Baseline", Some("initial numbers".into())).await.unwrap();
    assert_eq!(v1.section_count, 3);

    let sections = h.service.apply_template(&alice, "r1", "tpl-ops", "merge").await.unwrap();
    assert_eq!(sections.len(), 4);
    let ops = sections.iter().find(|s| s.id == "ops").unwrap();
    assert_eq!(ops.title, "Operational Metrics");
    assert_eq!(ops.data_field("laborEfficiency").and_then(|v| v.as_f64()), Some(65.0));
    assert_eq!(ops.data_field("spaceUtilization").and_then(|v| v.as_f64()), Some(70.0));

    let diff = h.service.compare_versions(&alice, "r1", &v1.id, CURRENT_VERSION_ID).await.unwrap();
    assert_eq!(diff.summary.added_count, 1);
    assert_eq!(diff.summary.modified_count, 1);
    assert_eq!(diff.summary.unchanged_count, 2);
    let ops_changes = diff.modified("ops").unwrap();
    assert!(ops_changes.title_changed.is_some());
    assert!(ops_changes.data_changes.added.contains_key("spaceUtilization"));

    let outcome = h.service.restore_version(&alice, "r1", &v1.id, None).await.unwrap();
    assert!(outcome.backup.is_some());

    let stored = h.repository.load_report("r1").await.unwrap();
    assert_eq!(stored.sections().len(), 3);
    assert_eq!(stored.versions().len(), 2);
    assert_eq!(stored.template_id.as_deref(), Some("tpl-ops"));

    let versions = h.service.list_versions(&alice, "r1").await.unwrap();
    assert_eq!(versions[1].name, "Auto-backup before restoring 'Baseline'");

    let backup_vs_current = h.service.compare_versions(&alice, "r1", CURRENT_VERSION_ID, &versions[1].id).await.unwrap();
    assert_eq!(backup_vs_current.added_ids().len(), 1);

    assert_eq!(h.audit.actions().await, vec![AuditAction::VersionCreated, AuditAction::TemplateApplied, AuditAction::VersionRestored]);
    assert!(h.notifier.sent().await.is_empty());
}

#[tokio::test]
async fn test_rename_and_delete_versions() {
    let h = harness(ServiceConfig::default()).await;
    let alice = Principal::user("alice");

    let v1 = h.service.create_version(&alice, "r1", "Draft", None).await.unwrap();
    let v2 = h.service.create_version(&alice, "r1", "Final", None).await.unwrap();

    let err = h.service.rename_version(&alice, "r1", &v1.id, "Final", None).await.unwrap_err();
    assert!(err.is_conflict());

    let renamed = h.service.rename_version(&alice, "r1", &v1.id, "Board Review", Some("for the board".into())).await.unwrap();
    assert_eq!(renamed.name, "Board Review");

    let removed = h.service.delete_version(&alice, "r1", &v2.id).await.unwrap();
    assert_eq!(removed.name, "Final");
    assert!(h.service.delete_version(&alice, "r1", &v2.id).await.unwrap_err().is_not_found());
    assert_eq!(h.service.list_versions(&alice, "r1").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_access_rules() {
    let h = harness(ServiceConfig::default()).await;
    let alice = Principal::user("alice");
    let bob = Principal::user("bob");

    let err = h.service.create_version(&bob, "r1", "Sneaky", None).await.unwrap_err();
    assert!(matches!(err, RoiError::Forbidden(_)));
    assert_eq!(err.error_type(), "forbidden");
    assert!(h.service.report_metrics(&bob, "r1", &MetricSelection::all()).await.is_err());

    assert!(h.service.share_report(&alice, "r1", "bob").await.unwrap());
    assert!(!h.service.share_report(&alice, "r1", "bob").await.unwrap());

    let metrics = h.service.report_metrics(&bob, "r1", &MetricSelection::all()).await.unwrap();
    assert_eq!(metrics.engagement.map(|e| e.share_count), Some(1.0));
    assert!(matches!(h.service.apply_template(&bob, "r1", "tpl-ops", "append").await, Err(RoiError::Forbidden(_))));

    let admin = Principal::admin("root");
    h.service.create_version(&admin, "r1", "Admin checkpoint", None).await.unwrap();

    let sent = h.notifier.sent().await;
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].user_id, "bob");
    assert_eq!(sent[1].user_id, "alice");
}

#[tokio::test]
async fn test_unknown_strategy_is_rejected_before_work() {
    let h = harness(ServiceConfig::default()).await;
    let alice = Principal::user("alice");

    let err = h.service.apply_template(&alice, "r1", "tpl-ops", "overwrite").await.unwrap_err();
    assert!(matches!(err, RoiError::InvalidArgument(_)));

    let err = h.service.apply_template(&alice, "r1", "missing", "replace").await.unwrap_err();
    assert!(err.is_not_found());

    let stored = h.repository.load_report("r1").await.unwrap();
    assert_eq!(stored.revision, 1);
    assert_eq!(stored.sections().len(), 3);
    assert!(h.audit.events().await.is_empty());
}

#[tokio::test]
async fn test_restore_follows_configured_backup_default() {
    let config = ServiceConfig {
        auto_backup_on_restore: false,
        ..Default::default()
    };
    let h = harness(config).await;
    let alice = Principal::user("alice");

    let v1 = h.service.create_version(&alice, "r1", "Baseline", None).await.unwrap();
    let outcome = h.service.restore_version(&alice, "r1", &v1.id, None).await.unwrap();
    assert!(outcome.backup.is_none());

    let outcome = h.service.restore_version(&alice, "r1", &v1.id, Some(true)).await.unwrap();
    assert!(outcome.backup.is_some());
}

#[tokio::test]
async fn test_backup_recorded_under_system_actor() {
    let config = ServiceConfig {
        system_actor: "roi-bot".to_string(),
        ..Default::default()
    };
    let h = harness(config).await;
    let alice = Principal::user("alice");

    let v1 = h.service.create_version(&alice, "r1", "Baseline", None).await.unwrap();
    let outcome = h.service.restore_version(&alice, "r1", &v1.id, Some(true)).await.unwrap();

    let backup = outcome.backup.expect("backup requested");
    assert_eq!(backup.created_by, "roi-bot");

    let stored = h.repository.load_report("r1").await.unwrap();
    assert_eq!(stored.versions().get(&backup.id).unwrap().created_by(), "roi-bot");

    let events = h.audit.events().await;
    let restore = events.iter().find(|e| e.action == AuditAction::VersionRestored).unwrap();
    assert_eq!(restore.actor, "alice");
    assert_eq!(restore.details["backupVersionId"], backup.id.as_str());
}

#[tokio::test]
async fn test_retention_cap_prunes_oldest() {
    let config = ServiceConfig {
        max_versions_per_report: Some(2),
        ..Default::default()
    };
    let h = harness(config).await;
    let alice = Principal::user("alice");

    for name in ["one", "two", "three"] {
        h.service.create_version(&alice, "r1", name, None).await.unwrap();
    }
    let names: Vec<String> = h.service.list_versions(&alice, "r1").await.unwrap().into_iter().map(|v| v.name).collect();
    assert_eq!(names, vec!["two", "three"]);
}

#[tokio::test]
async fn test_recommendations_and_export() {
    let h = harness(ServiceConfig::default()).await;
    let alice = Principal::user("alice");

    let recommendations = h.service.recommendations(&alice, "r1").await.unwrap();
    let titles: Vec<&str> = recommendations.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(titles, vec!["Reduce Payback Period", "Improve ROI Performance", "Improve Labor Efficiency"]);

    let document = h.service.export_document(&alice, "r1", DocumentFormat::Pdf).await.unwrap();
    assert_eq!(document.file_name, "north-hub-roi.pdf");
    assert_eq!(document.recommendations.len(), 3);

    h.service.record_view(&alice, "r1").await.unwrap();
    assert_eq!(h.service.add_comment(&alice, "r1").await.unwrap(), 1);

    let stored = h.repository.load_report("r1").await.unwrap();
    assert_eq!(stored.engagement.download_count, 1);
    assert_eq!(stored.engagement.view_count, 1);
    assert_eq!(stored.engagement.comment_count, 1);
}

#[tokio::test]
async fn test_aggregate_only_counts_readable_reports() {
    let h = harness(ServiceConfig::default()).await;
    let mut other = Report::new("r2", "South Hub", "carol", Utc::now())
        .with_sections(vec![Section::new("roi", "ROI", SectionType::Roi).with_data(map_from_json(json!({"roiPercentage": 30})))])
        .unwrap();
    other.is_public = true;
    h.repository.save_report(&other).await.unwrap();
    h.repository.save_report(&Report::new("r3", "Private", "carol", Utc::now())).await.unwrap();

    let selection = MetricSelection::only([MetricCategory::Roi, MetricCategory::Financial]);
    let aggregate = h.service.aggregate_metrics(&Principal::user("alice"), &ReportFilter::default(), &selection).await.unwrap();

    assert_eq!(aggregate.report_count, 2);
    let roi = aggregate.roi.unwrap();
    assert_eq!(roi.sum.roi_percentage, 42.0);
    assert_eq!(roi.average.roi_percentage, 21.0);
    assert!(aggregate.operational.is_none());
    assert_eq!(aggregate.financial.unwrap().totals.net_savings, 0.0);

    let carol_only = h.service.aggregate_metrics(&Principal::user("alice"), &ReportFilter::owned_by("carol"), &selection).await.unwrap();
    assert_eq!(carol_only.report_count, 1);
}

#[tokio::test]
async fn test_concurrent_edit_surfaces_conflict() {
    let h = harness(ServiceConfig::default()).await;
    let stale = h.repository.load_report("r1").await.unwrap();

    h.service.create_version(&Principal::user("alice"), "r1", "Fresh", None).await.unwrap();

    let err = h.repository.save_report(&stale).await.unwrap_err();
    assert!(err.is_conflict());
}

struct FailingAuditSink;

#[async_trait]
impl AuditSink for FailingAuditSink {
    async fn record(&self, _event: AuditEvent) -> RoiResult<()> {
        Err(RoiError::Collaborator("audit store offline".into()))
    }
}

#[tokio::test]
async fn test_audit_failure_does_not_roll_back() {
    let h = harness(ServiceConfig::default()).await;
    let service = ReportService::new(h.repository.clone(), ServiceConfig::default()).with_audit_sink(Arc::new(FailingAuditSink));

    let summary = service.create_version(&Principal::user("alice"), "r1", "Kept", None).await.unwrap();
    let stored = h.repository.load_report("r1").await.unwrap();
    assert!(stored.versions().find(&summary.id).is_some());
}
