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

//! Warehouse ROI Report Engine
//!
//! Versioning, diffing and template merging for warehouse ROI reports, together with
//! metric aggregation and threshold recommendations.
//!
//! # Core Components
//!
//! ## Value Model
//! - Closed recursive [`Value`] tree for section `data` and `metadata`
//! - Structural equality via [`deep_equal`]
//!
//! ## Versioning
//! - Immutable [`VersionSnapshot`]s deep-copied from the live sections
//! - Per-report [`VersionHistory`] with unique names and optional retention
//! - [`VersionDiffer`] comparing any two versions, or a version against live state
//!
//! ## Templates
//! - [`TemplateMerger`] with `replace`, `append` and `merge` strategies
//!
//! ## Metrics and Recommendations
//! - [`MetricsAggregator`] for per-report and portfolio figures
//! - [`RecommendationEngine`] evaluating threshold rules
//!
//! ## Service Layer
//! - [`ReportService`] running load, authorize, compute, save, audit and notify
//!   against the [`ReportRepository`], [`Authorizer`], [`AuditSink`] and [`Notifier`] contracts
//!
//! # Usage
//!
//! ```rust
//! use roi_core::{HistoryConfig, Report, Section, SectionType, CURRENT_VERSION_ID};
//! use chrono::Utc;
//!
//! let mut report = Report::new("r1", "North Hub", "alice", Utc::now())
//!     .with_sections(vec![Section::new("intro", "Introduction", SectionType::Text)])
//!     .unwrap();
//!
//! let version_id = report.create_version("Baseline", None, "alice", Utc::now(), &HistoryConfig::default()).unwrap().id().to_string();
//! let diff = report.compare_versions(&version_id, CURRENT_VERSION_ID).unwrap();
//! assert!(diff.is_empty());
//! ```

pub mod access;
pub mod config;
pub mod diff;
pub mod document;
pub mod equality;
pub mod error;
pub mod events;
pub mod history;
pub mod metrics;
pub mod recommendation;
pub mod report;
pub mod section;
pub mod service;
pub mod snapshot;
pub mod store;
pub mod template;
pub mod value;

// Re-export commonly used types
pub use access::{Access, Authorizer, DefaultAuthorizer, Principal, ReportAccessInfo, Role};
pub use config::ServiceConfig;
pub use diff::{DiffResult, DiffSummary, MapChanges, ModifiedSection, SectionDifferences, SectionRef, VersionDiffer};
pub use document::{DocumentFormat, ReportDocument};
pub use equality::{deep_equal, deep_equal_opt};
pub use error::{ResourceKind, RoiError, RoiResult};
pub use events::{AuditAction, AuditEvent, AuditSink, InMemoryAuditLog, InMemoryNotifier, Notifier, TracingAuditSink, TracingNotifier};
pub use history::{HistoryConfig, VersionHistory};
pub use metrics::{AggregateMetrics, MetricCategory, MetricSelection, MetricsAggregator, ReportMetrics};
pub use recommendation::{Priority, Recommendation, RecommendationEngine, RecommendationRule, ThresholdRule};
pub use report::{EngagementCounters, Report, RestoreOptions, RestoreOutcome};
pub use section::{Section, SectionList, SectionType, find_section_by_type_or_title_hint};
pub use service::ReportService;
pub use snapshot::{CURRENT_VERSION_ID, Comparand, VersionSnapshot, VersionSummary};
pub use store::{InMemoryRepository, ReportFilter, ReportRepository};
pub use template::{ApplyContext, MergeStrategy, SectionTemplate, Template, TemplateMerger};
pub use value::{Map, Value};
