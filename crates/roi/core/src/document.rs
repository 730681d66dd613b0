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

//! Export documents
//!
//! A [`ReportDocument`] is everything a PDF or DOCX renderer needs to lay out a report.
//! Rendering bytes happens elsewhere.

use crate::error::RoiError;
use crate::metrics::{MetricSelection, ReportMetrics};
use crate::recommendation::{Recommendation, RecommendationEngine};
use crate::report::Report;
use crate::section::Section;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Docx,
}

impl DocumentFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Docx => "docx",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "application/pdf",
            DocumentFormat::Docx => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for DocumentFormat {
    type Err = RoiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pdf" => Ok(DocumentFormat::Pdf),
            "docx" => Ok(DocumentFormat::Docx),
            other => Err(RoiError::invalid(format!("unsupported export format '{other}'"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportDocument {
    pub report_id: String,
    pub title: String,
    pub format: DocumentFormat,
    pub file_name: String,
    pub generated_at: DateTime<Utc>,
    pub generated_by: String,
    /// Sections in display order
    pub sections: Vec<Section>,
    pub metrics: ReportMetrics,
    pub recommendations: Vec<Recommendation>,
    pub version_count: usize,
}

impl ReportDocument {
    pub fn build(report: &Report, format: DocumentFormat, generated_by: &str, generated_at: DateTime<Utc>, engine: &RecommendationEngine) -> Self {
        let metrics = report.metrics(&MetricSelection::all());
        let recommendations = engine.generate(&metrics);

        Self {
            report_id: report.id.clone(),
            title: report.title.clone(),
            format,
            file_name: format!("{}.{}", slugify(&report.title), format.extension()),
            generated_at,
            generated_by: generated_by.to_string(),
            sections: report.section_list().in_display_order().into_iter().cloned().collect(),
            metrics,
            recommendations,
            version_count: report.versions().len(),
        }
    }
}

/// Lowercase ASCII slug with single dashes; `report` when nothing survives
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_end_matches('-');
    if slug.is_empty() { "report".to_string() } else { slug.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::section::SectionType;
    use crate::value::map_from_json;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Q3 Warehouse ROI: North Hub"), "q3-warehouse-roi-north-hub");
        assert_eq!(slugify("  --  "), "report");
        assert_eq!(slugify("Ünïcode only"), "n-code-only");
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("PDF".parse::<DocumentFormat>().unwrap(), DocumentFormat::Pdf);
        assert_eq!("docx".parse::<DocumentFormat>().unwrap().extension(), "docx");
        assert!("xlsx".parse::<DocumentFormat>().is_err());
    }

    #[test]
    fn test_build_orders_sections_and_recommends() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let report = Report::new("r1", "North Hub ROI", "alice", now)
            .with_sections(vec![
                Section::new("ops", "Operations", SectionType::Operational).with_data(map_from_json(json!({"laborEfficiency": 65}))).with_order(2),
                Section::new("intro", "Intro", SectionType::Text).with_order(0),
            ])
            .unwrap();

        let document = ReportDocument::build(&report, DocumentFormat::Docx, "alice", now, &RecommendationEngine::with_default_rules());
        assert_eq!(document.file_name, "north-hub-roi.docx");
        assert_eq!(document.sections.iter().map(|s| s.id.as_str()).collect::<Vec<_>>(), vec!["intro", "ops"]);
        assert_eq!(document.recommendations[0].title, "Improve Labor Efficiency");
        assert_eq!(document.version_count, 0);
        assert!(document.metrics.engagement.is_some());
    }
}
