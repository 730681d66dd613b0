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

//! ROI Metrics Aggregation
//!
//! Derives ROI, operational, financial and engagement figures from a report, and
//! folds them across a set of reports into sums and averages.
//!
//! Section-derived categories read a single source section located with
//! [`find_section_by_type_or_title_hint`]. Every field defaults to 0 when the section or
//! the field is missing; a field is never borrowed from another section. Ratios and
//! averages over nothing resolve to 0 so sparse reports still render.

use crate::error::{RoiError, RoiResult};
use crate::report::Report;
use crate::section::{Section, SectionType, find_section_by_type_or_title_hint};
use crate::value::{Map, Value};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Metric families a caller can request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricCategory {
    Roi,
    Operational,
    Financial,
    Engagement,
}

impl MetricCategory {
    pub const ALL: [MetricCategory; 4] = [MetricCategory::Roi, MetricCategory::Operational, MetricCategory::Financial, MetricCategory::Engagement];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricCategory::Roi => "roi",
            MetricCategory::Operational => "operational",
            MetricCategory::Financial => "financial",
            MetricCategory::Engagement => "engagement",
        }
    }
}

impl fmt::Display for MetricCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricCategory {
    type Err = RoiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        MetricCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| RoiError::invalid(format!("unknown metric type '{s}'")))
    }
}

/// Set of requested metric categories
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricSelection {
    categories: BTreeSet<MetricCategory>,
}

impl MetricSelection {
    pub fn all() -> Self {
        Self {
            categories: MetricCategory::ALL.into_iter().collect(),
        }
    }

    pub fn only(categories: impl IntoIterator<Item = MetricCategory>) -> Self {
        Self {
            categories: categories.into_iter().collect(),
        }
    }

    /// Parse category names; `"all"` selects everything and no names means all
    pub fn parse<I, S>(names: I) -> RoiResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut categories = BTreeSet::new();
        let mut wants_all = false;
        for name in names {
            let name = name.as_ref().trim();
            if name.is_empty() {
                continue;
            }
            if name.eq_ignore_ascii_case("all") {
                wants_all = true;
                continue;
            }
            categories.insert(name.parse::<MetricCategory>()?);
        }
        if wants_all || categories.is_empty() {
            return Ok(Self::all());
        }
        Ok(Self { categories })
    }

    /// Parse a comma-separated list such as `"roi,financial"`
    pub fn parse_csv(list: &str) -> RoiResult<Self> {
        Self::parse(list.split(','))
    }

    pub fn contains(&self, category: MetricCategory) -> bool {
        self.categories.contains(&category)
    }

    pub fn iter(&self) -> impl Iterator<Item = MetricCategory> + '_ {
        self.categories.iter().copied()
    }
}

impl Default for MetricSelection {
    fn default() -> Self {
        Self::all()
    }
}

/// Numeric record that can be summed and averaged field by field
pub trait MetricRecord: Default + Clone {
    fn accumulate(&mut self, other: &Self);
    fn divided_by(&self, divisor: f64) -> Self;
}

macro_rules! impl_metric_record {
    ($name:ident { $($field:ident),+ $(,)? }) => {
        impl MetricRecord for $name {
            fn accumulate(&mut self, other: &Self) {
                $(self.$field += other.$field;)+
            }

            fn divided_by(&self, divisor: f64) -> Self {
                Self {
                    $($field: self.$field / divisor,)+
                }
            }
        }
    };
}

/// Return-on-investment figures of one report
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoiMetrics {
    pub total_investment: f64,
    pub total_return: f64,
    pub payback_period: f64,
    pub roi_percentage: f64,
    pub npv: f64,
    pub irr: f64,
    pub net_return: f64,
    pub return_ratio: f64,
}

impl_metric_record!(RoiMetrics {
    total_investment,
    total_return,
    payback_period,
    roi_percentage,
    npv,
    irr,
    net_return,
    return_ratio,
});

/// Warehouse operations figures of one report
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationalMetrics {
    pub labor_efficiency: f64,
    pub space_utilization: f64,
    pub picking_accuracy: f64,
    pub inventory_accuracy: f64,
    pub order_cycle_time: f64,
    pub throughput: f64,
}

impl_metric_record!(OperationalMetrics {
    labor_efficiency,
    space_utilization,
    picking_accuracy,
    inventory_accuracy,
    order_cycle_time,
    throughput,
});

/// Cost and savings figures of one report
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialMetrics {
    pub implementation_cost: f64,
    pub maintenance_cost: f64,
    pub annual_savings: f64,
    pub labor_savings: f64,
    pub operational_savings: f64,
}

impl_metric_record!(FinancialMetrics {
    implementation_cost,
    maintenance_cost,
    annual_savings,
    labor_savings,
    operational_savings,
});

/// Reader activity on one report
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngagementMetrics {
    pub view_count: f64,
    pub download_count: f64,
    pub comment_count: f64,
    pub share_count: f64,
    pub version_count: f64,
}

impl_metric_record!(EngagementMetrics {
    view_count,
    download_count,
    comment_count,
    share_count,
    version_count,
});

/// Metrics of a single report; only requested categories are present
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportMetrics {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roi: Option<RoiMetrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operational: Option<OperationalMetrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub financial: Option<FinancialMetrics>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engagement: Option<EngagementMetrics>,
}

/// Sum and average of one category across reports
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Aggregate<T> {
    pub sum: T,
    pub average: T,
}

/// Portfolio-wide cost and savings totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialTotals {
    pub total_cost: f64,
    pub total_savings: f64,
    pub net_savings: f64,
}

/// Financial aggregate with raw totals
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialAggregate {
    pub sum: FinancialMetrics,
    pub average: FinancialMetrics,
    pub totals: FinancialTotals,
}

/// Metrics folded across a set of reports
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateMetrics {
    pub report_count: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roi: Option<Aggregate<RoiMetrics>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operational: Option<Aggregate<OperationalMetrics>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub financial: Option<FinancialAggregate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engagement: Option<Aggregate<EngagementMetrics>>,
}

/// Computes report and portfolio metrics
pub struct MetricsAggregator;

impl MetricsAggregator {
    /// Metrics of one report for the requested categories
    pub fn report_metrics(sections: &[Section], engagement: &EngagementMetrics, selection: &MetricSelection) -> ReportMetrics {
        ReportMetrics {
            roi: selection.contains(MetricCategory::Roi).then(|| Self::roi_metrics(sections)),
            operational: selection.contains(MetricCategory::Operational).then(|| Self::operational_metrics(sections)),
            financial: selection.contains(MetricCategory::Financial).then(|| Self::financial_metrics(sections)),
            engagement: selection.contains(MetricCategory::Engagement).then_some(*engagement),
        }
    }

    pub fn roi_metrics(sections: &[Section]) -> RoiMetrics {
        let data = source_data(sections, SectionType::Roi, "roi");
        let total_investment = read_number(data, "totalInvestment");
        let total_return = read_number(data, "totalReturn");

        RoiMetrics {
            total_investment,
            total_return,
            payback_period: read_number(data, "paybackPeriod"),
            roi_percentage: read_number(data, "roiPercentage"),
            npv: read_number(data, "npv"),
            irr: read_number(data, "irr"),
            net_return: total_return - total_investment,
            return_ratio: if total_investment > 0.0 { total_return / total_investment } else { 0.0 },
        }
    }

    pub fn operational_metrics(sections: &[Section]) -> OperationalMetrics {
        let data = source_data(sections, SectionType::Operational, "operational");
        OperationalMetrics {
            labor_efficiency: read_number(data, "laborEfficiency"),
            space_utilization: read_number(data, "spaceUtilization"),
            picking_accuracy: read_number(data, "pickingAccuracy"),
            inventory_accuracy: read_number(data, "inventoryAccuracy"),
            order_cycle_time: read_number(data, "orderCycleTime"),
            throughput: read_number(data, "throughput"),
        }
    }

    pub fn financial_metrics(sections: &[Section]) -> FinancialMetrics {
        let data = source_data(sections, SectionType::Financial, "financial");
        FinancialMetrics {
            implementation_cost: read_number(data, "implementationCost"),
            maintenance_cost: read_number(data, "maintenanceCost"),
            annual_savings: read_number(data, "annualSavings"),
            labor_savings: read_number(data, "laborSavings"),
            operational_savings: read_number(data, "operationalSavings"),
        }
    }

    /// Fold per-report metrics across `reports`
    ///
    /// Averages divide by the number of reports, including reports that lack a source
    /// section for a category (they contribute zeros).
    pub fn aggregate_metrics(reports: &[Report], selection: &MetricSelection) -> AggregateMetrics {
        let per_report: Vec<ReportMetrics> = reports.iter().map(|report| report.metrics(selection)).collect();
        let count = per_report.len();

        let financial = selection.contains(MetricCategory::Financial).then(|| {
            let Aggregate { sum, average } = fold(per_report.iter().filter_map(|m| m.financial), count);
            let total_cost = sum.implementation_cost + sum.maintenance_cost;
            let total_savings = sum.annual_savings + sum.labor_savings + sum.operational_savings;
            FinancialAggregate {
                sum,
                average,
                totals: FinancialTotals {
                    total_cost,
                    total_savings,
                    net_savings: total_savings - total_cost,
                },
            }
        });

        AggregateMetrics {
            report_count: count,
            roi: selection.contains(MetricCategory::Roi).then(|| fold(per_report.iter().filter_map(|m| m.roi), count)),
            operational: selection.contains(MetricCategory::Operational).then(|| fold(per_report.iter().filter_map(|m| m.operational), count)),
            financial,
            engagement: selection.contains(MetricCategory::Engagement).then(|| fold(per_report.iter().filter_map(|m| m.engagement), count)),
        }
    }
}

fn fold<T: MetricRecord>(records: impl Iterator<Item = T>, count: usize) -> Aggregate<T> {
    let mut sum = T::default();
    for record in records {
        sum.accumulate(&record);
    }
    let average = if count == 0 { T::default() } else { sum.divided_by(count as f64) };
    Aggregate { sum, average }
}

fn source_data<'a>(sections: &'a [Section], section_type: SectionType, hint: &str) -> Option<&'a Map> {
    find_section_by_type_or_title_hint(sections, section_type, hint).and_then(|section| section.data.as_ref())
}

fn read_number(data: Option<&Map>, key: &str) -> f64 {
    data.and_then(|d| d.get(key)).and_then(Value::to_number_lenient).unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::map_from_json;
    use serde_json::json;

    fn roi_section(data: serde_json::Value) -> Section {
        Section::new("roi", "Return on Investment", SectionType::Roi).with_data(map_from_json(data))
    }

    #[test]
    fn test_selection_parsing() {
        let selection = MetricSelection::parse_csv("roi, financial").unwrap();
        assert!(selection.contains(MetricCategory::Roi));
        assert!(!selection.contains(MetricCategory::Engagement));

        assert_eq!(MetricSelection::parse(["all"]).unwrap(), MetricSelection::all());
        assert_eq!(MetricSelection::parse(Vec::<String>::new()).unwrap(), MetricSelection::all());
        assert!(MetricSelection::parse_csv("roi,vibes").is_err());
    }

    #[test]
    fn test_all_does_not_hide_unknown_names() {
        assert!(MetricSelection::parse_csv("all,bogus").is_err());
        assert!(MetricSelection::parse_csv("bogus,all").is_err());
        assert_eq!(MetricSelection::parse_csv("roi,ALL").unwrap(), MetricSelection::all());
    }

    #[test]
    fn test_roi_derivations() {
        let sections = vec![roi_section(json!({"totalInvestment": 100000, "totalReturn": 150000}))];
        let roi = MetricsAggregator::roi_metrics(&sections);
        assert_eq!(roi.net_return, 50000.0);
        assert_eq!(roi.return_ratio, 1.5);
        assert_eq!(roi.npv, 0.0);
    }

    #[test]
    fn test_return_ratio_guards_zero_investment() {
        let sections = vec![roi_section(json!({"totalReturn": 5000}))];
        let roi = MetricsAggregator::roi_metrics(&sections);
        assert_eq!(roi.return_ratio, 0.0);
        assert_eq!(roi.net_return, 5000.0);
    }

    #[test]
    fn test_missing_section_defaults_to_zero() {
        let sections = vec![Section::new("t", "Intro", SectionType::Text)];
        assert_eq!(MetricsAggregator::roi_metrics(&sections), RoiMetrics::default());
        assert_eq!(MetricsAggregator::financial_metrics(&sections), FinancialMetrics::default());
    }

    #[test]
    fn test_title_hint_fallback() {
        let sections = vec![Section::new("x", "Operational KPIs", SectionType::Table).with_data(map_from_json(json!({"laborEfficiency": 72})))];
        assert_eq!(MetricsAggregator::operational_metrics(&sections).labor_efficiency, 72.0);
    }

    #[test]
    fn test_fields_never_borrowed_from_other_sections() {
        let sections = vec![
            Section::new("ops1", "Ops", SectionType::Operational).with_data(map_from_json(json!({"laborEfficiency": 80}))),
            Section::new("ops2", "Ops 2", SectionType::Operational).with_data(map_from_json(json!({"spaceUtilization": 60}))),
        ];
        let ops = MetricsAggregator::operational_metrics(&sections);
        assert_eq!(ops.labor_efficiency, 80.0);
        assert_eq!(ops.space_utilization, 0.0);
    }

    #[test]
    fn test_numeric_strings_are_read() {
        let sections = vec![roi_section(json!({"totalInvestment": "2000", "totalReturn": "abc"}))];
        let roi = MetricsAggregator::roi_metrics(&sections);
        assert_eq!(roi.total_investment, 2000.0);
        assert_eq!(roi.total_return, 0.0);
    }

    #[test]
    fn test_report_metrics_honours_selection() {
        let sections = vec![roi_section(json!({"roiPercentage": 12}))];
        let engagement = EngagementMetrics { view_count: 3.0, ..Default::default() };
        let metrics = MetricsAggregator::report_metrics(&sections, &engagement, &MetricSelection::only([MetricCategory::Roi, MetricCategory::Engagement]));

        assert_eq!(metrics.roi.map(|r| r.roi_percentage), Some(12.0));
        assert!(metrics.operational.is_none());
        assert!(metrics.financial.is_none());
        assert_eq!(metrics.engagement.map(|e| e.view_count), Some(3.0));
    }

    #[test]
    fn test_empty_aggregate_is_zero() {
        let aggregate = MetricsAggregator::aggregate_metrics(&[], &MetricSelection::only([MetricCategory::Roi]));
        assert_eq!(aggregate.report_count, 0);
        let roi = aggregate.roi.as_ref().unwrap();
        assert_eq!(roi.average.roi_percentage, 0.0);
        assert!(!roi.average.roi_percentage.is_nan());
        assert!(aggregate.financial.is_none());

        let wire = serde_json::to_value(&aggregate).unwrap();
        assert_eq!(wire["roi"]["average"]["roiPercentage"], 0.0);
        assert!(wire["roi"].get("averageRoiPercentage").is_none());
    }

    #[test]
    fn test_fold_sums_and_averages() {
        let records = vec![
            FinancialMetrics { implementation_cost: 100.0, annual_savings: 40.0, ..Default::default() },
            FinancialMetrics { implementation_cost: 300.0, annual_savings: 20.0, ..Default::default() },
        ];
        let aggregate = fold(records.into_iter(), 2);
        assert_eq!(aggregate.sum.implementation_cost, 400.0);
        assert_eq!(aggregate.average.implementation_cost, 200.0);
        assert_eq!(aggregate.average.annual_savings, 30.0);
    }

    #[test]
    fn test_wire_names() {
        let wire = serde_json::to_value(RoiMetrics { roi_percentage: 20.0, ..Default::default() }).unwrap();
        assert_eq!(wire["roiPercentage"], 20.0);
        assert!(wire.get("returnRatio").is_some());
    }
}
