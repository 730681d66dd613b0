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

//! Threshold recommendations over report metrics

use crate::metrics::ReportMetrics;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Rules fired below this count get the general recommendations appended
pub const MIN_SPECIFIC_RECOMMENDATIONS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::High => write!(f, "high"),
            Priority::Medium => write!(f, "medium"),
            Priority::Low => write!(f, "low"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationCategory {
    Roi,
    Operational,
    Financial,
    General,
}

/// Where a metric stands and where it should go
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricTarget {
    pub current: f64,
    pub target: f64,
    pub unit: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub category: RecommendationCategory,
    pub priority: Priority,
    pub title: String,
    pub description: String,
    pub impact: String,
    pub action_items: Vec<String>,
    pub metrics: Option<MetricTarget>,
}

pub trait RecommendationRule: Send + Sync {
    fn name(&self) -> &str;
    fn applicable(&self, metrics: &ReportMetrics) -> bool;
    fn recommend(&self, metrics: &ReportMetrics) -> Option<Recommendation>;
}

/// Reads one figure out of computed metrics; `None` when its category was not computed
pub type MetricReader = fn(&ReportMetrics) -> Option<f64>;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Threshold {
    Above(f64),
    Below(f64),
}

impl Threshold {
    pub fn breached_by(&self, value: f64) -> bool {
        match *self {
            Threshold::Above(limit) => value > limit,
            Threshold::Below(limit) => value < limit,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TargetValue {
    Fixed(f64),
    /// Fraction of the current value
    Scaled(f64),
}

impl TargetValue {
    pub fn resolve(&self, current: f64) -> f64 {
        match *self {
            TargetValue::Fixed(target) => target,
            TargetValue::Scaled(factor) => current * factor,
        }
    }
}

/// Fires when a single metric crosses a fixed threshold
///
/// A metric equal to 0 counts as not reported and never fires.
pub struct ThresholdRule {
    title: String,
    category: RecommendationCategory,
    priority: Priority,
    read: MetricReader,
    threshold: Threshold,
    target: TargetValue,
    unit: String,
    description: String,
    impact: String,
    action_items: Vec<String>,
}

impl ThresholdRule {
    pub fn new(title: impl Into<String>, category: RecommendationCategory, priority: Priority, read: MetricReader, threshold: Threshold, target: TargetValue) -> Self {
        Self {
            title: title.into(),
            category,
            priority,
            read,
            threshold,
            target,
            unit: String::new(),
            description: String::new(),
            impact: String::new(),
            action_items: Vec::new(),
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_impact(mut self, impact: impl Into<String>) -> Self {
        self.impact = impact.into();
        self
    }

    pub fn with_action_items<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.action_items = items.into_iter().map(Into::into).collect();
        self
    }

    fn current(&self, metrics: &ReportMetrics) -> Option<f64> {
        (self.read)(metrics).filter(|value| *value != 0.0 && self.threshold.breached_by(*value))
    }
}

impl RecommendationRule for ThresholdRule {
    fn name(&self) -> &str {
        &self.title
    }

    fn applicable(&self, metrics: &ReportMetrics) -> bool {
        self.current(metrics).is_some()
    }

    fn recommend(&self, metrics: &ReportMetrics) -> Option<Recommendation> {
        let current = self.current(metrics)?;
        Some(Recommendation {
            category: self.category,
            priority: self.priority,
            title: self.title.clone(),
            description: self.description.clone(),
            impact: self.impact.clone(),
            action_items: self.action_items.clone(),
            metrics: Some(MetricTarget {
                current,
                target: self.target.resolve(current),
                unit: self.unit.clone(),
            }),
        })
    }
}

/// Evaluates registered rules in registration order
pub struct RecommendationEngine {
    rules: Vec<Box<dyn RecommendationRule>>,
}

impl RecommendationEngine {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Engine loaded with the warehouse ROI rule set
    pub fn with_default_rules() -> Self {
        let mut engine = Self::new();
        for rule in default_rules() {
            engine.add_rule(Box::new(rule));
        }
        engine
    }

    pub fn add_rule(&mut self, rule: Box<dyn RecommendationRule>) {
        self.rules.push(rule);
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }

    pub fn generate(&self, metrics: &ReportMetrics) -> Vec<Recommendation> {
        let mut recommendations: Vec<Recommendation> = self
            .rules
            .iter()
            .filter(|rule| rule.applicable(metrics))
            .filter_map(|rule| {
                debug!(rule = rule.name(), "recommendation rule fired");
                rule.recommend(metrics)
            })
            .collect();

        if recommendations.len() < MIN_SPECIFIC_RECOMMENDATIONS {
            recommendations.extend(general_recommendations());
        }
        recommendations
    }
}

impl Default for RecommendationEngine {
    fn default() -> Self {
        Self::with_default_rules()
    }
}

fn default_rules() -> Vec<ThresholdRule> {
    vec![
        ThresholdRule::new("Reduce Payback Period", RecommendationCategory::Roi, Priority::High, |m| m.roi.map(|r| r.payback_period), Threshold::Above(24.0), TargetValue::Fixed(18.0))
            .with_unit("months")
            .with_description("The payback period exceeds 24 months, delaying the point where the investment pays for itself.")
            .with_impact("Faster capital recovery and lower exposure to changing business conditions.")
            .with_action_items([
                "Phase the implementation to realise early savings sooner",
                "Prioritise automation with the quickest returns",
                "Renegotiate vendor payment terms",
            ]),
        ThresholdRule::new("Improve ROI Performance", RecommendationCategory::Roi, Priority::Medium, |m| m.roi.map(|r| r.roi_percentage), Threshold::Below(15.0), TargetValue::Fixed(20.0))
            .with_unit("%")
            .with_description("Return on investment is below the 15% benchmark for warehouse improvement projects.")
            .with_impact("A stronger business case and better use of capital.")
            .with_action_items([
                "Identify additional savings opportunities in adjacent processes",
                "Review scope for low-value components",
                "Track realised benefits against the plan each quarter",
            ]),
        ThresholdRule::new("Improve Labor Efficiency", RecommendationCategory::Operational, Priority::High, |m| m.operational.map(|o| o.labor_efficiency), Threshold::Below(70.0), TargetValue::Fixed(85.0))
            .with_unit("%")
            .with_description("Labor efficiency is below 70%, indicating idle time or unbalanced workloads.")
            .with_impact("Lower labor cost per order and higher throughput with the same headcount.")
            .with_action_items([
                "Introduce labor management and engineered standards",
                "Optimise pick paths and slotting",
                "Cross-train staff to balance workload across zones",
            ]),
        ThresholdRule::new("Optimize Space Utilization", RecommendationCategory::Operational, Priority::Medium, |m| m.operational.map(|o| o.space_utilization), Threshold::Below(75.0), TargetValue::Fixed(90.0))
            .with_unit("%")
            .with_description("Space utilization is below 75%, leaving storage capacity unused.")
            .with_impact("Deferred expansion costs and denser, faster storage.")
            .with_action_items([
                "Re-slot inventory by velocity",
                "Evaluate vertical storage and narrow-aisle racking",
                "Consolidate slow-moving stock",
            ]),
        ThresholdRule::new("Enhance Picking Accuracy", RecommendationCategory::Operational, Priority::High, |m| m.operational.map(|o| o.picking_accuracy), Threshold::Below(98.0), TargetValue::Fixed(99.5))
            .with_unit("%")
            .with_description("Picking accuracy is below 98%, driving returns and re-shipments.")
            .with_impact("Fewer customer complaints and lower cost of errors.")
            .with_action_items([
                "Deploy barcode or RFID scan verification",
                "Adopt pick-to-light or voice picking in high-volume zones",
                "Audit error-prone SKUs and locations",
            ]),
        ThresholdRule::new("Optimize Implementation Costs", RecommendationCategory::Financial, Priority::Medium, |m| m.financial.map(|f| f.implementation_cost), Threshold::Above(500_000.0), TargetValue::Scaled(0.8))
            .with_unit("USD")
            .with_description("Implementation cost exceeds 500,000, increasing project risk.")
            .with_impact("Reduced upfront capital requirement and a shorter payback period.")
            .with_action_items([
                "Request competitive bids from multiple vendors",
                "Consider leasing or phased equipment purchases",
                "Reuse existing infrastructure where possible",
            ]),
        ThresholdRule::new("Reduce Maintenance Costs", RecommendationCategory::Financial, Priority::Low, |m| m.financial.map(|f| f.maintenance_cost), Threshold::Above(50_000.0), TargetValue::Scaled(0.7))
            .with_unit("USD")
            .with_description("Annual maintenance cost exceeds 50,000.")
            .with_impact("Higher net savings over the life of the system.")
            .with_action_items([
                "Move to preventive maintenance schedules",
                "Renegotiate service level agreements",
                "Train in-house technicians for routine work",
            ]),
    ]
}

/// Fallback advice used when few specific rules fire
pub fn general_recommendations() -> Vec<Recommendation> {
    vec![
        Recommendation {
            category: RecommendationCategory::General,
            priority: Priority::Medium,
            title: "Establish Performance Baseline".to_string(),
            description: "Capture current operational and financial figures so improvements can be measured.".to_string(),
            impact: "Reliable measurement of ROI over time.".to_string(),
            action_items: vec![
                "Record baseline KPIs for labor, space and accuracy".to_string(),
                "Define a reporting cadence".to_string(),
            ],
            metrics: None,
        },
        Recommendation {
            category: RecommendationCategory::General,
            priority: Priority::Medium,
            title: "Develop Change Management Plan".to_string(),
            description: "Prepare staff and processes for the transition to new systems.".to_string(),
            impact: "Faster adoption and earlier realisation of benefits.".to_string(),
            action_items: vec![
                "Identify stakeholders and change champions".to_string(),
                "Plan training ahead of go-live".to_string(),
            ],
            metrics: None,
        },
    ]
}
