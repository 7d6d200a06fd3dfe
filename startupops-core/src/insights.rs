//! Strategic insight rules
//!
//! Rules are checked in a fixed priority order. A critical runway ends
//! evaluation on its own; otherwise every rule that matches is collected
//! and the list is cut to the first [`MAX_INSIGHTS`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::metrics::{DashboardMetrics, Runway};
use crate::money::Money;

/// Most insights shown at once
pub const MAX_INSIGHTS: usize = 2;

/// Runway below this many months is critical
pub const CRITICAL_RUNWAY_MONTHS: u32 = 3;
/// Monthly burn above this is considered heavy spending
pub const BURN_ALERT_THRESHOLD: Money = Money::from_units(20000);

/// Which rule produced an insight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InsightKind {
    RunwayCritical,
    ScalingTrap,
    BurnAlert,
    IdeaMaze,
    ProductMarketFit,
    OptimizeAndValidate,
}

/// Visual weight of an insight; only presentation reads it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
    Info,
    Growth,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Critical => write!(f, "critical"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
            Severity::Growth => write!(f, "growth"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insight {
    pub kind: InsightKind,
    pub severity: Severity,
    pub title: String,
    pub description: String,
}

/// The metric values the rules look at
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InsightInputs {
    pub runway: Runway,
    pub execution_score: u32,
    pub validation_score: u32,
    pub monthly_burn: Money,
}

impl From<&DashboardMetrics> for InsightInputs {
    fn from(metrics: &DashboardMetrics) -> Self {
        Self {
            runway: metrics.runway,
            execution_score: metrics.execution_score,
            validation_score: metrics.validation_score,
            monthly_burn: metrics.monthly_burn,
        }
    }
}

fn runway_critical(months: u32) -> Insight {
    Insight {
        kind: InsightKind::RunwayCritical,
        severity: Severity::Critical,
        title: "Runway Critical".to_string(),
        description: format!(
            "Only {} months of cash left at the current burn. Cut costs or close funding now.",
            months
        ),
    }
}

fn scaling_trap(input: &InsightInputs) -> Insight {
    Insight {
        kind: InsightKind::ScalingTrap,
        severity: Severity::Warning,
        title: "Scaling Trap".to_string(),
        description: format!(
            "Execution is strong ({}%) but Validation Score is low ({}%). You may be building something nobody wants.",
            input.execution_score, input.validation_score
        ),
    }
}

fn burn_alert(input: &InsightInputs) -> Insight {
    Insight {
        kind: InsightKind::BurnAlert,
        severity: Severity::Warning,
        title: "Burn Alert".to_string(),
        description: format!(
            "Monthly burn of {} is high while Validation Score is only {}%. Slow spending until demand is proven.",
            input.monthly_burn.round_units(),
            input.validation_score
        ),
    }
}

fn idea_maze(input: &InsightInputs) -> Insight {
    Insight {
        kind: InsightKind::IdeaMaze,
        severity: Severity::Info,
        title: "Idea Maze".to_string(),
        description: format!(
            "Execution ({}%) and validation ({}%) are both early. Pick one hypothesis and test it this week.",
            input.execution_score, input.validation_score
        ),
    }
}

fn product_market_fit(input: &InsightInputs) -> Insight {
    Insight {
        kind: InsightKind::ProductMarketFit,
        severity: Severity::Growth,
        title: "Product-Market Fit Signal".to_string(),
        description: format!(
            "Validation Score is {}% with execution at {}%. Time to invest in growth.",
            input.validation_score, input.execution_score
        ),
    }
}

fn optimize_and_validate() -> Insight {
    Insight {
        kind: InsightKind::OptimizeAndValidate,
        severity: Severity::Info,
        title: "Optimize & Validate".to_string(),
        description: "Metrics are stable. Keep shipping and talking to users to sharpen validation.".to_string(),
    }
}

/// Evaluates the insight rules against the current metrics
pub fn evaluate(input: &InsightInputs) -> Vec<Insight> {
    if let Runway::Finite(months) = input.runway {
        if months < CRITICAL_RUNWAY_MONTHS {
            return vec![runway_critical(months)];
        }
    }

    let exec = input.execution_score;
    let validation = input.validation_score;

    let rules: [(bool, fn(&InsightInputs) -> Insight); 4] = [
        (exec > 80 && validation < 40, scaling_trap),
        (input.monthly_burn > BURN_ALERT_THRESHOLD && validation < 50, burn_alert),
        (exec < 30 && validation < 30, idea_maze),
        (validation > 80 && exec > 70, product_market_fit),
    ];

    let mut insights: Vec<Insight> = rules
        .iter()
        .filter(|(matched, _)| *matched)
        .map(|(_, build)| build(input))
        .collect();

    if insights.is_empty() {
        insights.push(optimize_and_validate());
    }
    insights.truncate(MAX_INSIGHTS);
    insights
}

/// Convenience wrapper over [`evaluate`] for a full metrics snapshot
pub fn evaluate_metrics(metrics: &DashboardMetrics) -> Vec<Insight> {
    evaluate(&InsightInputs::from(metrics))
}
