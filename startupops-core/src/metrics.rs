//! Derived dashboard metrics
//!
//! Everything here is recomputed from the stored records on every read;
//! none of these values is persisted.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::{FeatureInterest, FeedbackRecord, FinancialSnapshot, Sentiment, Task, WorkspaceStore};
use crate::money::Money;

/// Months reported for [`Runway::Unbounded`] by consumers that need a number
pub const RUNWAY_SENTINEL_MONTHS: u32 = 999;

/// Weight of the validation score in the health score, in tenths
const VALIDATION_WEIGHT: u32 = 6;
/// Weight of the execution score in the health score, in tenths
const EXECUTION_WEIGHT: u32 = 4;
/// Ceiling of a single feature interest value
const MAX_INTEREST: u32 = 100;

/// Months of cash left at the current net burn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "months", rename_all = "lowercase")]
pub enum Runway {
    Finite(u32),
    /// Revenue covers expenses; cash is not being consumed
    Unbounded,
}

impl Runway {
    /// Month count, with [`RUNWAY_SENTINEL_MONTHS`] for an unbounded runway
    pub fn months(&self) -> u32 {
        match self {
            Runway::Finite(m) => *m,
            Runway::Unbounded => RUNWAY_SENTINEL_MONTHS,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        matches!(self, Runway::Unbounded)
    }

    /// True for a finite runway strictly shorter than `months`
    pub fn is_below(&self, months: u32) -> bool {
        matches!(self, Runway::Finite(m) if *m < months)
    }

    /// Under six months
    pub fn is_at_risk(&self) -> bool {
        self.is_below(6)
    }

    /// Under nine months: time to start raising
    pub fn needs_fundraising(&self) -> bool {
        self.is_below(9)
    }
}

impl fmt::Display for Runway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Runway::Finite(1) => write!(f, "1 month"),
            Runway::Finite(m) => write!(f, "{} months", m),
            Runway::Unbounded => write!(f, "unlimited (profitable)"),
        }
    }
}

/// Integer division rounded half up
fn div_round(numerator: u64, denominator: u64) -> u64 {
    (2 * numerator + denominator) / (2 * denominator)
}

/// Integer division rounded half up, for signed values and a positive
/// denominator
fn div_round_signed(numerator: i128, denominator: i128) -> i128 {
    (2 * numerator + denominator).div_euclid(2 * denominator)
}

/// Mean feature interest, rounded. An empty list scores 0. Values above
/// 100 count as 100.
pub fn validation_score(items: &[FeatureInterest]) -> u32 {
    let total: u64 = items.iter().map(|i| u64::from(i.value.min(MAX_INTEREST))).sum();
    let count = items.len().max(1) as u64;
    div_round(total, count) as u32
}

/// Percentage of tasks in `done_lane`, rounded. An empty board scores 0.
pub fn execution_score(tasks: &[Task], done_lane: &str) -> u32 {
    let done = tasks.iter().filter(|t| t.status == done_lane).count() as u64;
    let total = tasks.len().max(1) as u64;
    div_round(100 * done, total) as u32
}

/// `round(0.6 * validation + 0.4 * execution)`
pub fn health_score(validation: u32, execution: u32) -> u32 {
    let weighted = u64::from(VALIDATION_WEIGHT) * u64::from(validation)
        + u64::from(EXECUTION_WEIGHT) * u64::from(execution);
    div_round(weighted, 10) as u32
}

/// Month-over-month MRR growth in percent. A zero previous MRR is treated
/// as one currency unit.
pub fn growth_mom(mrr: Money, previous_mrr: Money) -> i64 {
    let base = if previous_mrr == Money::ZERO {
        Money::from_units(1)
    } else {
        previous_mrr
    };
    let change = 100 * (i128::from(mrr.cents()) - i128::from(previous_mrr.cents()));
    let base = i128::from(base.cents());
    // Rounding needs a positive denominator
    let (change, base) = if base < 0 { (-change, -base) } else { (change, base) };
    div_round_signed(change, base).clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
}

/// Runway from the stored financial fields. Zero or negative net burn is
/// unbounded; an overdrawn balance reports zero months.
pub fn runway_months(bank_balance: Money, monthly_burn: Money, mrr: Money) -> Runway {
    let net_burn = monthly_burn - mrr;
    if !net_burn.is_positive() {
        return Runway::Unbounded;
    }
    let months = div_round_signed(i128::from(bank_balance.cents()), i128::from(net_burn.cents()));
    Runway::Finite(months.clamp(0, i128::from(u32::MAX)) as u32)
}

impl FinancialSnapshot {
    pub fn runway(&self) -> Runway {
        runway_months(self.bank_balance, self.monthly_burn, self.mrr)
    }

    pub fn growth_mom(&self) -> i64 {
        growth_mom(self.mrr, self.previous_mrr_or_current())
    }
}

/// Counts of feedback by sentiment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentBreakdown {
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
}

impl SentimentBreakdown {
    pub fn from_feedback(records: &[FeedbackRecord]) -> Self {
        records.iter().fold(Self::default(), |mut acc, r| {
            match r.sentiment {
                Sentiment::Positive => acc.positive += 1,
                Sentiment::Neutral => acc.neutral += 1,
                Sentiment::Negative => acc.negative += 1,
            }
            acc
        })
    }

    pub fn total(&self) -> usize {
        self.positive + self.neutral + self.negative
    }

    /// Share of positive feedback in percent, 0 when there is none
    pub fn positive_share(&self) -> u32 {
        let total = self.total().max(1) as u64;
        div_round(100 * self.positive as u64, total) as u32
    }
}

/// One month of the cash projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectionPoint {
    pub month: String,
    /// Cash at the start of the month, floored at zero
    pub balance: Money,
    pub revenue: Money,
    pub expenses: Money,
}

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Projects cash for `months` months starting at `start_month`
/// (0 = January), consuming one month of net burn per step.
pub fn cash_projection(snapshot: &FinancialSnapshot, months: usize, start_month: usize) -> Vec<ProjectionPoint> {
    let net_burn = snapshot.net_burn();
    let mut cash = snapshot.bank_balance;

    (0..months)
        .map(|i| {
            let point = ProjectionPoint {
                month: MONTH_NAMES[(start_month + i) % 12].to_string(),
                balance: cash.max(Money::ZERO),
                revenue: snapshot.mrr,
                expenses: snapshot.monthly_burn,
            };
            cash -= net_burn;
            point
        })
        .collect()
}

/// All headline numbers for the dashboard, computed in one pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardMetrics {
    pub validation_score: u32,
    pub execution_score: u32,
    pub health_score: u32,
    pub growth_mom: i64,
    pub runway: Runway,
    pub net_burn: Money,
    pub monthly_burn: Money,
    pub sentiment: SentimentBreakdown,
}

impl DashboardMetrics {
    pub fn compute(store: &WorkspaceStore) -> Self {
        let validation = validation_score(&store.feature_interest);
        let execution = execution_score(store.board.tasks(), store.board.done_lane());
        let metrics = Self {
            validation_score: validation,
            execution_score: execution,
            health_score: health_score(validation, execution),
            growth_mom: store.financials.growth_mom(),
            runway: store.financials.runway(),
            net_burn: store.financials.net_burn(),
            monthly_burn: store.financials.monthly_burn,
            sentiment: SentimentBreakdown::from_feedback(&store.feedback),
        };
        log::debug!(
            "Recomputed metrics: health {} (validation {}, execution {}), runway {}",
            metrics.health_score,
            metrics.validation_score,
            metrics.execution_score,
            metrics.runway
        );
        metrics
    }
}
