use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::board::TaskBoard;
use crate::error::OpsError;
use crate::money::Money;

/// Sentiment attached to feedback and feature interest records
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    /// Maps a 1-5 star rating from the public validation form
    pub fn from_rating(rating: u8) -> Result<Self, OpsError> {
        match rating {
            4 | 5 => Ok(Sentiment::Positive),
            3 => Ok(Sentiment::Neutral),
            1 | 2 => Ok(Sentiment::Negative),
            other => Err(OpsError::InvalidRating(other)),
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sentiment::Positive => write!(f, "positive"),
            Sentiment::Neutral => write!(f, "neutral"),
            Sentiment::Negative => write!(f, "negative"),
        }
    }
}

impl FromStr for Sentiment {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "positive" | "pos" | "+" => Ok(Sentiment::Positive),
            "neutral" | "neu" | "0" => Ok(Sentiment::Neutral),
            "negative" | "neg" | "-" => Ok(Sentiment::Negative),
            _ => anyhow::bail!("Invalid sentiment: {} (expected positive, neutral or negative)", s),
        }
    }
}

/// A kanban lane, identified by `id` and displayed as `title`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Lane {
    pub id: String,
    pub title: String,
}

impl Lane {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }
}

/// The default lane set: backlog, todo, in-progress, done
pub fn default_lanes() -> Vec<Lane> {
    vec![
        Lane::new("backlog", "Backlog"),
        Lane::new("todo", "To Do"),
        Lane::new("in-progress", "In Progress"),
        Lane::new("done", "Done"),
    ]
}

/// A single roadmap task
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Task {
    /// Opaque identifier assigned at creation (e.g. "t8")
    pub id: String,

    /// Free-text description
    pub content: String,

    /// Lane id the task currently sits in
    pub status: String,

    /// Milestone tag such as MVP, Beta or Growth
    pub milestone: String,

    /// Team member reference (initials); not enforced
    pub assignee: String,
}

/// A logged piece of customer feedback. Never mutated once recorded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeedbackRecord {
    pub id: Uuid,
    pub user: String,
    pub comment: String,
    pub sentiment: Sentiment,
    pub date: DateTime<Utc>,
}

impl FeedbackRecord {
    pub fn new(user: String, comment: String, sentiment: Sentiment) -> Self {
        Self {
            id: Uuid::new_v4(),
            user,
            comment,
            sentiment,
            date: Utc::now(),
        }
    }

    /// Short relative age ("Just now", "5m ago", "2h ago", "1d ago")
    pub fn relative_age(&self, now: DateTime<Utc>) -> String {
        let age = now.signed_duration_since(self.date);
        if age < Duration::minutes(1) {
            "Just now".to_string()
        } else if age < Duration::hours(1) {
            format!("{}m ago", age.num_minutes())
        } else if age < Duration::days(1) {
            format!("{}h ago", age.num_hours())
        } else {
            format!("{}d ago", age.num_days())
        }
    }
}

/// Interest score for a feature, fed into the validation score
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureInterest {
    pub id: u64,
    pub label: String,
    /// 0-100
    pub value: u32,
    pub sentiment: Sentiment,
}

/// Editable financial inputs. Runway and net burn are always derived.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FinancialSnapshot {
    pub bank_balance: Money,
    pub monthly_burn: Money,
    pub mrr: Money,
    /// Last month's MRR. When absent, growth is reported against the
    /// current MRR (0%).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_mrr: Option<Money>,
}

impl FinancialSnapshot {
    pub fn new(bank_balance: Money, monthly_burn: Money, mrr: Money) -> Self {
        Self {
            bank_balance,
            monthly_burn,
            mrr,
            previous_mrr: None,
        }
    }

    /// Monthly expenses minus monthly recurring revenue
    pub fn net_burn(&self) -> Money {
        self.monthly_burn - self.mrr
    }

    pub fn previous_mrr_or_current(&self) -> Money {
        self.previous_mrr.unwrap_or(self.mrr)
    }

    /// Applies a raw text edit to one field. Non-numeric, non-finite and
    /// negative input is rejected and leaves the snapshot untouched.
    pub fn update_field(&mut self, field: FinancialField, raw: &str) -> Result<Money, OpsError> {
        let value = parse_amount(raw)?;
        match field {
            FinancialField::BankBalance => self.bank_balance = value,
            FinancialField::MonthlyBurn => self.monthly_burn = value,
            FinancialField::Mrr => self.mrr = value,
            FinancialField::PreviousMrr => self.previous_mrr = Some(value),
        }
        Ok(value)
    }
}

impl Default for FinancialSnapshot {
    fn default() -> Self {
        Self::new(Money::ZERO, Money::ZERO, Money::ZERO)
    }
}

/// Editable fields of [`FinancialSnapshot`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinancialField {
    BankBalance,
    MonthlyBurn,
    Mrr,
    PreviousMrr,
}

impl fmt::Display for FinancialField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FinancialField::BankBalance => write!(f, "bank-balance"),
            FinancialField::MonthlyBurn => write!(f, "monthly-burn"),
            FinancialField::Mrr => write!(f, "mrr"),
            FinancialField::PreviousMrr => write!(f, "previous-mrr"),
        }
    }
}

impl FromStr for FinancialField {
    type Err = OpsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "bank-balance" | "bank" | "cash" | "bankbalance" => Ok(FinancialField::BankBalance),
            "monthly-burn" | "burn" | "monthlyburn" => Ok(FinancialField::MonthlyBurn),
            "mrr" | "revenue" => Ok(FinancialField::Mrr),
            "previous-mrr" | "previousmrr" | "prev-mrr" => Ok(FinancialField::PreviousMrr),
            _ => Err(OpsError::UnknownField(s.to_string())),
        }
    }
}

/// Parses a non-negative amount from user input, exact to the cent
pub fn parse_amount(raw: &str) -> Result<Money, OpsError> {
    let value: Money = raw.parse()?;
    if value.is_negative() {
        return Err(OpsError::InvalidAmount(raw.to_string()));
    }
    Ok(value)
}

/// How an expense affects the financial snapshot
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ExpenseFrequency {
    /// Adds to monthly burn
    #[serde(rename = "monthly")]
    Monthly,
    /// Paid once out of the bank balance
    #[serde(rename = "one-time")]
    OneTime,
}

impl fmt::Display for ExpenseFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpenseFrequency::Monthly => write!(f, "monthly"),
            ExpenseFrequency::OneTime => write!(f, "one-time"),
        }
    }
}

impl FromStr for ExpenseFrequency {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "monthly" | "recurring" => Ok(ExpenseFrequency::Monthly),
            "one-time" | "onetime" | "one_time" | "once" => Ok(ExpenseFrequency::OneTime),
            _ => anyhow::bail!("Invalid frequency: {} (expected monthly or one-time)", s),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseStatus {
    #[default]
    Pending,
    Cleared,
}

impl fmt::Display for ExpenseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpenseStatus::Pending => write!(f, "pending"),
            ExpenseStatus::Cleared => write!(f, "cleared"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExpenseRecord {
    pub id: u64,
    pub category: String,
    pub merchant: String,
    pub amount: Money,
    pub date: DateTime<Utc>,
    #[serde(default)]
    pub status: ExpenseStatus,
    pub frequency: ExpenseFrequency,
}

/// Input for a new expense; the store assigns id, date and status
#[derive(Debug, Clone)]
pub struct NewExpense {
    pub merchant: String,
    pub category: Option<String>,
    pub amount: Money,
    pub frequency: ExpenseFrequency,
}

/// Presence status of a team member
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum MemberStatus {
    Active,
    #[serde(rename = "In Meeting")]
    InMeeting,
    Offline,
}

impl fmt::Display for MemberStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberStatus::Active => write!(f, "Active"),
            MemberStatus::InMeeting => write!(f, "In Meeting"),
            MemberStatus::Offline => write!(f, "Offline"),
        }
    }
}

impl FromStr for MemberStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', '_'], " ").as_str() {
            "active" => Ok(MemberStatus::Active),
            "in meeting" | "meeting" => Ok(MemberStatus::InMeeting),
            "offline" => Ok(MemberStatus::Offline),
            _ => anyhow::bail!("Invalid member status: {}", s),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TeamMember {
    pub id: u64,
    pub name: String,
    /// Free text; "Founder" grants founder privileges
    pub role: String,
    pub email: String,
    pub status: MemberStatus,
    /// Manually maintained count, independent of board assignments
    pub tasks: u32,
    /// Initials
    pub avatar: String,
}

impl TeamMember {
    pub fn is_founder(&self) -> bool {
        self.role.trim().eq_ignore_ascii_case("founder")
    }
}

/// Builds avatar initials from a display name ("Sarah Engineer" -> "SE")
pub fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|part| part.chars().next())
        .take(2)
        .flat_map(|c| c.to_uppercase())
        .collect()
}

/// Partial update for a team member; `None` keeps the current value
#[derive(Debug, Clone, Default)]
pub struct TeamMemberUpdate {
    pub name: Option<String>,
    pub role: Option<String>,
    pub email: Option<String>,
    pub status: Option<MemberStatus>,
    pub tasks: Option<u32>,
}

/// All state of one founder workspace
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceStore {
    #[serde(default = "default_workspace_name")]
    pub name: String,
    pub board: TaskBoard,
    #[serde(default)]
    pub feature_interest: Vec<FeatureInterest>,
    /// Newest first
    #[serde(default)]
    pub feedback: Vec<FeedbackRecord>,
    #[serde(default)]
    pub financials: FinancialSnapshot,
    #[serde(default)]
    pub expenses: Vec<ExpenseRecord>,
    #[serde(default)]
    pub team: Vec<TeamMember>,
    #[serde(default = "default_next_record_id")]
    pub next_record_id: u64,
}

fn default_workspace_name() -> String {
    "StartupOps".to_string()
}

fn default_next_record_id() -> u64 {
    1
}

impl WorkspaceStore {
    /// Creates an empty workspace with the given lanes
    pub fn new(lanes: Vec<Lane>) -> Self {
        Self {
            name: default_workspace_name(),
            board: TaskBoard::new(lanes),
            feature_interest: Vec::new(),
            feedback: Vec::new(),
            financials: FinancialSnapshot::default(),
            expenses: Vec::new(),
            team: Vec::new(),
            next_record_id: 1,
        }
    }

    fn take_record_id(&mut self) -> u64 {
        let id = self.next_record_id;
        self.next_record_id += 1;
        id
    }

    // =========================================================================
    // Feedback
    // =========================================================================

    /// Logs feedback from the internal form; newest first
    pub fn add_feedback(&mut self, user: String, comment: String, sentiment: Sentiment) -> &FeedbackRecord {
        let record = FeedbackRecord::new(user, comment, sentiment);
        log::info!("Recorded {} feedback {}", record.sentiment, record.id);
        self.feedback.insert(0, record);
        &self.feedback[0]
    }

    /// Records a public validation form submission, mapping the star rating
    /// to a sentiment
    pub fn submit_public_feedback(
        &mut self,
        name: String,
        comment: String,
        rating: u8,
    ) -> Result<&FeedbackRecord, OpsError> {
        let sentiment = Sentiment::from_rating(rating)?;
        Ok(self.add_feedback(name, comment, sentiment))
    }

    /// Adds a feature interest entry, clamping the score to 0-100
    pub fn add_feature_interest(&mut self, label: String, value: u32, sentiment: Sentiment) -> u64 {
        let id = self.take_record_id();
        self.feature_interest.push(FeatureInterest {
            id,
            label,
            value: value.min(100),
            sentiment,
        });
        id
    }

    // =========================================================================
    // Financials & expenses
    // =========================================================================

    pub fn update_financial_field(&mut self, field: FinancialField, raw: &str) -> Result<Money, OpsError> {
        let value = self.financials.update_field(field, raw)?;
        log::info!("Updated {} to {}", field, value);
        Ok(value)
    }

    /// Records an expense and applies it to the snapshot: monthly expenses
    /// raise the burn, one-time expenses come out of the bank balance.
    pub fn add_expense(&mut self, expense: NewExpense) -> Result<u64, OpsError> {
        if !expense.amount.is_positive() {
            return Err(OpsError::InvalidAmount(expense.amount.to_string()));
        }

        match expense.frequency {
            ExpenseFrequency::Monthly => self.financials.monthly_burn += expense.amount,
            ExpenseFrequency::OneTime => self.financials.bank_balance -= expense.amount,
        }

        let id = self.take_record_id();
        let category = expense
            .category
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| "General".to_string());
        self.expenses.insert(
            0,
            ExpenseRecord {
                id,
                category,
                merchant: expense.merchant,
                amount: expense.amount,
                date: Utc::now(),
                status: ExpenseStatus::Pending,
                frequency: expense.frequency,
            },
        );
        log::info!("Added {} expense {} ({})", expense.frequency, id, expense.amount);
        Ok(id)
    }

    /// Removes an expense and reverses its effect on the snapshot.
    /// Unknown ids are a no-op.
    pub fn remove_expense(&mut self, id: u64) -> Option<ExpenseRecord> {
        let pos = self.expenses.iter().position(|e| e.id == id)?;
        let removed = self.expenses.remove(pos);

        match removed.frequency {
            ExpenseFrequency::Monthly => {
                self.financials.monthly_burn = (self.financials.monthly_burn - removed.amount).max(Money::ZERO);
            }
            ExpenseFrequency::OneTime => self.financials.bank_balance += removed.amount,
        }

        log::info!("Removed expense {}", id);
        Some(removed)
    }

    /// Sum of tracked monthly expenses
    pub fn tracked_monthly_expenses(&self) -> Money {
        self.expenses
            .iter()
            .filter(|e| e.frequency == ExpenseFrequency::Monthly)
            .map(|e| e.amount)
            .sum()
    }

    // =========================================================================
    // Team
    // =========================================================================

    pub fn add_team_member(&mut self, name: String, role: String, email: String) -> u64 {
        let id = self.take_record_id();
        let avatar = initials(&name);
        self.team.push(TeamMember {
            id,
            name,
            role,
            email,
            status: MemberStatus::Active,
            tasks: 0,
            avatar,
        });
        log::info!("Added team member {}", id);
        id
    }

    pub fn get_team_member(&self, id: u64) -> Option<&TeamMember> {
        self.team.iter().find(|m| m.id == id)
    }

    /// Applies a partial update. Returns false when the member does not exist.
    pub fn update_team_member(&mut self, id: u64, update: TeamMemberUpdate) -> bool {
        let Some(member) = self.team.iter_mut().find(|m| m.id == id) else {
            return false;
        };

        if let Some(name) = update.name {
            member.avatar = initials(&name);
            member.name = name;
        }
        if let Some(role) = update.role {
            member.role = role;
        }
        if let Some(email) = update.email {
            member.email = email;
        }
        if let Some(status) = update.status {
            member.status = status;
        }
        if let Some(tasks) = update.tasks {
            member.tasks = tasks;
        }
        true
    }

    /// Removes a member. Tasks assigned to them are left as they are.
    pub fn remove_team_member(&mut self, id: u64) -> Option<TeamMember> {
        let pos = self.team.iter().position(|m| m.id == id)?;
        log::info!("Removed team member {}", id);
        Some(self.team.remove(pos))
    }
}

impl Default for WorkspaceStore {
    fn default() -> Self {
        Self::new(default_lanes())
    }
}
