pub mod board;
pub mod config;
pub mod db;
pub mod error;
pub mod insights;
pub mod metrics;
pub mod models;
pub mod money;
pub mod report;
pub mod seed;
pub mod session;
pub mod storage;

// Re-export commonly used types
pub use board::{DragOutcome, DragSession, DropTarget, TaskBoard};
pub use config::{determine_workspace_path, get_config_path, AppConfig};
pub use db::{
    collections, open_document_store, persist_quietly, remove_quietly, DocumentStore, NullDocumentStore,
    SqliteDocumentStore, StoreType,
};
pub use error::OpsError;
pub use insights::{evaluate, evaluate_metrics, Insight, InsightInputs, InsightKind, Severity};
pub use metrics::{
    cash_projection, execution_score, growth_mom, health_score, runway_months, validation_score,
    DashboardMetrics, ProjectionPoint, Runway, SentimentBreakdown, RUNWAY_SENTINEL_MONTHS,
};
pub use models::{
    default_lanes, initials, parse_amount, ExpenseFrequency, ExpenseRecord, ExpenseStatus, FeatureInterest,
    FeedbackRecord, FinancialField, FinancialSnapshot, Lane, MemberStatus, NewExpense, Sentiment, Task,
    TeamMember, TeamMemberUpdate, WorkspaceStore,
};
pub use money::Money;
pub use report::{InvestorSummary, Phase, UpcomingItem};
pub use seed::seeded_store;
pub use session::{Role, Session, UserHandle};
pub use storage::Storage;
