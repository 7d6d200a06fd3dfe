use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use crate::insights::{evaluate_metrics, Insight};
use crate::metrics::{DashboardMetrics, Runway};
use crate::models::WorkspaceStore;
use crate::money::Money;

/// Completed tasks listed in a summary
pub const MAX_COMPLETED: usize = 5;
/// Upcoming tasks listed in a summary
pub const MAX_UPCOMING: usize = 3;

/// Lane whose tasks are reported as "In Progress" rather than "Planned"
const IN_PROGRESS_LANE: &str = "in-progress";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    #[serde(rename = "In Progress")]
    InProgress,
    Planned,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::InProgress => write!(f, "In Progress"),
            Phase::Planned => write!(f, "Planned"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpcomingItem {
    pub item: String,
    pub phase: Phase,
}

/// Point-in-time investor update built from the workspace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestorSummary {
    pub company: String,
    pub generated_at: DateTime<Utc>,
    pub health_score: u32,
    pub validation_score: u32,
    pub execution_score: u32,
    pub growth_mom: i64,
    pub runway: Runway,
    pub mrr: Money,
    pub net_burn: Money,
    /// First completed tasks in board order
    pub completed: Vec<String>,
    /// First open tasks in board order
    pub upcoming: Vec<UpcomingItem>,
    pub insights: Vec<Insight>,
}

impl InvestorSummary {
    pub fn from_store(store: &WorkspaceStore) -> Self {
        Self::from_store_at(store, Utc::now())
    }

    pub fn from_store_at(store: &WorkspaceStore, generated_at: DateTime<Utc>) -> Self {
        let metrics = DashboardMetrics::compute(store);
        let done_lane = store.board.done_lane();

        let completed = store
            .board
            .tasks()
            .iter()
            .filter(|t| t.status == done_lane)
            .take(MAX_COMPLETED)
            .map(|t| t.content.clone())
            .collect();

        let upcoming = store
            .board
            .tasks()
            .iter()
            .filter(|t| t.status != done_lane)
            .take(MAX_UPCOMING)
            .map(|t| UpcomingItem {
                item: t.content.clone(),
                phase: if t.status == IN_PROGRESS_LANE {
                    Phase::InProgress
                } else {
                    Phase::Planned
                },
            })
            .collect();

        Self {
            company: store.name.clone(),
            generated_at,
            health_score: metrics.health_score,
            validation_score: metrics.validation_score,
            execution_score: metrics.execution_score,
            growth_mom: metrics.growth_mom,
            runway: metrics.runway,
            mrr: store.financials.mrr,
            net_burn: metrics.net_burn,
            completed,
            upcoming,
            insights: evaluate_metrics(&metrics),
        }
    }

    /// Plain-text rendering, one section per block
    pub fn render_text(&self) -> String {
        let mut out = String::new();

        let _ = writeln!(out, "{}", self.company);
        let _ = writeln!(out, "Investor Update Report - {}", self.generated_at.format("%b %Y"));
        let _ = writeln!(out);
        let _ = writeln!(out, "Health Score:     {}/100", self.health_score);
        let _ = writeln!(out, "Validation Score: {}%", self.validation_score);
        let _ = writeln!(out, "Execution Score:  {}%", self.execution_score);
        let _ = writeln!(out, "MRR:              {} ({:+}% MoM)", self.mrr.round_units(), self.growth_mom);
        let _ = writeln!(out, "Net Burn:         {}/mo", self.net_burn.round_units());
        let _ = writeln!(out, "Runway:           {}", self.runway);
        let _ = writeln!(out);

        let _ = writeln!(out, "Key Milestones Achieved");
        if self.completed.is_empty() {
            let _ = writeln!(out, "  (none yet)");
        }
        for item in &self.completed {
            let _ = writeln!(out, "  [x] {}", item);
        }
        let _ = writeln!(out);

        let _ = writeln!(out, "Upcoming Goals");
        if self.upcoming.is_empty() {
            let _ = writeln!(out, "  (nothing planned)");
        }
        for item in &self.upcoming {
            let _ = writeln!(out, "  [ ] {} ({})", item.item, item.phase);
        }

        if !self.insights.is_empty() {
            let _ = writeln!(out);
            let _ = writeln!(out, "Strategic Insights");
            for insight in &self.insights {
                let _ = writeln!(out, "  [{}] {}: {}", insight.severity, insight.title, insight.description);
            }
        }

        out
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Writes the text rendering to `output_path`
    pub fn export_text(&self, output_path: &Path) -> Result<()> {
        fs::write(output_path, self.render_text())
            .with_context(|| format!("Failed to write report to {:?}", output_path))?;
        log::info!("Exported investor summary to {}", output_path.display());
        Ok(())
    }

    /// Writes the JSON rendering to `output_path`
    pub fn export_json(&self, output_path: &Path) -> Result<()> {
        fs::write(output_path, self.to_json()?)
            .with_context(|| format!("Failed to write report to {:?}", output_path))?;
        log::info!("Exported investor summary to {}", output_path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::models::{default_lanes, Task};
    use crate::seed::seeded_store;
    use crate::board::TaskBoard;
    use tempfile::tempdir;

    fn task(id: &str, status: &str) -> Task {
        Task {
            id: id.to_string(),
            content: format!("Task {}", id),
            status: status.to_string(),
            milestone: "MVP".to_string(),
            assignee: "AF".to_string(),
        }
    }

    #[test]
    fn test_summary_from_seeded_store() {
        let store = seeded_store(&AppConfig::default()).unwrap();
        let summary = InvestorSummary::from_store(&store);

        assert_eq!(summary.health_score, 43);
        assert_eq!(summary.completed, vec!["Define MVP Features", "Set up Database Schema"]);
        assert_eq!(
            summary.upcoming,
            vec![
                UpcomingItem {
                    item: "Implement Authentication".into(),
                    phase: Phase::InProgress
                },
                UpcomingItem {
                    item: "Design Landing Page".into(),
                    phase: Phase::Planned
                },
                UpcomingItem {
                    item: "User feedback interviews".into(),
                    phase: Phase::Planned
                },
            ]
        );
    }

    #[test]
    fn test_completed_list_is_capped() {
        let mut store = WorkspaceStore::default();
        let tasks = (1..=8).map(|n| task(&format!("t{}", n), "done")).collect();
        store.board = TaskBoard::restore(default_lanes(), tasks);

        let summary = InvestorSummary::from_store(&store);
        assert_eq!(summary.completed.len(), MAX_COMPLETED);
        assert_eq!(summary.completed[0], "Task t1");
        assert!(summary.upcoming.is_empty());
        assert!(summary.render_text().contains("(nothing planned)"));
    }

    #[test]
    fn test_render_text_sections() {
        let store = seeded_store(&AppConfig::default()).unwrap();
        let text = InvestorSummary::from_store(&store).render_text();

        assert!(text.contains("Health Score:     43/100"));
        assert!(text.contains("Runway:           12 months"));
        assert!(text.contains("MRR:              5000 (+19% MoM)"));
        assert!(text.contains("Net Burn:         10000/mo"));
        assert!(text.contains("[x] Define MVP Features"));
        assert!(text.contains("[ ] Implement Authentication (In Progress)"));
        assert!(text.contains("Strategic Insights"));
    }

    #[test]
    fn test_export_json_round_trip() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("report.json");

        let store = seeded_store(&AppConfig::default())?;
        let summary = InvestorSummary::from_store(&store);
        summary.export_json(&path)?;

        let loaded: InvestorSummary = serde_json::from_str(&fs::read_to_string(&path)?)?;
        assert_eq!(loaded, summary);
        assert!(fs::read_to_string(&path)?.contains("\"In Progress\""));

        Ok(())
    }
}
