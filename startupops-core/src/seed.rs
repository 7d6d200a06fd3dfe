//! Sample workspace written by `init`

use chrono::{Duration, Utc};

use crate::board::TaskBoard;
use crate::config::AppConfig;
use crate::error::OpsError;
use crate::models::{
    ExpenseFrequency, ExpenseRecord, ExpenseStatus, FeedbackRecord, FinancialSnapshot,
    MemberStatus, Sentiment, Task, TeamMember, WorkspaceStore,
};
use crate::money::Money;

// (id, content, lane, milestone, assignee)
const SAMPLE_TASKS: [(&str, &str, &str, &str, &str); 7] = [
    ("t1", "Define MVP Features", "done", "MVP", "AF"),
    ("t2", "Set up Database Schema", "done", "MVP", "SE"),
    ("t3", "Implement Authentication", "in-progress", "MVP", "SE"),
    ("t4", "Design Landing Page", "todo", "MVP", "MD"),
    ("t5", "User feedback interviews", "todo", "Beta", "AF"),
    ("t6", "Performance Optimization", "backlog", "Beta", "SE"),
    ("t7", "Mobile App Wireframes", "backlog", "Growth", "MD"),
];

// (name, role, email, status, tasks)
const SAMPLE_TEAM: [(&str, &str, &str, MemberStatus, u32); 4] = [
    ("Alex Founder", "Founder", "alex@startupops.com", MemberStatus::Active, 3),
    ("Sarah Engineer", "Member", "sarah@startupops.com", MemberStatus::Active, 5),
    ("Mike Design", "Member", "mike@startupops.com", MemberStatus::InMeeting, 2),
    ("Emily Growth", "Member", "emily@startupops.com", MemberStatus::Offline, 0),
];

const SAMPLE_INTEREST: [(&str, u32, Sentiment); 4] = [
    ("Feature A", 80, Sentiment::Positive),
    ("Feature B", 45, Sentiment::Neutral),
    ("Feature C", 20, Sentiment::Negative),
    ("Pricing", 65, Sentiment::Positive),
];

// (user, comment, sentiment, hours ago), newest first
const SAMPLE_FEEDBACK: [(&str, &str, Sentiment, i64); 3] = [
    ("Sarah J.", "Love the new dashboard layout!", Sentiment::Positive, 2),
    ("Mike T.", "Can't find the export button.", Sentiment::Negative, 5),
    ("Alex R.", "It's okay, but needs dark mode.", Sentiment::Neutral, 24),
];

// (merchant, category, whole units, frequency)
const SAMPLE_EXPENSES: [(&str, &str, i64, ExpenseFrequency); 3] = [
    ("AWS", "Infrastructure", 1200, ExpenseFrequency::Monthly),
    ("WeWork", "Office", 2500, ExpenseFrequency::Monthly),
    ("Incorporation Filing", "Legal", 800, ExpenseFrequency::OneTime),
];

/// Builds the sample workspace on the configured lanes. Sample tasks whose
/// lane is not configured start in the first lane instead.
pub fn seeded_store(config: &AppConfig) -> Result<WorkspaceStore, OpsError> {
    let empty = config.new_board()?;
    let first_lane = empty
        .first_lane_id()
        .ok_or_else(|| OpsError::InvalidConfig("at least one lane is required".to_string()))?
        .to_string();

    let tasks = SAMPLE_TASKS
        .iter()
        .map(|(id, content, lane, milestone, assignee)| Task {
            id: id.to_string(),
            content: content.to_string(),
            status: if empty.has_lane(lane) {
                lane.to_string()
            } else {
                first_lane.clone()
            },
            milestone: milestone.to_string(),
            assignee: assignee.to_string(),
        })
        .collect();

    let mut board = TaskBoard::restore(config.lanes.clone(), tasks);
    board.set_done_lane(&config.done_lane)?;

    let mut store = WorkspaceStore::new(config.lanes.clone());
    store.board = board;
    store.financials = FinancialSnapshot {
        bank_balance: Money::from_units(120000),
        monthly_burn: Money::from_units(15000),
        mrr: Money::from_units(5000),
        previous_mrr: Some(Money::from_units(4200)),
    };

    for (label, value, sentiment) in SAMPLE_INTEREST {
        store.add_feature_interest(label.to_string(), value, sentiment);
    }

    let now = Utc::now();
    store.feedback = SAMPLE_FEEDBACK
        .iter()
        .map(|(user, comment, sentiment, hours)| {
            let mut record = FeedbackRecord::new(user.to_string(), comment.to_string(), *sentiment);
            record.date = now - Duration::hours(*hours);
            record
        })
        .collect();

    // Sample expenses are already reflected in the sample burn and balance
    let mut next_id = store.next_record_id;
    for (merchant, category, amount, frequency) in SAMPLE_EXPENSES {
        store.expenses.push(ExpenseRecord {
            id: next_id,
            category: category.to_string(),
            merchant: merchant.to_string(),
            amount: Money::from_units(amount),
            date: now,
            status: ExpenseStatus::Cleared,
            frequency,
        });
        next_id += 1;
    }

    for (name, role, email, status, tasks) in SAMPLE_TEAM {
        store.team.push(TeamMember {
            id: next_id,
            name: name.to_string(),
            role: role.to_string(),
            email: email.to_string(),
            status,
            tasks,
            avatar: crate::models::initials(name),
        });
        next_id += 1;
    }
    store.next_record_id = next_id;

    log::info!(
        "Seeded workspace with {} tasks and {} team members",
        store.board.tasks().len(),
        store.team.len()
    );
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::{DashboardMetrics, Runway};
    use crate::models::Lane;

    #[test]
    fn test_seeded_store_matches_dashboard_sample() {
        let store = seeded_store(&AppConfig::default()).unwrap();
        let metrics = DashboardMetrics::compute(&store);

        assert_eq!(store.board.tasks().len(), 7);
        assert_eq!(store.board.done_count(), 2);
        assert_eq!(metrics.validation_score, 53);
        assert_eq!(metrics.execution_score, 29);
        assert_eq!(metrics.health_score, 43);
        assert_eq!(metrics.runway, Runway::Finite(12));
        assert_eq!(metrics.growth_mom, 19);
    }

    #[test]
    fn test_seeded_ids_do_not_collide() {
        let mut store = seeded_store(&AppConfig::default()).unwrap();

        let task_id = store.board.add_task("New".into(), "MVP".into(), "AF".into()).unwrap();
        assert_eq!(task_id, "t8");

        let member_id = store.add_team_member("Dana Ops".into(), "Member".into(), "dana@startupops.com".into());
        assert!(store.expenses.iter().all(|e| e.id != member_id));
        assert!(store.team.iter().filter(|m| m.id == member_id).count() == 1);
    }

    #[test]
    fn test_seeded_team_and_feedback() {
        let store = seeded_store(&AppConfig::default()).unwrap();

        let founders: Vec<_> = store.team.iter().filter(|m| m.is_founder()).collect();
        assert_eq!(founders.len(), 1);
        assert_eq!(founders[0].avatar, "AF");

        assert_eq!(store.feedback[0].user, "Sarah J.");
        assert!(store.feedback[0].date > store.feedback[1].date);
    }

    #[test]
    fn test_unknown_sample_lanes_fall_back_to_first_lane() {
        let config = AppConfig {
            lanes: vec![Lane::new("ideas", "Ideas"), Lane::new("done", "Done")],
            ..AppConfig::default()
        };
        let store = seeded_store(&config).unwrap();

        let lanes: Vec<&str> = store.board.tasks().iter().map(|t| t.status.as_str()).collect();
        assert_eq!(lanes, vec!["done", "done", "ideas", "ideas", "ideas", "ideas", "ideas"]);
    }
}
