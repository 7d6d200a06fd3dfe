use anyhow::Result;
use inquire::{Confirm, Select, Text};

use startupops_core::TeamMember;

/// Fields for a new task gathered interactively
pub struct TaskInput {
    pub content: String,
    pub milestone: String,
    pub assignee: String,
}

/// Prompts the user for a new task. Milestones come from the config,
/// assignees from the team roster.
pub fn prompt_new_task(milestones: &[String], team: &[TeamMember]) -> Result<TaskInput> {
    let content = Text::new("Task:")
        .with_validator(inquire::required!("A task needs a description"))
        .prompt()?;

    let milestone = if milestones.is_empty() {
        Text::new("Milestone:").prompt()?
    } else {
        Select::new("Milestone:", milestones.to_vec()).prompt()?
    };

    let assignee = if team.is_empty() {
        Text::new("Assignee initials:").prompt()?
    } else {
        let selection = Select::new("Assignee:", assignee_options(team)).raw_prompt()?;
        team[selection.index].avatar.clone()
    };

    Ok(TaskInput {
        content,
        milestone,
        assignee,
    })
}

/// One option per roster entry, in roster order, so a selected index maps
/// straight back to the member
fn assignee_options(team: &[TeamMember]) -> Vec<String> {
    team.iter().map(|m| format!("{} ({})", m.avatar, m.name)).collect()
}

/// Asks for confirmation before a destructive action, defaulting to no
pub fn confirm(message: &str) -> Result<bool> {
    Ok(Confirm::new(message).with_default(false).prompt()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use startupops_core::WorkspaceStore;

    #[test]
    fn test_assignee_options_keep_duplicates_apart() {
        let mut store = WorkspaceStore::default();
        store.add_team_member("Sam Evans".into(), "Member".into(), "sam@startupops.com".into());
        store.add_team_member("Sam Evans".into(), "Founder".into(), "sam.e@startupops.com".into());

        let options = assignee_options(&store.team);
        assert_eq!(options, vec!["SE (Sam Evans)", "SE (Sam Evans)"]);
        assert_eq!(options.len(), store.team.len());
        assert!(store.team[1].is_founder());
    }
}
