use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(author, version, about = "StartupOps - founder metrics, roadmap board and strategic insights")]
pub struct Cli {
    /// Path to the workspace file (overrides STARTUPOPS_WORKSPACE and the config file)
    #[clap(long, global = true)]
    pub file: Option<PathBuf>,

    /// Act as this role (founder, member, or guest for the public form only);
    /// defaults to the configured role
    #[clap(long = "as", global = true, value_name = "ROLE")]
    pub as_role: Option<String>,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create the workspace file with sample data
    Init {
        /// Overwrite an existing workspace
        #[clap(long)]
        force: bool,
    },

    /// Show headline metrics and strategic insights
    Dashboard,

    /// Roadmap task board
    #[clap(subcommand)]
    Task(TaskCommand),

    /// Customer feedback and feature interest
    #[clap(subcommand)]
    Feedback(FeedbackCommand),

    /// Bank balance, burn, revenue and expenses
    #[clap(subcommand)]
    Finance(FinanceCommand),

    /// Team roster
    #[clap(subcommand)]
    Team(TeamCommand),

    /// Investor update summary
    Report {
        /// Output format
        #[clap(long, value_enum, default_value = "text")]
        format: ReportFormat,

        /// Write to a file instead of stdout
        #[clap(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// Inspect records mirrored to the document store
    Docs {
        /// Collection to list (tasks, feedback, financials, expenses, team)
        collection: Option<String>,

        /// Show this record's document
        #[clap(requires = "collection")]
        id: Option<String>,
    },
}

impl Command {
    /// Everything except the public validation form needs a signed-in user
    pub fn requires_sign_in(&self) -> bool {
        !matches!(self, Command::Feedback(FeedbackCommand::Submit { .. }))
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum TaskCommand {
    /// Add a task to the first lane
    Add {
        /// Task description
        #[clap(long)]
        content: Option<String>,

        /// Milestone tag (MVP, Beta, Growth)
        #[clap(long)]
        milestone: Option<String>,

        /// Assignee initials
        #[clap(long)]
        assignee: Option<String>,

        /// Use interactive mode (prompts)
        #[clap(long)]
        interactive: bool,
    },

    /// List tasks in board order
    List {
        /// Only tasks in this lane
        #[clap(long)]
        lane: Option<String>,

        /// Only tasks assigned to these initials
        #[clap(long)]
        assignee: Option<String>,
    },

    /// Show the board lane by lane
    Board,

    /// Move a task into a lane at a position within that lane
    Move {
        /// Task id (e.g. t3)
        id: String,

        /// Target lane id
        #[clap(long)]
        lane: String,

        /// Position within the lane, 0 = top; defaults to the bottom
        #[clap(long)]
        index: Option<usize>,
    },

    /// Drag a task and drop it onto another task or a lane
    Drop {
        /// Task being dragged
        id: String,

        /// Drop onto this task (reorders and adopts its lane)
        #[clap(long, conflicts_with = "lane")]
        onto: Option<String>,

        /// Drop onto this lane (changes lane only)
        #[clap(long)]
        lane: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
pub enum FeedbackCommand {
    /// Log feedback from a conversation
    Add {
        /// Who gave the feedback
        #[clap(long)]
        user: String,

        /// What they said
        #[clap(long)]
        comment: String,

        /// positive, neutral or negative
        #[clap(long, default_value = "positive")]
        sentiment: String,
    },

    /// Record a public validation form submission
    Submit {
        /// Submitter name
        #[clap(long)]
        name: String,

        /// Comment
        #[clap(long)]
        comment: String,

        /// Star rating from 1 to 5
        #[clap(long)]
        rating: u8,
    },

    /// Show recent feedback, newest first
    List {
        /// Show at most this many entries
        #[clap(long)]
        limit: Option<usize>,
    },

    /// Record or list feature interest scores
    Interest {
        /// Feature label; lists the scores when omitted
        #[clap(long, requires = "value")]
        label: Option<String>,

        /// Interest score from 0 to 100
        #[clap(long)]
        value: Option<u32>,

        /// positive, neutral or negative
        #[clap(long, default_value = "neutral")]
        sentiment: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum FinanceCommand {
    /// Show the financial snapshot and runway
    Show,

    /// Set a financial field (bank-balance, monthly-burn, mrr, previous-mrr)
    Set {
        field: String,
        value: String,
    },

    /// Record an expense
    ExpenseAdd {
        /// Merchant or vendor
        #[clap(long)]
        merchant: String,

        /// Category; defaults to General
        #[clap(long)]
        category: Option<String>,

        /// Amount, greater than zero
        #[clap(long)]
        amount: String,

        /// monthly or one-time
        #[clap(long, default_value = "monthly")]
        frequency: String,
    },

    /// Remove an expense and reverse its effect
    ExpenseRm {
        id: u64,

        /// Skip confirmation
        #[clap(long, short = 'y')]
        yes: bool,
    },

    /// List recorded expenses
    Expenses,

    /// Project the cash balance forward
    Projection {
        /// Number of months
        #[clap(long, default_value_t = 12)]
        months: usize,
    },
}

#[derive(Subcommand, Debug)]
pub enum TeamCommand {
    /// List team members
    List,

    /// Add a team member
    Add {
        #[clap(long)]
        name: String,

        /// Founder or Member
        #[clap(long, default_value = "Member")]
        role: String,

        #[clap(long)]
        email: String,
    },

    /// Edit a team member
    Edit {
        id: u64,

        #[clap(long)]
        name: Option<String>,

        #[clap(long)]
        role: Option<String>,

        #[clap(long)]
        email: Option<String>,

        /// Active, In Meeting or Offline
        #[clap(long)]
        status: Option<String>,

        /// Active task count shown on the roster
        #[clap(long)]
        tasks: Option<u32>,
    },

    /// Remove a team member
    Rm {
        id: u64,

        /// Skip confirmation
        #[clap(long, short = 'y')]
        yes: bool,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_task_drop() {
        let cli = Cli::try_parse_from(["startupops", "task", "drop", "t3", "--onto", "t1"]).unwrap();
        match cli.command {
            Command::Task(TaskCommand::Drop { id, onto, lane }) => {
                assert_eq!(id, "t3");
                assert_eq!(onto.as_deref(), Some("t1"));
                assert!(lane.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_drop_targets_conflict() {
        let result = Cli::try_parse_from(["startupops", "task", "drop", "t3", "--onto", "t1", "--lane", "done"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["startupops", "dashboard", "--as", "member", "--file", "x.yaml"]).unwrap();
        assert_eq!(cli.as_role.as_deref(), Some("member"));
        assert_eq!(cli.file, Some(PathBuf::from("x.yaml")));
    }

    #[test]
    fn test_team_role_is_separate_from_acting_role() {
        let cli = Cli::try_parse_from([
            "startupops", "--as", "founder", "team", "add", "--name", "Dana Ops", "--role", "Member", "--email", "d@x.io",
        ])
        .unwrap();
        assert_eq!(cli.as_role.as_deref(), Some("founder"));
        assert!(matches!(cli.command, Command::Team(TeamCommand::Add { ref role, .. }) if role == "Member"));
    }

    #[test]
    fn test_only_public_form_skips_sign_in() {
        let submit = Cli::try_parse_from([
            "startupops", "--as", "guest", "feedback", "submit", "--name", "Ana", "--comment", "Nice", "--rating", "5",
        ])
        .unwrap();
        assert!(!submit.command.requires_sign_in());

        let dashboard = Cli::try_parse_from(["startupops", "dashboard"]).unwrap();
        assert!(dashboard.command.requires_sign_in());

        let feedback = Cli::try_parse_from(["startupops", "feedback", "list"]).unwrap();
        assert!(feedback.command.requires_sign_in());
    }

    #[test]
    fn test_parse_docs() {
        let cli = Cli::try_parse_from(["startupops", "docs", "expenses", "3"]).unwrap();
        match cli.command {
            Command::Docs { collection, id } => {
                assert_eq!(collection.as_deref(), Some("expenses"));
                assert_eq!(id.as_deref(), Some("3"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_report_format() {
        let cli = Cli::try_parse_from(["startupops", "report", "--format", "json", "-o", "r.json"]).unwrap();
        match cli.command {
            Command::Report { format, output } => {
                assert_eq!(format, ReportFormat::Json);
                assert_eq!(output, Some(PathBuf::from("r.json")));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
