mod cli;
mod prompts;

use anyhow::{Context, Result};
use chrono::{Datelike, Utc};
use clap::Parser;
use colored::{ColoredString, Colorize};
use std::path::{Path, PathBuf};

use startupops_core::{
    cash_projection, collections, determine_workspace_path, evaluate_metrics, get_config_path,
    open_document_store, persist_quietly, remove_quietly, AppConfig, DashboardMetrics, DocumentStore,
    DragOutcome, DragSession, DropTarget, ExpenseFrequency, FinancialField, InvestorSummary, Money,
    NewExpense, NullDocumentStore, Role, Runway, Sentiment, SentimentBreakdown, Session, Severity,
    StoreType, Storage, TeamMemberUpdate, UserHandle, WorkspaceStore,
};

use crate::cli::{Cli, Command, FeedbackCommand, FinanceCommand, ReportFormat, TaskCommand, TeamCommand};

/// Everything a command handler needs, built once in `main`
struct App {
    storage: Storage,
    config: AppConfig,
    config_path: PathBuf,
    session: Session,
    documents: Box<dyn DocumentStore>,
}

impl App {
    fn load(&self) -> Result<WorkspaceStore> {
        self.storage.load(&self.config)
    }

    /// Applies `update_fn` under the workspace lock, creating the workspace
    /// first if needed
    fn update<F, T>(&self, update_fn: F) -> Result<(WorkspaceStore, T)>
    where
        F: FnOnce(&mut WorkspaceStore) -> Result<T>,
    {
        if !self.storage.exists() {
            self.load()?;
        }
        self.storage.update_atomically(update_fn)
    }

    fn docs(&self) -> &dyn DocumentStore {
        self.documents.as_ref()
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config_path = get_config_path()?;
    let config = AppConfig::load_or_default(&config_path)?;

    // Determine which workspace file to use
    let workspace_path = determine_workspace_path(cli.file.as_deref(), &config);
    log::debug!("Using workspace {:?}", workspace_path);

    let session = match cli.as_role.as_deref() {
        Some(role) if role.trim().eq_ignore_ascii_case("guest") => Session::anonymous(),
        Some(role) => Session::signed_in(UserHandle::local(), role.parse::<Role>()?),
        None => Session::signed_in(UserHandle::local(), config.default_role),
    };

    // The document store mirrors the workspace; the CLI keeps working without it
    let documents: Box<dyn DocumentStore> = match open_document_store(config.documents_path.as_deref().map(Path::new)) {
        Ok(store) => store,
        Err(e) => {
            log::warn!("Document store unavailable, continuing without it: {:#}", e);
            Box::new(NullDocumentStore)
        }
    };

    let app = App {
        storage: Storage::new(&workspace_path),
        session,
        config,
        config_path,
        documents,
    };

    if cli.command.requires_sign_in() {
        app.session.require_authenticated()?;
    }

    match &cli.command {
        Command::Init { force } => {
            init_workspace(&app, *force)?;
        }
        Command::Dashboard => {
            show_dashboard(&app)?;
        }
        Command::Task(task_cmd) => {
            handle_task_command(task_cmd, &app)?;
        }
        Command::Feedback(feedback_cmd) => {
            handle_feedback_command(feedback_cmd, &app)?;
        }
        Command::Finance(finance_cmd) => {
            handle_finance_command(finance_cmd, &app)?;
        }
        Command::Team(team_cmd) => {
            handle_team_command(team_cmd, &app)?;
        }
        Command::Report { format, output } => {
            handle_report_command(&app, *format, output.as_deref())?;
        }
        Command::Docs { collection, id } => {
            show_documents(&app, collection.as_deref(), id.as_deref())?;
        }
    }

    Ok(())
}

// =============================================================================
// Formatting helpers
// =============================================================================

/// Formats an amount with thousands separators; cents only when non-zero
fn money(amount: Money) -> String {
    let abs = amount.cents().unsigned_abs();
    let digits = (abs / 100).to_string();
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    if abs % 100 != 0 {
        grouped.push_str(&format!(".{:02}", abs % 100));
    }
    if amount.is_negative() {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

fn runway_label(runway: Runway) -> ColoredString {
    let text = runway.to_string();
    if runway.is_at_risk() {
        text.red().bold()
    } else if runway.needs_fundraising() {
        text.yellow()
    } else {
        text.green()
    }
}

fn severity_label(severity: Severity) -> ColoredString {
    let text = format!("[{}]", severity);
    match severity {
        Severity::Critical => text.red().bold(),
        Severity::Warning => text.yellow(),
        Severity::Info => text.blue(),
        Severity::Growth => text.green(),
    }
}

fn sentiment_label(sentiment: Sentiment) -> ColoredString {
    let text = sentiment.to_string();
    match sentiment {
        Sentiment::Positive => text.green(),
        Sentiment::Neutral => text.normal(),
        Sentiment::Negative => text.red(),
    }
}

fn score_label(score: u32) -> ColoredString {
    let text = format!("{}%", score);
    if score >= 70 {
        text.green()
    } else if score >= 40 {
        text.yellow()
    } else {
        text.red()
    }
}

// =============================================================================
// Init & dashboard
// =============================================================================

fn init_workspace(app: &App, force: bool) -> Result<()> {
    if app.storage.exists() && !force {
        anyhow::bail!(
            "Workspace already exists at {} (use --force to overwrite)",
            app.storage.path().display()
        );
    }

    AppConfig::create_default(&app.config_path)?;
    let store = app.storage.initialize(&app.config)?;

    for task in store.board.tasks() {
        persist_quietly(app.docs(), collections::TASKS, &task.id, task);
    }
    persist_quietly(app.docs(), collections::FINANCIALS, "current", &store.financials);

    println!("{}", "Workspace created!".green());
    println!("  File:   {}", app.storage.path().display());
    println!("  Config: {}", app.config_path.display());
    println!(
        "  {} tasks, {} team members, {} feedback entries",
        store.board.tasks().len(),
        store.team.len(),
        store.feedback.len()
    );

    Ok(())
}

fn show_dashboard(app: &App) -> Result<()> {
    let store = app.load()?;
    let metrics = DashboardMetrics::compute(&store);

    println!("{}", format!("{} Dashboard", store.name).bold());
    println!();
    println!("  Health Score:     {}", format!("{}/100", metrics.health_score).bold());
    println!("  Validation Score: {}", score_label(metrics.validation_score));
    println!("  Execution Score:  {}", score_label(metrics.execution_score));
    println!("  MRR Growth:       {:+}% MoM", metrics.growth_mom);
    println!("  Runway:           {}", runway_label(metrics.runway));
    println!("  Net Burn:         {}/mo", money(metrics.net_burn));
    println!();

    println!("{}", "Board".bold());
    for (lane, count) in store.board.lane_counts() {
        println!("  {:<14} {}", lane.title, count);
    }
    println!();

    print_sentiment(&metrics.sentiment);
    println!();

    println!("{}", "Strategic Insights".bold());
    for insight in evaluate_metrics(&metrics) {
        println!("  {} {}", severity_label(insight.severity), insight.title.bold());
        println!("      {}", insight.description);
    }

    Ok(())
}

fn print_sentiment(sentiment: &SentimentBreakdown) {
    println!(
        "{} {} positive, {} neutral, {} negative ({}% positive)",
        "Feedback:".bold(),
        sentiment.positive.to_string().green(),
        sentiment.neutral,
        sentiment.negative.to_string().red(),
        sentiment.positive_share()
    );
}

// =============================================================================
// Tasks
// =============================================================================

fn handle_task_command(cmd: &TaskCommand, app: &App) -> Result<()> {
    match cmd {
        TaskCommand::Add {
            content,
            milestone,
            assignee,
            interactive,
        } => {
            app.session.require_founder("add tasks")?;

            // Default to interactive mode if no content is provided
            let (content, milestone, assignee) = if *interactive || content.is_none() {
                let store = app.load()?;
                let input = prompts::prompt_new_task(&app.config.milestones, &store.team)?;
                (input.content, input.milestone, input.assignee)
            } else {
                (
                    content.clone().unwrap_or_default(),
                    milestone
                        .clone()
                        .or_else(|| app.config.milestones.first().cloned())
                        .unwrap_or_default(),
                    assignee.clone().unwrap_or_default(),
                )
            };

            if content.trim().is_empty() {
                anyhow::bail!("Task content cannot be empty. Use --content to describe the task.");
            }

            let (store, id) = app.update(|store| Ok(store.board.add_task(content, milestone, assignee)?))?;
            if let Some(task) = store.board.get_task(&id) {
                persist_quietly(app.docs(), collections::TASKS, &id, task);
                println!("{}", "Task added successfully!".green());
                println!("ID: {}  Lane: {}", id.green(), task.status);
            }
        }
        TaskCommand::List { lane, assignee } => {
            let store = app.load()?;
            if let Some(lane) = lane {
                if !store.board.has_lane(lane) {
                    anyhow::bail!("Unknown lane: {}", lane);
                }
            }

            let tasks: Vec<_> = store
                .board
                .tasks()
                .iter()
                .filter(|t| lane.as_ref().map_or(true, |l| &t.status == l))
                .filter(|t| assignee.as_ref().map_or(true, |a| t.assignee.eq_ignore_ascii_case(a)))
                .collect();

            if tasks.is_empty() {
                println!("{}", "No tasks found.".yellow());
                return Ok(());
            }

            for task in tasks {
                println!(
                    "{:<5} {:<13} {} ({}, {})",
                    task.id.cyan(),
                    format!("[{}]", task.status),
                    task.content,
                    task.milestone,
                    task.assignee
                );
            }
        }
        TaskCommand::Board => {
            let store = app.load()?;
            for lane in store.board.lanes() {
                let tasks = store.board.tasks_in_lane(&lane.id);
                println!("{} ({})", lane.title.bold(), tasks.len());
                if tasks.is_empty() {
                    println!("  {}", "(empty)".dimmed());
                }
                for task in tasks {
                    println!("  {:<5} {}  {} {}", task.id.cyan(), task.content, task.milestone.dimmed(), task.assignee);
                }
                println!();
            }
        }
        TaskCommand::Move { id, lane, index } => {
            let (store, found) =
                app.update(|store| Ok(store.board.move_task(id, lane, index.unwrap_or(usize::MAX))?))?;
            if !found {
                anyhow::bail!("Task not found: {}", id);
            }
            if let Some(task) = store.board.get_task(id) {
                persist_quietly(app.docs(), collections::TASKS, id, task);
            }
            println!("{} {} -> {}", "Moved".green(), id, lane);
        }
        TaskCommand::Drop { id, onto, lane } => {
            let target = match (onto, lane) {
                (Some(task_id), _) => Some(DropTarget::Task(task_id.clone())),
                (None, Some(lane_id)) => Some(DropTarget::Lane(lane_id.clone())),
                (None, None) => None,
            };

            let (store, outcome) = app.update(|store| {
                let drag = DragSession::begin(&store.board, id).with_context(|| format!("Task not found: {}", id))?;
                if let Some(target) = &target {
                    drag.hover(&mut store.board, target);
                }
                Ok(drag.drop_on(&mut store.board, target.as_ref()))
            })?;

            if let Some(task) = store.board.get_task(id) {
                persist_quietly(app.docs(), collections::TASKS, id, task);
            }

            match outcome {
                DragOutcome::NoOp => println!("{}", "Nothing to do.".yellow()),
                DragOutcome::Relabeled { from, to } => {
                    println!("{} {}: {} -> {}", "Moved".green(), id, from, to)
                }
                DragOutcome::Moved { from_index, to_index, .. } => {
                    let status = store.board.get_task(id).map(|t| t.status.as_str()).unwrap_or("");
                    println!(
                        "{} {} to position {} (was {}), lane {}",
                        "Moved".green(),
                        id,
                        to_index,
                        from_index,
                        status
                    );
                }
            }
        }
    }

    Ok(())
}

// =============================================================================
// Feedback
// =============================================================================

fn handle_feedback_command(cmd: &FeedbackCommand, app: &App) -> Result<()> {
    match cmd {
        FeedbackCommand::Add {
            user,
            comment,
            sentiment,
        } => {
            let sentiment: Sentiment = sentiment.parse()?;
            let (_, record) =
                app.update(|store| Ok(store.add_feedback(user.clone(), comment.clone(), sentiment).clone()))?;
            persist_quietly(app.docs(), collections::FEEDBACK, &record.id.to_string(), &record);
            println!("{} ({})", "Feedback logged.".green(), sentiment_label(record.sentiment));
        }
        FeedbackCommand::Submit { name, comment, rating } => {
            let (_, record) = app.update(|store| {
                Ok(store
                    .submit_public_feedback(name.clone(), comment.clone(), *rating)?
                    .clone())
            })?;
            persist_quietly(app.docs(), collections::FEEDBACK, &record.id.to_string(), &record);
            println!("{} Thanks, {}!", "Feedback submitted.".green(), record.user);
        }
        FeedbackCommand::List { limit } => {
            let store = app.load()?;
            let now = Utc::now();

            print_sentiment(&SentimentBreakdown::from_feedback(&store.feedback));
            println!();

            let limit = limit.unwrap_or(store.feedback.len());
            for record in store.feedback.iter().take(limit) {
                println!(
                    "{:<10} {:<16} {:<9} {}",
                    record.relative_age(now).dimmed(),
                    record.user,
                    sentiment_label(record.sentiment),
                    record.comment
                );
            }
        }
        FeedbackCommand::Interest { label, value, sentiment } => match label {
            Some(label) => {
                let value = value.context("--value is required with --label")?;
                let sentiment: Sentiment = sentiment.parse()?;
                let (store, id) =
                    app.update(|store| Ok(store.add_feature_interest(label.clone(), value, sentiment)))?;
                println!(
                    "{} {} (validation score now {}%)",
                    "Recorded interest".green(),
                    id,
                    startupops_core::validation_score(&store.feature_interest)
                );
            }
            None => {
                let store = app.load()?;
                for item in &store.feature_interest {
                    println!("{:<16} {:>3}  {}", item.label, item.value, sentiment_label(item.sentiment));
                }
                println!(
                    "Validation Score: {}",
                    score_label(startupops_core::validation_score(&store.feature_interest))
                );
            }
        },
    }

    Ok(())
}

// =============================================================================
// Finance
// =============================================================================

fn handle_finance_command(cmd: &FinanceCommand, app: &App) -> Result<()> {
    match cmd {
        FinanceCommand::Show => {
            let store = app.load()?;
            let fin = &store.financials;
            let runway = fin.runway();

            println!("{}", "Financials".bold());
            println!("  Bank Balance:  {}", money(fin.bank_balance));
            println!("  Monthly Burn:  {}", money(fin.monthly_burn));
            println!("  MRR:           {} ({:+}% MoM)", money(fin.mrr), fin.growth_mom());
            println!("  Net Burn:      {}/mo", money(fin.net_burn()));
            println!("  Runway:        {}", runway_label(runway));
            println!("  Tracked monthly expenses: {}", money(store.tracked_monthly_expenses()));

            if runway.needs_fundraising() {
                println!();
                println!(
                    "{}",
                    "Runway is under 9 months. Start fundraising now.".yellow().bold()
                );
            }
        }
        FinanceCommand::Set { field, value } => {
            app.session.require_founder("edit financials")?;
            let field: FinancialField = field.parse()?;

            let (store, new_value) = app.update(|store| Ok(store.update_financial_field(field, value)?))?;
            persist_quietly(app.docs(), collections::FINANCIALS, "current", &store.financials);

            println!("{} {} = {}", "Updated".green(), field, money(new_value));
            println!("Runway: {}", runway_label(store.financials.runway()));
        }
        FinanceCommand::ExpenseAdd {
            merchant,
            category,
            amount,
            frequency,
        } => {
            app.session.require_founder("add expenses")?;
            let expense = NewExpense {
                merchant: merchant.clone(),
                category: category.clone(),
                amount: startupops_core::parse_amount(amount)?,
                frequency: frequency.parse::<ExpenseFrequency>()?,
            };

            let (store, id) = app.update(|store| Ok(store.add_expense(expense)?))?;
            if let Some(record) = store.expenses.iter().find(|e| e.id == id) {
                persist_quietly(app.docs(), collections::EXPENSES, &id.to_string(), record);
            }
            persist_quietly(app.docs(), collections::FINANCIALS, "current", &store.financials);

            println!("{} (ID {})", "Expense added.".green(), id);
            println!("Runway: {}", runway_label(store.financials.runway()));
        }
        FinanceCommand::ExpenseRm { id, yes } => {
            app.session.require_founder("remove expenses")?;
            let store = app.load()?;
            let Some(expense) = store.expenses.iter().find(|e| e.id == *id) else {
                println!("{}", format!("No expense with ID {}; nothing changed.", id).yellow());
                return Ok(());
            };

            println!("{}", "Expense to remove:".yellow());
            println!(
                "  {} {} ({}, {})",
                expense.merchant,
                money(expense.amount),
                expense.category,
                expense.frequency
            );

            if !*yes && !prompts::confirm("Remove this expense?")? {
                println!("{}", "Removal cancelled.".yellow());
                return Ok(());
            }

            let (store, removed) = app.update(|store| Ok(store.remove_expense(*id)))?;
            if removed.is_some() {
                remove_quietly(app.docs(), collections::EXPENSES, &id.to_string());
                persist_quietly(app.docs(), collections::FINANCIALS, "current", &store.financials);
                println!("{}", "Expense removed.".green());
            }
        }
        FinanceCommand::Expenses => {
            let store = app.load()?;
            if store.expenses.is_empty() {
                println!("{}", "No expenses recorded.".yellow());
                return Ok(());
            }
            for e in &store.expenses {
                println!(
                    "{:<4} {}  {:<20} {:<16} {:>10}  {:<9} {}",
                    e.id,
                    e.date.format("%Y-%m-%d"),
                    e.merchant,
                    e.category,
                    money(e.amount),
                    e.frequency,
                    e.status
                );
            }
        }
        FinanceCommand::Projection { months } => {
            let store = app.load()?;
            let start_month = Utc::now().month0() as usize;

            println!("{:<5} {:>12} {:>10} {:>10}", "Month", "Cash", "Revenue", "Expenses");
            for point in cash_projection(&store.financials, *months, start_month) {
                let cash = format!("{:>12}", money(point.balance));
                let cash = if !point.balance.is_positive() { cash.red() } else { cash.normal() };
                println!(
                    "{:<5} {} {:>10} {:>10}",
                    point.month,
                    cash,
                    money(point.revenue),
                    money(point.expenses)
                );
            }
        }
    }

    Ok(())
}

// =============================================================================
// Team
// =============================================================================

fn handle_team_command(cmd: &TeamCommand, app: &App) -> Result<()> {
    match cmd {
        TeamCommand::List => {
            let store = app.load()?;
            let open = store.board.open_tasks_by_assignee();

            for m in &store.team {
                let role = if m.is_founder() { m.role.bold() } else { m.role.normal() };
                println!(
                    "{:<4} {} {:<18} {:<8} {:<26} {:<11} tasks: {} (board: {})",
                    m.id,
                    m.avatar.cyan(),
                    m.name,
                    role,
                    m.email,
                    m.status,
                    m.tasks,
                    open.get(&m.avatar).copied().unwrap_or(0)
                );
            }
        }
        TeamCommand::Add { name, role, email } => {
            app.session.require_founder("manage the team")?;
            let (store, id) = app.update(|store| Ok(store.add_team_member(name.clone(), role.clone(), email.clone())))?;
            if let Some(member) = store.get_team_member(id) {
                persist_quietly(app.docs(), collections::TEAM, &id.to_string(), member);
            }
            println!("{} (ID {})", "Team member added.".green(), id);
        }
        TeamCommand::Edit {
            id,
            name,
            role,
            email,
            status,
            tasks,
        } => {
            app.session.require_founder("manage the team")?;
            let update = TeamMemberUpdate {
                name: name.clone(),
                role: role.clone(),
                email: email.clone(),
                status: status.as_deref().map(str::parse).transpose()?,
                tasks: *tasks,
            };

            let (store, found) = app.update(|store| Ok(store.update_team_member(*id, update)))?;
            if !found {
                anyhow::bail!("Team member not found: {}", id);
            }
            if let Some(member) = store.get_team_member(*id) {
                persist_quietly(app.docs(), collections::TEAM, &id.to_string(), member);
            }
            println!("{}", "Team member updated.".green());
        }
        TeamCommand::Rm { id, yes } => {
            app.session.require_founder("manage the team")?;
            let store = app.load()?;
            let member = store
                .get_team_member(*id)
                .with_context(|| format!("Team member not found: {}", id))?;

            println!("{}", "Team member to remove:".yellow());
            println!("  {} ({}, {})", member.name, member.role, member.email);

            if !*yes && !prompts::confirm("Remove this team member?")? {
                println!("{}", "Removal cancelled.".yellow());
                return Ok(());
            }

            let (_, removed) = app.update(|store| Ok(store.remove_team_member(*id)))?;
            if removed.is_some() {
                remove_quietly(app.docs(), collections::TEAM, &id.to_string());
                println!("{}", "Team member removed.".green());
            }
        }
    }

    Ok(())
}

// =============================================================================
// Report
// =============================================================================

fn handle_report_command(app: &App, format: ReportFormat, output: Option<&Path>) -> Result<()> {
    let store = app.load()?;
    let summary = InvestorSummary::from_store(&store);

    match (format, output) {
        (ReportFormat::Text, None) => print!("{}", summary.render_text()),
        (ReportFormat::Json, None) => println!("{}", summary.to_json()?),
        (ReportFormat::Text, Some(path)) => {
            summary.export_text(path)?;
            println!("Exported report: {}", path.display());
        }
        (ReportFormat::Json, Some(path)) => {
            summary.export_json(path)?;
            println!("Exported report: {}", path.display());
        }
    }

    Ok(())
}

// =============================================================================
// Document store
// =============================================================================

fn show_documents(app: &App, collection: Option<&str>, id: Option<&str>) -> Result<()> {
    let docs = app.docs();
    if docs.store_type() == StoreType::Null {
        println!("{}", "No document store configured.".yellow());
        println!("Set documents_path in {}", app.config_path.display());
        return Ok(());
    }

    match (collection, id) {
        (None, _) => {
            println!("{} ({})", "Mirrored documents".bold(), docs.store_type());
            for name in collections::ALL {
                println!("  {:<12} {}", name, docs.list_ids(name)?.len());
            }
        }
        (Some(collection), None) => {
            let ids = docs.list_ids(collection)?;
            if ids.is_empty() {
                println!("{}", format!("No documents in {}.", collection).yellow());
            }
            for id in ids {
                println!("{}", id);
            }
        }
        (Some(collection), Some(id)) => match docs.load(collection, id)? {
            Some(body) => println!("{}", serde_json::to_string_pretty(&body)?),
            None => anyhow::bail!("No document {}/{}", collection, id),
        },
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_grouping() {
        assert_eq!(money(Money::ZERO), "0");
        assert_eq!(money(Money::from_units(999)), "999");
        assert_eq!(money(Money::from_units(1000)), "1,000");
        assert_eq!(money(Money::from_units(120000)), "120,000");
        assert_eq!(money(Money::from_cents(123456740)), "1,234,567.40");
        assert_eq!(money(Money::from_cents(20)), "0.20");
        assert_eq!(money(Money::from_units(-10000)), "-10,000");
    }
}
