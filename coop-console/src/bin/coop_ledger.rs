use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use tracing_subscriber::prelude::*;

use coop_console::actions;
use coop_console::config::ConsoleConfig;
use coop_console::views::{
    ContributionsView, DashboardView, EmiListView, FormError, LoanDetailsView, LoanSearchView,
};
use coop_console::{ApiError, HttpSocietyApi, Session, SnapshotSource, SocietyApi};
use projections::format::{
    optional_duration, optional_rate, owner_label, status_label, user_display_name,
};
use projections::{ContributionFilter, DisplayFormat, LoanUpdateForm};
use shared_types::{InstallmentStatus, Loan, LoanStatus, Role, UserRef};

#[derive(Parser, Debug)]
#[command(name = "coop-ledger", author, version, about = "Society loan ledger console")]
struct Cli {
    /// Config file (defaults to <config dir>/coop-ledger/console.toml)
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    /// Read from a directory of saved backend responses instead of the server
    #[arg(long, value_name = "DIR", global = true)]
    snapshot: Option<PathBuf>,

    /// Browse a snapshot as an admin
    #[arg(long, global = true, requires = "snapshot")]
    admin: bool,

    /// Browse a snapshot as this member
    #[arg(long, value_name = "USER_ID", global = true, requires = "snapshot")]
    as_user: Option<String>,

    /// Also write logs to this file
    #[arg(long, value_name = "PATH", global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Log in and remember the session
    Login {
        #[arg(long)]
        email: String,
        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show the current user and role
    Whoami,
    /// Installments across all visible loans
    Emis {
        /// Only this user's loans (admins only)
        #[arg(long)]
        user: Option<String>,
        #[arg(long)]
        loan: Option<String>,
        /// Write the visible rows to a CSV file
        #[arg(long, value_name = "PATH")]
        csv: Option<PathBuf>,
    },
    /// List loans
    Loans {
        #[arg(long)]
        search: Option<String>,
    },
    /// Inspect or change a single loan
    #[command(subcommand)]
    Loan(LoanCommand),
    /// Change an installment's status
    #[command(subcommand)]
    Installment(InstallmentCommand),
    /// Monthly contribution payments
    Contributions(ContributionArgs),
    /// Correct or remove a recorded contribution (admins only)
    #[command(subcommand)]
    Contribution(ContributionCommand),
    /// Counters and chart series
    Dashboard,
    /// Pay this month's contribution
    Pay {
        #[arg(long)]
        month: String,
        /// Defaults to the configured monthly amount
        #[arg(long)]
        amount: Option<f64>,
    },
}

#[derive(Subcommand, Debug)]
enum LoanCommand {
    Show {
        id: String,
    },
    Approve {
        id: String,
        #[arg(long)]
        rate: String,
        /// Duration in months
        #[arg(long)]
        duration: String,
        /// EMI start date, YYYY-MM-DD
        #[arg(long)]
        start: String,
    },
    Reject {
        id: String,
    },
    SetStatus {
        id: String,
        status: String,
    },
    Request {
        #[arg(long)]
        amount: String,
        #[arg(long)]
        reason: String,
    },
    /// Remove a loan (admins only)
    Delete {
        id: String,
    },
}

#[derive(Subcommand, Debug)]
enum ContributionCommand {
    Edit {
        id: String,
        #[arg(long)]
        month: String,
        /// Defaults to the configured monthly amount
        #[arg(long)]
        amount: Option<f64>,
    },
    Delete {
        id: String,
    },
}

#[derive(Subcommand, Debug)]
enum InstallmentCommand {
    /// Mark your own pending installment as paid
    Pay { loan: String, ordinal: u32 },
    /// Set any installment's status (admins only)
    Set {
        loan: String,
        ordinal: u32,
        status: InstallmentStatus,
    },
}

#[derive(Args, Debug)]
struct ContributionArgs {
    #[arg(long)]
    month: Option<String>,
    #[arg(long)]
    year: Option<i32>,
    #[arg(long)]
    user: Option<String>,
    #[arg(long, default_value_t = 1)]
    page: usize,
    /// Write every filtered payment to a CSV file
    #[arg(long, value_name = "PATH")]
    csv: Option<PathBuf>,
}

struct Console {
    api: Box<dyn SocietyApi>,
    session: Session,
    session_path: Option<PathBuf>,
    config: ConsoleConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_file.as_ref());

    let config = match &cli.config {
        Some(path) => ConsoleConfig::load_from(path)
            .with_context(|| format!("Failed to load config at {:?}", path))?,
        None => ConsoleConfig::load().context("Failed to load config")?.0,
    };

    let mut console = match &cli.snapshot {
        Some(dir) => {
            if !cli.admin && cli.as_user.is_none() {
                anyhow::bail!("--snapshot needs --admin or --as-user <USER_ID>");
            }
            let role = if cli.admin { Role::Admin } else { Role::Member };
            tracing::info!("Reading snapshot from {:?} as {:?}", dir, role);
            Console {
                api: Box::new(SnapshotSource::new(dir)?),
                session: Session::offline(role, cli.as_user.clone()),
                session_path: None,
                config,
            }
        }
        None => {
            let session_path = config.session_path();
            let session = Session::load(&session_path)
                .with_context(|| format!("Failed to read session at {:?}", session_path))?;
            Console {
                api: Box::new(HttpSocietyApi::new(&config.api)?),
                session,
                session_path: Some(session_path),
                config,
            }
        }
    };

    match cli.command {
        Command::Login { email, password } => console.login(&email, password).await,
        Command::Logout => console.logout(),
        Command::Whoami => console.whoami().await,
        Command::Emis { user, loan, csv } => console.emis(user, loan, csv).await,
        Command::Loans { search } => console.loans(search.as_deref()).await,
        Command::Loan(command) => console.loan(command).await,
        Command::Installment(command) => console.installment(command).await,
        Command::Contributions(args) => console.contributions(args).await,
        Command::Contribution(command) => console.contribution(command).await,
        Command::Dashboard => console.dashboard().await,
        Command::Pay { month, amount } => console.pay(&month, amount).await,
    }
}

fn init_tracing(log_file: Option<&PathBuf>) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if let Some(log_path) = log_file {
        let file_appender = tracing_appender::rolling::never(
            log_path.parent().unwrap_or(std::path::Path::new(".")),
            log_path
                .file_name()
                .unwrap_or(std::ffi::OsStr::new("coop-ledger.log")),
        );
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        std::mem::forget(guard);

        let _ = tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(non_blocking),
            )
            .try_init();
    } else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .try_init();
    }
}

/// Prints a form error or bails with the page-level error
fn report(form: Option<FormError>, page_error: Option<&str>) -> anyhow::Error {
    match form {
        Some(form) => anyhow::anyhow!("Invalid input: {}", form),
        None => anyhow::anyhow!("{}", page_error.unwrap_or("Request failed")),
    }
}

fn bail_on_page_error(error: Option<&str>) -> Result<()> {
    match error {
        Some(message) => Err(anyhow::anyhow!("{}", message)),
        None => Ok(()),
    }
}

impl Console {
    fn format(&self) -> DisplayFormat {
        self.config.display.clone()
    }

    fn role(&self) -> Role {
        self.session.role()
    }

    async fn ledger(&self) -> Result<(Vec<Loan>, Vec<UserRef>), ApiError> {
        let loans = self.api.fetch_loans(&self.session).await?;
        let users = if self.role().is_admin() {
            self.api.fetch_users(&self.session).await?
        } else {
            Vec::new()
        };
        Ok((loans, users))
    }

    async fn login(&mut self, email: &str, password: Option<String>) -> Result<()> {
        let password = match password {
            Some(password) => password,
            None => {
                eprint!("Password: ");
                let mut line = String::new();
                std::io::stdin()
                    .read_line(&mut line)
                    .context("Failed to read password")?;
                line.trim_end_matches(&['\r', '\n'][..]).to_string()
            }
        };

        actions::login(self.api.as_ref(), &mut self.session, email, &password).await?;

        match self.api.current_user(&self.session).await {
            Ok(user) => self.session.set_display_name(user.name),
            Err(err) => tracing::warn!("Could not fetch profile: {}", err),
        }

        if let Some(path) = &self.session_path {
            self.session.save(path)?;
        }
        println!("Logged in as {}", self.describe_user());
        Ok(())
    }

    fn logout(&mut self) -> Result<()> {
        self.session.logout();
        if let Some(path) = &self.session_path {
            Session::clear(path)?;
        }
        println!("Logged out");
        Ok(())
    }

    async fn whoami(&self) -> Result<()> {
        if self.session.user().is_none() {
            return Err(ApiError::NotAuthenticated.into());
        }
        println!("{}", self.describe_user());
        Ok(())
    }

    fn describe_user(&self) -> String {
        match self.session.user() {
            Some(user) => format!(
                "{} ({}, {})",
                user.name.as_deref().unwrap_or(&user.id),
                user.id,
                if user.role.is_admin() { "admin" } else { "member" }
            ),
            None => "nobody".to_string(),
        }
    }

    async fn emis(
        &self,
        user: Option<String>,
        loan: Option<String>,
        csv: Option<PathBuf>,
    ) -> Result<()> {
        let mut view = EmiListView::new(self.role(), self.format());
        view.load(self.ledger().await);
        bail_on_page_error(view.error())?;

        view.select_user(user.as_deref());
        view.select_loan(loan.as_deref());
        if loan.is_some() && view.filter().loan_id.is_none() {
            eprintln!("Loan selection cleared: it does not belong to the selected user");
        }

        if let Some(path) = csv {
            let file = File::create(&path)
                .with_context(|| format!("Failed to create {:?}", path))?;
            view.export_csv(BufWriter::new(file))?;
            println!("Wrote {} rows to {:?}", view.visible_rows().len(), path);
            return Ok(());
        }

        println!(
            "{:<24} {:<18} {:>3} {:>12} {:<12} {}",
            "Loan Reason", "User Name", "#", "Amount", "Due Date", "Status"
        );
        for row in view.visible_rows() {
            println!(
                "{:<24} {:<18} {:>3} {:>12} {:<12} {}",
                row.loan_reason,
                row.user_name,
                row.ordinal,
                row.amount,
                row.due_date,
                status_label(row.status.as_str())
            );
        }

        let format = self.format();
        let summary = view.summary();
        println!();
        println!(
            "Installments: {} ({} paid, {} pending)",
            summary.total_count, summary.paid_count, summary.pending_count
        );
        println!(
            "Total: {}  Paid: {}  Pending: {}",
            format.currency(summary.total_amount),
            format.currency(summary.total_paid),
            format.currency(summary.total_pending())
        );
        Ok(())
    }

    async fn loans(&self, search: Option<&str>) -> Result<()> {
        let mut view = LoanSearchView::new(self.role());
        view.load(self.api.fetch_loans(&self.session).await);
        bail_on_page_error(view.error())?;

        view.set_query(search.unwrap_or_default());
        let format = self.format();
        println!(
            "{:<26} {:<18} {:>12} {:<24} {:<10} {:>8} {:>9} {}",
            "ID", "User", "Amount", "Reason", "Status", "Rate", "Duration", "Requested"
        );
        for loan in view.results() {
            println!(
                "{:<26} {:<18} {:>12} {:<24} {:<10} {:>8} {:>9} {}",
                loan.id,
                owner_label(self.role(), loan.user.as_ref()),
                format.money(&loan.amount),
                loan.reason,
                status_label(loan.status.as_str()),
                optional_rate(loan.interest_rate),
                optional_duration(loan.duration_months),
                format.timestamp(loan.created_at)
            );
        }
        Ok(())
    }

    async fn loan(&self, command: LoanCommand) -> Result<()> {
        match command {
            LoanCommand::Show { id } => self.show_loan(&id).await,
            LoanCommand::Approve {
                id,
                rate,
                duration,
                start,
            } => {
                self.edit_loan(&id, LoanUpdateForm::approve(&rate, &duration, &start))
                    .await
            }
            LoanCommand::Reject { id } => {
                self.edit_loan(&id, LoanUpdateForm::status(LoanStatus::Rejected))
                    .await
            }
            LoanCommand::SetStatus { id, status } => {
                let form = LoanUpdateForm {
                    status,
                    ..Default::default()
                };
                self.edit_loan(&id, form).await
            }
            LoanCommand::Request { amount, reason } => {
                let mut view = LoanSearchView::new(self.role());
                match actions::request_loan(self.api.as_ref(), &self.session, &amount, &reason)
                    .await
                {
                    Ok(request) => {
                        println!(
                            "Requested a loan of {}",
                            self.format().currency(request.amount)
                        );
                        Ok(())
                    }
                    Err(err) => {
                        let form = view.action_failed(err);
                        Err(report(form, view.error()))
                    }
                }
            }
            LoanCommand::Delete { id } => {
                let mut view = LoanSearchView::new(self.role());
                match actions::delete_loan(self.api.as_ref(), &self.session, &id).await {
                    Ok(()) => {
                        println!("Deleted loan {}", id);
                        Ok(())
                    }
                    Err(err) => {
                        let form = view.action_failed(err);
                        Err(report(form, view.error()))
                    }
                }
            }
        }
    }

    async fn load_loan(&self, id: &str) -> Result<LoanDetailsView> {
        let mut view = LoanDetailsView::default();
        view.load(self.api.fetch_loan(&self.session, id).await);
        bail_on_page_error(view.error())?;
        Ok(view)
    }

    async fn show_loan(&self, id: &str) -> Result<()> {
        let view = self.load_loan(id).await?;
        let (Some(loan), Some(ledger)) = (view.loan(), view.ledger()) else {
            return Ok(());
        };

        let format = self.format();
        println!("Loan {}", loan.id);
        println!("  Borrower:        {}", user_display_name(loan.user.as_ref()));
        println!("  Amount:          {}", format.money(&loan.amount));
        println!("  Reason:          {}", loan.reason);
        println!("  Status:          {}", status_label(loan.status.as_str()));
        println!("  Interest rate:   {}", optional_rate(loan.interest_rate));
        println!("  Duration:        {}", optional_duration(loan.duration_months));
        println!("  EMI start:       {}", format.date(loan.emi_start_date));
        println!("  EMI amount:      {}", format.optional_currency(loan.emi_amount));
        println!(
            "  Total payable:   {}",
            format.optional_currency(loan.total_amount_payable)
        );
        println!(
            "  Paid EMIs:       {} ({} of {})",
            format.currency(ledger.paid_total),
            ledger.paid_count,
            ledger.installment_count
        );
        println!("  Pending EMIs:    {}", ledger.pending_count);
        println!();
        println!("{:>3} {:>12} {:<12} {}", "#", "Amount", "Due Date", "Status");
        for installment in &loan.installments {
            println!(
                "{:>3} {:>12} {:<12} {}",
                installment.ordinal,
                format.money(&installment.amount),
                format.date(installment.due_date),
                status_label(installment.status.as_str())
            );
        }
        Ok(())
    }

    async fn edit_loan(&self, id: &str, form: LoanUpdateForm) -> Result<()> {
        let mut view = self.load_loan(id).await?;
        let Some(loan) = view.loan().cloned() else {
            return Ok(());
        };

        match actions::update_loan(self.api.as_ref(), &self.session, &loan, &form).await {
            Ok(update) => {
                println!("Loan {} is now {}", loan.id, status_label(update.status.as_str()));
                Ok(())
            }
            Err(err) => {
                let form = view.action_failed(err);
                Err(report(form, view.error()))
            }
        }
    }

    async fn installment(&self, command: InstallmentCommand) -> Result<()> {
        let (loan_id, ordinal, status) = match command {
            InstallmentCommand::Pay { loan, ordinal } => (loan, ordinal, InstallmentStatus::Paid),
            InstallmentCommand::Set {
                loan,
                ordinal,
                status,
            } => (loan, ordinal, status),
        };

        let mut view = self.load_loan(&loan_id).await?;
        let Some(loan) = view.loan().cloned() else {
            return Ok(());
        };

        let result = actions::set_installment_status(
            self.api.as_ref(),
            &self.session,
            &loan,
            ordinal,
            status,
        )
        .await;
        match result {
            Ok(()) => {
                println!(
                    "Installment #{} of loan {} is now {}",
                    ordinal,
                    loan.id,
                    status_label(status.as_str())
                );
                Ok(())
            }
            Err(err) => {
                let form = view.action_failed(err);
                Err(report(form, view.error()))
            }
        }
    }

    async fn contributions(&self, args: ContributionArgs) -> Result<()> {
        let format = self.format();
        let mut view = ContributionsView::new(format.clone(), self.config.contributions.page_size);
        view.load(self.api.fetch_payments(&self.session).await);
        bail_on_page_error(view.error())?;

        view.set_filter(ContributionFilter {
            month: args.month,
            year: args.year,
            user_name: args.user,
        });
        view.go_to(args.page);

        if let Some(path) = args.csv {
            let file = File::create(&path)
                .with_context(|| format!("Failed to create {:?}", path))?;
            view.export_csv(BufWriter::new(file))?;
            println!("Wrote {} payments to {:?}", view.filtered().len(), path);
            return Ok(());
        }

        let page = view.current_page();
        println!("{:<20} {:<12} {:>12} {}", "User Name", "Month", "Amount", "Date");
        for payment in &page.items {
            println!(
                "{:<20} {:<12} {:>12} {}",
                owner_label(self.role(), payment.user.as_ref()),
                payment.month,
                format.money(&payment.amount),
                format.timestamp(payment.date)
            );
        }

        let summary = view.summary();
        println!();
        println!(
            "Page {} of {}  |  {} payments, total {}",
            page.page,
            page.total_pages,
            summary.count,
            format.currency(summary.total_amount)
        );
        Ok(())
    }

    async fn dashboard(&self) -> Result<()> {
        let mut view = DashboardView::new(self.role());
        view.load(self.api.fetch_dashboard(&self.session).await);
        bail_on_page_error(view.error())?;

        let format = self.format();
        let counts = view.counts();
        println!(
            "Monthly amount:  {}",
            format.optional_currency(view.current_amount())
        );

        if view.role().is_admin() {
            println!("Users:           {}", counts.total_users);
            println!("Pending users:   {}", view.pending_users().len());
            println!("Balance:         {}", format.currency(counts.total_balance));
            println!(
                "Loans:           {} pending, {} ongoing, {} completed, {} rejected",
                counts.pending_loans,
                counts.ongoing_loans,
                counts.completed_loans,
                counts.rejected_loans
            );
            println!("Payments:        {}", counts.total_payments);
            println!("Meetings:        {}", counts.total_meetings);
            println!("Notices:         {}", counts.total_notices);
            println!("Resignations:    {}", counts.total_resignations);
        } else {
            println!("Your payments:   {}", view.own_payments().len());
            println!("Your loans:      {}", view.own_loans().len());
        }

        println!();
        println!("{:<10} {:>14} {:>14}", "Month", "Collected", "Cumulative");
        let monthly = view.monthly();
        for ((label, value), running) in monthly
            .labels
            .iter()
            .zip(&monthly.values)
            .zip(&view.cumulative().values)
        {
            println!(
                "{:<10} {:>14} {:>14}",
                label,
                format.currency(*value),
                format.currency(*running)
            );
        }

        println!();
        println!("{:<10} {:>6} {:>14}", "Status", "Loans", "Amount");
        let buckets = view.buckets();
        for ((label, count), amount) in buckets
            .labels
            .iter()
            .zip(&buckets.counts)
            .zip(&buckets.amounts)
        {
            println!("{:<10} {:>6} {:>14}", label, count, format.currency(*amount));
        }
        Ok(())
    }

    /// Society's monthly amount, falling back to the configured one
    async fn monthly_amount(&self) -> Option<f64> {
        match self.api.current_amount(&self.session).await {
            Ok(current) => current
                .map(|c| c.amount)
                .or(self.config.contributions.monthly_amount),
            Err(err) => {
                tracing::warn!("Could not fetch the current amount: {}", err);
                self.config.contributions.monthly_amount
            }
        }
    }

    async fn contribution(&self, command: ContributionCommand) -> Result<()> {
        let mut view = ContributionsView::new(self.format(), self.config.contributions.page_size);
        let result = match command {
            ContributionCommand::Edit { id, month, amount } => {
                let configured = self.monthly_amount().await;
                actions::update_contribution(
                    self.api.as_ref(),
                    &self.session,
                    &id,
                    &month,
                    amount,
                    configured,
                )
                .await
                .map(|request| {
                    format!(
                        "Contribution {} is now {} for {}",
                        id,
                        self.format().currency(request.amount),
                        request.month
                    )
                })
            }
            ContributionCommand::Delete { id } => {
                actions::delete_contribution(self.api.as_ref(), &self.session, &id)
                    .await
                    .map(|()| format!("Deleted contribution {}", id))
            }
        };

        match result {
            Ok(message) => {
                println!("{}", message);
                Ok(())
            }
            Err(err) => {
                let form = view.action_failed(err);
                Err(report(form, view.error()))
            }
        }
    }

    async fn pay(&self, month: &str, amount: Option<f64>) -> Result<()> {
        let mut view = ContributionsView::new(self.format(), self.config.contributions.page_size);
        let configured = self.monthly_amount().await;

        let result = actions::make_contribution(
            self.api.as_ref(),
            &self.session,
            month,
            amount,
            configured,
        )
        .await;
        match result {
            Ok(request) => {
                println!(
                    "Paid {} for {}",
                    self.format().currency(request.amount),
                    request.month
                );
                Ok(())
            }
            Err(err) => {
                let form = view.action_failed(err);
                Err(report(form, view.error()))
            }
        }
    }
}
