/*
[INPUT]:  Parsed subcommand arguments and the wired AppContext
[OUTPUT]: Terminal output for each surv subcommand
[POS]:    CLI command layer
[UPDATE]: When subcommands or their output change
*/

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::ValueEnum;
use console::style;
use dialoguer::Confirm;
use dialoguer::theme::ColorfulTheme;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use surv_client::app::LOGIN_ROUTE;
use surv_client::{
    AccessGuard, Affordance, DateRange, Job, JobQuery, JobStatus, LoginOutcome, SurvError,
    ToastLevel, filter_customers,
};
use surv_client::Notifier;
use surv_cli::AppContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl From<StatusArg> for JobStatus {
    fn from(status: StatusArg) -> Self {
        match status {
            StatusArg::Scheduled => JobStatus::Scheduled,
            StatusArg::InProgress => JobStatus::InProgress,
            StatusArg::Completed => JobStatus::Completed,
            StatusArg::Cancelled => JobStatus::Cancelled,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum JobAction {
    #[default]
    Show,
    Start,
    Complete,
    Cancel,
    Activity,
}

pub async fn login(ctx: &AppContext, redirect: bool, assume_yes: bool) -> Result<()> {
    let flow = ctx.login_flow();

    let outcome = match flow.start().await {
        LoginOutcome::NeedsInteraction(Affordance::NotConfigured) => {
            bail!("Lemma sign-in is not configured on {}", ctx.config.api_base_url)
        }
        LoginOutcome::NeedsInteraction(affordance) => {
            if affordance == Affordance::CreatePasskey && !assume_yes && !confirm_new_wallet(ctx)? {
                bail!("login cancelled");
            }
            if redirect {
                flow.sign_in_with_redirect(LOGIN_ROUTE).await
            } else {
                flow.sign_in().await
            }
        }
        other => other,
    };

    match outcome {
        LoginOutcome::Authenticated(user) => {
            println!(
                "Signed in as {} ({})",
                style(user.display_name()).bold(),
                style(user.role).cyan()
            );
            Ok(())
        }
        LoginOutcome::Redirected => {
            println!("Finish unlocking in the wallet, then run `surv login` again");
            Ok(())
        }
        LoginOutcome::NeedsInteraction(affordance) => {
            bail!("wallet still needs attention: {affordance:?}")
        }
        LoginOutcome::Failed(message) => bail!(message),
    }
}

fn confirm_new_wallet(ctx: &AppContext) -> Result<bool> {
    let dir = ctx.config.wallet_dir()?;
    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(format!("No wallet in {}. Create one?", dir.display()))
        .default(true)
        .interact()
        .context("read confirmation")
}

pub async fn logout(ctx: &AppContext) -> Result<()> {
    ctx.lemma.sign_out().await;
    ctx.client.auth_store().logout().context("clear auth state")?;
    ctx.notifier.notify(ToastLevel::Info, "Signed out");
    Ok(())
}

pub async fn whoami(ctx: &AppContext) -> Result<()> {
    if !ctx.client.auth_store().is_authenticated() {
        println!("Not signed in");
        return Ok(());
    }

    let user = match ctx.client.me().await {
        Ok(user) => user,
        Err(SurvError::Unauthorized) => {
            println!("Session rejected by the server, signed out");
            return Ok(());
        }
        Err(err) => return Err(err).context("fetch current user"),
    };

    println!("{}", style(user.display_name()).bold());
    println!("  email:  {}", user.email);
    println!("  role:   {}", user.role);
    if let Some(method) = ctx.client.auth_store().snapshot().verification_method {
        println!("  method: {method:?}");
    }
    if let Some(credential) = ctx.lemma.cached_credential() {
        println!("  ppid:   {}", credential.ppid);
        println!("  scopes: {}", credential.scopes.join(", "));
    }
    Ok(())
}

pub async fn jobs(
    ctx: &AppContext,
    status: Option<StatusArg>,
    date_from: Option<NaiveDate>,
    date_to: Option<NaiveDate>,
    limit: Option<u32>,
) -> Result<()> {
    let query = JobQuery {
        status: status.map(JobStatus::from),
        date_from,
        date_to,
        limit,
        ..JobQuery::default()
    };
    let jobs = ctx.client.list_jobs(&query).await.context("list jobs")?;

    if jobs.is_empty() {
        println!("No jobs");
    }
    for job in &jobs {
        print_job_line(job);
    }
    Ok(())
}

fn print_job_line(job: &Job) {
    println!(
        "{}  {}  {:<11}  {}",
        style(&job.job_number).dim(),
        job.scheduled_date,
        job.status.as_str(),
        job.title
    );
}

pub async fn job(ctx: &AppContext, id: &str, action: JobAction) -> Result<()> {
    let client = &ctx.client;
    let job = match action {
        JobAction::Show => client.get_job(id).await,
        JobAction::Start => client.start_job(id).await,
        JobAction::Complete => client.complete_job(id).await,
        JobAction::Cancel => client.cancel_job(id).await,
        JobAction::Activity => return activity(ctx, id).await,
    }
    .with_context(|| format!("job {id}"))?;

    print_job_line(&job);
    if let Some(description) = &job.description {
        println!("  {description}");
    }
    Ok(())
}

async fn activity(ctx: &AppContext, id: &str) -> Result<()> {
    let activity = ctx
        .client
        .job_activity(id)
        .await
        .with_context(|| format!("activity for job {id}"))?;

    println!("{}", style("Timeline").bold());
    for event in &activity.timeline {
        println!(
            "  {}  {:<10}  {}",
            event.event_time.format("%Y-%m-%d %H:%M"),
            event.event_type,
            event.employee_name.as_deref().unwrap_or("-")
        );
    }

    println!("{}", style("Messages").bold());
    for message in &activity.messages {
        println!(
            "  {} -> {}  {}",
            message.from_number,
            message.to_number,
            message.body.as_deref().unwrap_or("")
        );
    }
    if let Some(command) = activity.last_command() {
        println!("Last command: {}", style(command).cyan());
    }
    Ok(())
}

pub async fn customers(ctx: &AppContext, search: Option<&str>, local: bool) -> Result<()> {
    let remote_search = if local { None } else { search };
    let customers = ctx
        .client
        .list_customers(remote_search, None, None)
        .await
        .context("list customers")?;

    let shown = match (local, search) {
        (true, Some(query)) => filter_customers(&customers, query),
        _ => customers.iter().collect(),
    };

    if shown.is_empty() {
        println!("No customers");
    }
    for customer in shown {
        println!(
            "{:<24}  {:<28}  {}",
            customer.full_name(),
            customer.email.as_deref().unwrap_or("-"),
            customer.company_name.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

pub async fn dashboard(
    ctx: &AppContext,
    date_from: Option<NaiveDate>,
    date_to: Option<NaiveDate>,
) -> Result<()> {
    let client = &ctx.client;
    let (stats, by_status) = tokio::try_join!(client.dashboard_stats(), client.jobs_by_status())
        .context("fetch dashboard")?;

    println!("{}", style("Jobs").bold());
    println!(
        "  today {}  active {}  completed {}  total {}",
        stats.jobs.today, stats.jobs.active, stats.jobs.completed, stats.jobs.total
    );
    for entry in &by_status.by_status {
        println!("  {:<11}  {}", entry.status.as_str(), entry.count);
    }
    println!("{}", style("Invoices").bold());
    println!(
        "  paid {}  unpaid {}  revenue {}  outstanding {}  this month {}",
        stats.invoices.paid,
        stats.invoices.unpaid,
        stats.revenue.total,
        stats.revenue.outstanding,
        stats.revenue.this_month
    );
    println!("Customers: {}", stats.customers.total);

    if date_from.is_none() && date_to.is_none() {
        return Ok(());
    }
    let range = DateRange { date_from, date_to };
    let (revenue, technicians) = tokio::try_join!(
        client.revenue_report(&range),
        client.technician_report(&range)
    )
    .context("fetch reports")?;

    println!(
        "{} {} .. {}",
        style("Revenue").bold(),
        revenue.date_from,
        revenue.date_to
    );
    println!(
        "  invoiced {}  collected {}",
        revenue.invoiced(),
        revenue.collected()
    );
    println!("{}", style("Technicians").bold());
    for tech in &technicians.technicians {
        println!(
            "  {:<24}  {:>3}/{:<3}  {:.1}%",
            tech.name, tech.completed_jobs, tech.total_jobs, tech.completion_rate
        );
    }
    Ok(())
}

pub async fn access(ctx: &AppContext, resource: &str, action: &str) -> Result<()> {
    if !ctx.ensure_lemma().await? {
        warn!("Lemma not configured, deciding by role only");
    }

    let guard = AccessGuard::new().resource(resource).action(action);
    let allowed = guard.check(&ctx.client.auth_store().snapshot(), &ctx.lemma);

    let verdict = if allowed {
        style("allowed").green()
    } else {
        style("denied").red()
    };
    println!("{resource}:{action} {verdict}");
    Ok(())
}

/// Monitor the wallet session for `route` until Ctrl-C or sign-out
pub async fn watch(ctx: &AppContext, route: &str, shutdown: CancellationToken) -> Result<()> {
    if !ctx.client.auth_store().is_authenticated() {
        bail!("not signed in, run `surv login` first");
    }
    if !ctx.ensure_lemma().await? {
        println!("Lemma not configured, nothing to watch");
        return Ok(());
    }
    let state = ctx.lemma.get_auth_state().await?;
    if !state.wallet_exists {
        bail!("no wallet in {}", ctx.config.wallet_dir()?.display());
    }
    if !state.unlocked {
        ctx.lemma.unlock_wallet().await.context("unlock wallet")?;
    }

    ctx.client.navigator().navigate(route);
    let Some(monitor) = ctx
        .session_manager()
        .activate(route)
        .await
        .context("activate session monitor")?
    else {
        println!("Session not active");
        return Ok(());
    };

    println!("Watching session on {route}, press Ctrl-C to stop");
    let mut navigation = ctx.client.navigator().subscribe();
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                info!("watch stopped");
                break;
            }
            changed = navigation.changed() => {
                if changed.is_err() {
                    break;
                }
                if navigation.borrow_and_update().as_str() == LOGIN_ROUTE {
                    println!("Session ended, run `surv login` to sign in again");
                    break;
                }
            }
        }
    }

    monitor.stop();
    Ok(())
}
