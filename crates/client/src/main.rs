//! `fleetadmin`: command-line front-end for the fleet administration console.
//!
//! ```bash
//! fleetadmin login --role staff --email ops@fleet.test   # password from FLEETADMIN_PASSWORD
//! fleetadmin status
//! fleetadmin route /drivers
//! fleetadmin penalties 42
//! fleetadmin audit --action driver.approved --start-date 2026-03-01 --page 2
//! fleetadmin logout
//! ```

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, bail};
use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};

use fleetadmin_auth::{Role, SessionState};
use fleetadmin_client::types::{AuditQuery, PENALTIES, PenaltyAmount};
use fleetadmin_client::views::{AuditLogView, DashboardView, DriverPenaltiesView, StaffView};
use fleetadmin_client::{
    App, ClientConfig, Level, LogNotifier, Notification, Notifier, Route, RouteOutcome,
};
use fleetadmin_core::DriverId;

#[derive(Parser)]
#[command(name = "fleetadmin")]
#[command(about = "Fleet administration console client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LoginRole {
    Admin,
    Staff,
}

impl From<LoginRole> for Role {
    fn from(value: LoginRole) -> Self {
        match value {
            LoginRole::Admin => Role::Admin,
            LoginRole::Staff => Role::Staff,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the stored credential and show the session and menu
    Status,

    /// Sign in and store the credential
    Login {
        #[arg(long, value_enum)]
        role: LoginRole,

        #[arg(long)]
        email: String,

        #[arg(long, env = "FLEETADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forget the stored credential
    Logout,

    /// Show where navigating to a path would land
    Route { path: String },

    /// Dashboard statistics
    Stats,

    /// List penalties recorded against a driver
    Penalties { driver: String },

    /// List the penalty types and their amounts
    PenaltyTypes,

    /// List staff accounts with permission labels
    Staff,

    /// Search the audit log
    Audit {
        #[arg(long)]
        action: Option<String>,

        /// Earliest day, YYYY-MM-DD
        #[arg(long)]
        start_date: Option<NaiveDate>,

        /// Latest day, YYYY-MM-DD
        #[arg(long)]
        end_date: Option<NaiveDate>,

        /// Narrow the fetched page to performers whose name contains this
        #[arg(long)]
        performer: Option<String>,

        #[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
        page: u32,

        #[arg(long, default_value_t = AuditQuery::DEFAULT_LIMIT)]
        limit: u32,
    },
}

/// Prints notifications the way a toast area would.
struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notification: Notification) {
        let tag = match notification.level {
            Level::Success => "ok",
            Level::Info => "info",
            Level::Error => "error",
        };
        eprintln!("[{tag}] {}", notification.message);
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    if cli.json {
        fleetadmin_observability::init();
    } else {
        fleetadmin_observability::init_pretty();
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = ClientConfig::from_env().context("invalid configuration")?;
    tracing::debug!(api_url = %config.api_url, "configuration loaded");
    // JSON mode keeps stdout machine-readable; notifications go to the log.
    let notifier: Arc<dyn Notifier> = if cli.json {
        Arc::new(LogNotifier)
    } else {
        Arc::new(ConsoleNotifier)
    };
    let app = App::from_config(&config, notifier);

    match cli.command {
        Commands::Login {
            role,
            email,
            password,
        } => {
            // The stored credential is re-validated first so a stale one does
            // not block signing in.
            app.start().await;
            app.session.login(role.into(), &email, &password).await?;
            print_status(&app.session.state(), &app, cli.json)
        }
        Commands::Logout => {
            app.session.logout();
            Ok(())
        }
        Commands::Status => {
            let state = app.start().await;
            print_status(&state, &app, cli.json)
        }
        Commands::Route { path } => {
            app.start().await;
            let outcome = app.router().navigate(&path);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                match outcome {
                    RouteOutcome::Render(route) => println!("render {} ({})", route.title(), route.path()),
                    RouteOutcome::Redirect(route) => println!("redirect {}", route.path()),
                    RouteOutcome::Loading => println!("loading"),
                }
            }
            Ok(())
        }
        Commands::Stats => {
            enter(&app, Route::Dashboard).await?;
            let view = DashboardView::new(app.view_context());
            view.open().await?;
            let stats = view.stats().context("statistics unavailable")?;
            println!("{}", serde_json::to_string_pretty(&stats)?);
            Ok(())
        }
        Commands::Penalties { driver } => {
            enter(&app, Route::Penalties).await?;
            let driver: DriverId = driver.parse()?;
            let view = DriverPenaltiesView::new(app.view_context());
            view.select_driver(driver).await?;
            let penalties = view.penalties();
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&penalties)?);
            } else {
                for p in &penalties {
                    let status = if p.paid { "paid" } else { "unpaid" };
                    println!(
                        "{:>8}  {:<28}  {:>10.2}  {:<6}  {}",
                        p.id,
                        p.penalty_type.as_deref().unwrap_or("-"),
                        p.amount,
                        status,
                        p.reason
                    );
                }
                println!("outstanding: {:.2}", view.outstanding_amount());
            }
            Ok(())
        }
        Commands::PenaltyTypes => {
            for kind in PENALTIES {
                let amount = match kind.amount {
                    PenaltyAmount::Fixed(ghs) => format!("GHS {ghs}"),
                    PenaltyAmount::PercentOfCost(pct) => format!("{pct}% of cost"),
                };
                println!("{:<32} {}", kind.name, amount);
            }
            Ok(())
        }
        Commands::Staff => {
            enter(&app, Route::Staff).await?;
            let view = StaffView::new(app.view_context());
            let (staff, catalog) = view.open();
            staff.await?;
            catalog.await?;
            let catalog = view.catalog();
            for member in view.staff() {
                let labels: Vec<&str> = member.permissions.iter().map(|p| catalog.label(p)).collect();
                println!("{:<24} {:<32} {:<6} {}", member.name, member.email, member.role, labels.join(", "));
            }
            Ok(())
        }
        Commands::Audit {
            action,
            start_date,
            end_date,
            performer,
            page,
            limit,
        } => {
            enter(&app, Route::AuditLog).await?;
            let view = AuditLogView::new(app.view_context());
            let query = AuditQuery {
                action,
                start_date,
                end_date,
                page: Some(page),
                limit: Some(limit),
            };
            view.search(query).await?;
            let entries = match performer.as_deref() {
                Some(name) => view.by_performer(name),
                None => view.entries(),
            };
            if cli.json {
                let body = serde_json::json!({
                    "entries": entries,
                    "total": view.total(),
                    "page": page,
                });
                println!("{}", serde_json::to_string_pretty(&body)?);
            } else {
                for e in &entries {
                    let at = e
                        .created_at
                        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                        .unwrap_or_default();
                    println!(
                        "{:<16} {:<24} {:<20} {}",
                        at,
                        e.performer().unwrap_or("-"),
                        e.action,
                        e.target.as_deref().unwrap_or("")
                    );
                }
                let pages = view.total().div_ceil(u64::from(limit.max(1)));
                println!("page {page} of {}, {} entries", pages.max(1), view.total());
            }
            Ok(())
        }
    }
}

/// Start the session and require the router to render `route`.
async fn enter(app: &App, route: Route) -> anyhow::Result<()> {
    app.start().await;
    match app.router().navigate(route.path()) {
        RouteOutcome::Render(r) if r == route => Ok(()),
        RouteOutcome::Render(Route::Login) | RouteOutcome::Redirect(Route::Login) => {
            bail!("not signed in; run `fleetadmin login` first")
        }
        RouteOutcome::Render(Route::Unauthorized) => {
            bail!("your account may not open {}", route.title())
        }
        other => bail!("cannot open {}: {:?}", route.title(), other),
    }
}

fn print_status(state: &SessionState, app: &App, json: bool) -> anyhow::Result<()> {
    let menu = app.router().menu();
    if json {
        let body = serde_json::json!({
            "session": state.session(),
            "menu": menu,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    match state.session() {
        Some(session) => {
            println!("signed in as {} ({})", session.display_name, session.role);
            if !session.permissions.is_empty() {
                let perms: Vec<&str> = session.permissions.iter().map(|p| p.as_str()).collect();
                println!("permissions: {}", perms.join(", "));
            }
            for entry in menu {
                println!("  {:<12} {}", entry.path, entry.title);
            }
        }
        None => println!("not signed in"),
    }
    Ok(())
}
