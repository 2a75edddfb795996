//! Command-line entry point for the as-built review core.
//!
//! # Responsibility
//! - Drive plan intake, pin placement and progress queries against a local DB.
//! - Keep output deterministic: plain lines by default, JSON with `--json`.

use asbuilt_core::db::open_db;
use asbuilt_core::{
    LoggingConfig, NormalizedPoint, PhotoUpload, PlanUpload, ReviewService,
    SqliteReviewRepository,
};
use clap::{Parser, Subcommand};
use log::info;
use serde_json::json;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use uuid::Uuid;

type CliResult<T> = Result<T, Box<dyn Error>>;

#[derive(Parser, Debug)]
#[command(
    name = "asbuilt",
    version,
    about = "Place site photos on plans and track review progress"
)]
struct Cli {
    /// SQLite database file
    #[arg(long, env = "ASBUILT_DB_PATH", default_value = "asbuilt_review.sqlite3")]
    db: PathBuf,
    /// Log level (trace|debug|info|warn|error); falls back to ASBUILT_LOG_LEVEL
    #[arg(long)]
    log_level: Option<String>,
    /// Absolute directory for rolling log files; falls back to ASBUILT_LOG_DIR,
    /// logging is off when neither is set
    #[arg(long)]
    log_dir: Option<PathBuf>,
    /// Print machine-readable JSON
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print core linkage info
    Ping,
    /// Record an uploaded plan
    AddPlan {
        #[arg(long)]
        project: Uuid,
        #[arg(long)]
        name: String,
        #[arg(long)]
        image: String,
    },
    /// Record an uploaded photo
    AddPhoto {
        #[arg(long)]
        project: Uuid,
        #[arg(long)]
        image: String,
        #[arg(long)]
        caption: Option<String>,
    },
    /// List plans newest-first and mark the active one
    Plans {
        #[arg(long)]
        project: Uuid,
    },
    /// Make a plan the project's primary plan
    Activate {
        #[arg(long)]
        project: Uuid,
        #[arg(long)]
        plan: Uuid,
    },
    /// Pin a photo at normalized coordinates
    Place {
        #[arg(long)]
        project: Uuid,
        #[arg(long)]
        photo: Uuid,
        /// Plan to pin on; defaults to the active plan
        #[arg(long)]
        plan: Option<Uuid>,
        #[arg(long)]
        x: f64,
        #[arg(long)]
        y: f64,
    },
    /// Remove a photo's pin
    Unplace {
        #[arg(long)]
        project: Uuid,
        #[arg(long)]
        photo: Uuid,
    },
    /// Show placement progress
    Stats {
        #[arg(long)]
        project: Uuid,
        /// Count only pins on the active plan
        #[arg(long)]
        active_plan_only: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    if let Some(logging) =
        LoggingConfig::resolve(cli.log_level.as_deref(), cli.log_dir.as_deref())?
    {
        logging.init()?;
    }

    if let Command::Ping = cli.command {
        println!("asbuilt_core ping={}", asbuilt_core::ping());
        println!("asbuilt_core version={}", asbuilt_core::core_version());
        return Ok(());
    }

    let conn = open_db(&cli.db)?;
    let service = ReviewService::new(SqliteReviewRepository::try_new(&conn)?);
    info!(
        "event=cli_command module=cli status=start db={}",
        cli.db.display()
    );

    match cli.command {
        Command::Ping => {}
        Command::AddPlan {
            project,
            name,
            image,
        } => {
            let plan = service.register_plan(PlanUpload {
                project_id: project,
                display_name: name,
                image_ref: image,
                created_at: None,
            })?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&plan)?);
            } else {
                println!("plan {} \"{}\"", plan.id, plan.display_name);
            }
        }
        Command::AddPhoto {
            project,
            image,
            caption,
        } => {
            let photo = service.register_photo(PhotoUpload {
                project_id: project,
                image_ref: image,
                caption,
                created_at: None,
            })?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&photo)?);
            } else {
                println!("photo {}", photo.id);
            }
        }
        Command::Plans { project } => {
            let plans = service.list_plans(project)?;
            let active_id = asbuilt_core::resolve_active_plan(&plans).map(|plan| plan.id);
            if cli.json {
                let payload = json!({ "active_plan_id": active_id, "plans": plans });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else if plans.is_empty() {
                println!("no plans uploaded");
            } else {
                for plan in &plans {
                    let marker = if Some(plan.id) == active_id { "*" } else { " " };
                    println!("{marker} {} {} \"{}\"", plan.id, plan.created_at, plan.display_name);
                }
            }
        }
        Command::Activate { project, plan } => {
            let mut session = service.open_session(project)?;
            service.set_active_plan(&mut session, plan)?;
            print_status(cli.json, "active_plan_id", plan)?;
        }
        Command::Place {
            project,
            photo,
            plan,
            x,
            y,
        } => {
            let point = NormalizedPoint::new(x, y)?;
            let mut session = service.open_session(project)?;
            if let Some(plan_id) = plan {
                session.select_plan(plan_id)?;
            }
            let placement = service.place_pin(&mut session, photo, point)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&placement)?);
            } else if let Some(position) = placement.position() {
                println!(
                    "photo {} pinned on {} at ({:.4}, {:.4})",
                    photo, position.plan_id, position.point.x, position.point.y
                );
            }
        }
        Command::Unplace { project, photo } => {
            let mut session = service.open_session(project)?;
            service.unplace_pin(&mut session, photo)?;
            print_status(cli.json, "unplaced_photo_id", photo)?;
        }
        Command::Stats {
            project,
            active_plan_only,
        } => {
            let stats = if active_plan_only {
                service.open_session(project)?.plan_stats()
            } else {
                service.project_stats(project)?
            };
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!(
                    "{}/{} placed ({}%), {} unplaced",
                    stats.placed, stats.total, stats.percentage, stats.unplaced
                );
            }
        }
    }

    Ok(())
}

fn print_status(as_json: bool, key: &str, id: Uuid) -> CliResult<()> {
    if as_json {
        println!("{}", serde_json::to_string_pretty(&json!({ key: id }))?);
    } else {
        println!("{key}={id}");
    }
    Ok(())
}
