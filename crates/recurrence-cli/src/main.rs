//! `recur` CLI — expand recurring appointments and check them for conflicts.
//!
//! ## Usage
//!
//! ```sh
//! # Expand a template + rule (stdin → stdout)
//! cat request.json | recur expand
//!
//! # Expand in a local timezone with a smaller cap
//! recur expand -i request.json --cap 10 --timezone America/Chicago
//!
//! # Check already-expanded instances against a technician's bookings
//! recur conflicts -i instances.json --existing bookings.json --assignee tech-7
//!
//! # Expand, check against the template's assignee, drop conflicting dates
//! recur plan -i request.json --existing bookings.json --skip-conflicts
//! ```
//!
//! `request.json` is `{"template": {...}, "rule": {...}, "options": {...}?}`.
//! Flags override anything set under `options`. Set `RECUR_LOG` (e.g.
//! `RECUR_LOG=debug`) or pass `-v` to see what the engine is doing on stderr.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use recurrence_engine::{
    AppointmentInstance, AppointmentTemplate, ConflictResult, DstPolicy, ExistingAppointment,
    ExpandOptions, RecurrenceRule,
};
use serde::{Deserialize, Serialize};
use std::io::{self, Read};
use tracing::warn;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "RECUR_LOG";

#[derive(Parser)]
#[command(
    name = "recur",
    version,
    about = "Expand recurring appointments and check them for conflicts"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log engine activity at debug level on stderr (overrides RECUR_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Expand a template and rule into appointment instances
    Expand(ExpandArgs),
    /// Check instances against an assignee's existing appointments
    Conflicts {
        /// Instances JSON file (reads from stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,
        /// Output file (writes to stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
        /// JSON file with the existing appointments
        #[arg(long)]
        existing: String,
        /// Assignee whose appointments are checked
        #[arg(long)]
        assignee: String,
    },
    /// Expand, then check the result against the template's assignee
    Plan {
        #[command(flatten)]
        expand: ExpandArgs,
        /// JSON file with the existing appointments
        #[arg(long)]
        existing: String,
        /// Drop conflicting instances from the planned series
        #[arg(long)]
        skip_conflicts: bool,
    },
}

#[derive(Args)]
struct ExpandArgs {
    /// Request JSON file (reads from stdin if omitted)
    #[arg(short, long)]
    input: Option<String>,
    /// Output file (writes to stdout if omitted)
    #[arg(short, long)]
    output: Option<String>,
    /// Maximum number of instances to generate
    #[arg(long)]
    cap: Option<usize>,
    /// IANA timezone used for calendar arithmetic (e.g. "Europe/Berlin")
    #[arg(long)]
    timezone: Option<String>,
    /// How to treat local times that fall in a DST gap: wall-clock, shift-forward or skip
    #[arg(long)]
    dst_policy: Option<DstPolicy>,
}

#[derive(Deserialize)]
struct ExpandRequest {
    template: AppointmentTemplate,
    rule: RecurrenceRule,
    #[serde(default)]
    options: ExpandOptions,
}

#[derive(Serialize)]
struct Plan {
    instances: Vec<AppointmentInstance>,
    conflicts: Vec<ConflictResult<ExistingAppointment>>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Expand(args) => {
            let (request, options) = load_request(&args)?;
            let instances =
                recurrence_engine::expand_with_options(&request.template, &request.rule, &options)
                    .context("Failed to expand recurrence")?;
            write_json(args.output.as_deref(), &instances)?;
        }
        Commands::Conflicts {
            input,
            output,
            existing,
            assignee,
        } => {
            let raw = read_input(input.as_deref())?;
            let instances: Vec<AppointmentInstance> =
                serde_json::from_str(&raw).context("Failed to parse instances JSON")?;
            let existing = load_existing(&existing)?;
            let report = recurrence_engine::check_conflicts(&instances, &existing, &assignee);
            write_json(output.as_deref(), &report)?;
        }
        Commands::Plan {
            expand,
            existing,
            skip_conflicts,
        } => {
            let (request, options) = load_request(&expand)?;
            let existing = load_existing(&existing)?;
            let instances =
                recurrence_engine::expand_with_options(&request.template, &request.rule, &options)
                    .context("Failed to expand recurrence")?;

            let conflicts = match request.template.assignee_id.as_deref() {
                Some(assignee) => recurrence_engine::check_conflicts(&instances, &existing, assignee),
                None => {
                    warn!("template has no assigneeId; skipping conflict check");
                    Vec::new()
                }
            };

            let instances = if skip_conflicts {
                recurrence_engine::without_conflicts(&instances, &conflicts)
            } else {
                instances
            };

            write_json(
                expand.output.as_deref(),
                &Plan {
                    instances,
                    conflicts,
                },
            )?;
        }
    }

    Ok(())
}

/// Install a stderr subscriber filtered by `RECUR_LOG` (default `warn`).
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    // A subscriber may already be installed when embedded; keep that one.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

/// Read the expand request and layer the command-line flags over its options.
fn load_request(args: &ExpandArgs) -> Result<(ExpandRequest, ExpandOptions)> {
    let raw = read_input(args.input.as_deref())?;
    let request: ExpandRequest =
        serde_json::from_str(&raw).context("Failed to parse expand request JSON")?;

    let mut options = request.options;
    if let Some(cap) = args.cap {
        options.cap = cap;
    }
    if let Some(tz) = args.timezone.as_deref() {
        options = options.in_timezone(tz).context("Invalid --timezone")?;
    }
    if let Some(policy) = args.dst_policy {
        options = options.with_dst_policy(policy);
    }
    Ok((request, options))
}

fn load_existing(path: &str) -> Result<Vec<ExistingAppointment>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read file: {}", path))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse existing appointments JSON: {}", path))
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_json<T: Serialize>(path: Option<&str>, value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value)?;
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}
