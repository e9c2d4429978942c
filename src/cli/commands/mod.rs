//! CLI commands implementation.
//!
//! This module contains the CLI parser and dispatches to command-specific modules.

mod assign;
mod init;
mod manifest;
mod outcome;
mod shipment;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;

use crate::config::Settings;
use crate::models::ManifestStatus;

#[derive(Parser)]
#[command(name = "manifesto")]
#[command(about = "Dispatch manifest and delivery execution service")]
#[command(version)]
pub struct Cli {
    /// Data directory
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Tenant to operate in (overrides config)
    #[arg(long, global = true)]
    tenant: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Check if verbose mode is enabled (for early logging setup).
pub fn is_verbose() -> bool {
    std::env::args().any(|arg| arg == "-v" || arg == "--verbose")
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the data directory and database
    Init,

    /// Manage dispatch manifests
    Manifest {
        #[command(subcommand)]
        command: ManifestCommands,
    },

    /// Manage shipment assignments on a manifest
    Assign {
        #[command(subcommand)]
        command: AssignCommands,
    },

    /// Record delivery outcomes
    Outcome {
        #[command(subcommand)]
        command: OutcomeCommands,
    },

    /// Manage shipments (seeding and lookup)
    Shipment {
        #[command(subcommand)]
        command: ShipmentCommands,
    },
}

#[derive(Subcommand)]
enum ManifestCommands {
    /// Create a manifest
    Create {
        /// Dispatch date (YYYY-MM-DD)
        #[arg(short, long)]
        date: String,
        /// Vehicle ID
        #[arg(long)]
        vehicle: Option<String>,
        /// Driver ID
        #[arg(long)]
        driver: Option<String>,
        /// Route ID
        #[arg(long)]
        route: Option<String>,
        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,
    },

    /// List manifests
    Ls {
        /// Filter by status
        #[arg(short, long)]
        status: Option<String>,
        /// Filter by date range start (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,
        /// Filter by date range end (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
        /// Substring match on the manifest number
        #[arg(short, long)]
        number: Option<String>,
    },

    /// Show a manifest with its stops
    Info {
        /// Manifest ID
        manifest_id: String,
    },

    /// Move a manifest through its lifecycle
    Status {
        /// Manifest ID
        manifest_id: String,
        /// New status (confirmed, in_progress, completed, cancelled)
        status: String,
    },

    /// Duplicate a manifest with its stop list
    Duplicate {
        /// Manifest ID to copy
        manifest_id: String,
    },

    /// Delete a draft manifest
    Delete {
        /// Manifest ID
        manifest_id: String,
    },

    /// Import manifests from a JSON file
    Import {
        /// Path to the JSON file
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum AssignCommands {
    /// Add shipments to a manifest (appended in the given order)
    Add {
        /// Manifest ID
        manifest_id: String,
        /// Shipment IDs
        shipment_ids: Vec<String>,
    },

    /// Remove shipments from a manifest
    Remove {
        /// Manifest ID
        manifest_id: String,
        /// Shipment IDs
        shipment_ids: Vec<String>,
    },

    /// Reorder all stops on a manifest
    Reorder {
        /// Manifest ID
        manifest_id: String,
        /// Shipment IDs in the new visiting order
        shipment_ids: Vec<String>,
    },

    /// List shipments available for assignment
    Available,
}

#[derive(Subcommand)]
enum OutcomeCommands {
    /// Mark a stop delivered
    Delivered {
        /// Manifest ID
        manifest_id: String,
        /// Shipment ID
        shipment_id: String,
        /// Name of the person who received the shipment
        #[arg(short, long)]
        recipient: String,
        /// Driver recording the outcome
        #[arg(long)]
        driver: Option<String>,
        /// Delivery notes
        #[arg(long)]
        notes: Option<String>,
    },

    /// Mark a stop failed
    Failed {
        /// Manifest ID
        manifest_id: String,
        /// Shipment ID
        shipment_id: String,
        /// Why the delivery failed
        #[arg(short, long)]
        reason: String,
        /// Machine-readable failure code
        #[arg(long)]
        code: Option<String>,
        /// Reschedule date (YYYY-MM-DD)
        #[arg(long)]
        reschedule: Option<String>,
        /// Driver recording the outcome
        #[arg(long)]
        driver: Option<String>,
    },

    /// Flag a stop as out for delivery
    InTransit {
        /// Manifest ID
        manifest_id: String,
        /// Shipment ID
        shipment_id: String,
        /// Driver recording the move
        #[arg(long)]
        driver: Option<String>,
    },

    /// Skip a stop without recording an attempt
    Skip {
        /// Manifest ID
        manifest_id: String,
        /// Shipment ID
        shipment_id: String,
        /// Why the stop was skipped
        #[arg(short, long)]
        reason: Option<String>,
        /// Driver recording the move
        #[arg(long)]
        driver: Option<String>,
    },
}

#[derive(Subcommand)]
enum ShipmentCommands {
    /// Register a shipment
    Add {
        /// Tracking number
        tracking_number: String,
        /// Weight in kilograms
        #[arg(long)]
        weight: Option<f64>,
        /// Number of packages
        #[arg(long)]
        packages: Option<i32>,
        /// Cash-on-delivery amount
        #[arg(long)]
        cod: Option<f64>,
    },

    /// Show a shipment's delivery history
    History {
        /// Shipment ID
        shipment_id: String,
    },
}

/// Run the CLI.
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = Settings::load(cli.data_dir);
    if let Some(tenant) = cli.tenant {
        settings.default_tenant = tenant;
    }

    match cli.command {
        Commands::Init => init::cmd_init(&settings).await,
        Commands::Manifest { command } => match command {
            ManifestCommands::Create {
                date,
                vehicle,
                driver,
                route,
                notes,
            } => manifest::cmd_create(&settings, &date, vehicle, driver, route, notes).await,
            ManifestCommands::Ls {
                status,
                from,
                to,
                number,
            } => {
                manifest::cmd_ls(
                    &settings,
                    status.as_deref(),
                    from.as_deref(),
                    to.as_deref(),
                    number,
                )
                .await
            }
            ManifestCommands::Info { manifest_id } => {
                manifest::cmd_info(&settings, &manifest_id).await
            }
            ManifestCommands::Status {
                manifest_id,
                status,
            } => manifest::cmd_status(&settings, &manifest_id, &status).await,
            ManifestCommands::Duplicate { manifest_id } => {
                manifest::cmd_duplicate(&settings, &manifest_id).await
            }
            ManifestCommands::Delete { manifest_id } => {
                manifest::cmd_delete(&settings, &manifest_id).await
            }
            ManifestCommands::Import { file } => manifest::cmd_import(&settings, &file).await,
        },
        Commands::Assign { command } => match command {
            AssignCommands::Add {
                manifest_id,
                shipment_ids,
            } => assign::cmd_add(&settings, &manifest_id, &shipment_ids).await,
            AssignCommands::Remove {
                manifest_id,
                shipment_ids,
            } => assign::cmd_remove(&settings, &manifest_id, &shipment_ids).await,
            AssignCommands::Reorder {
                manifest_id,
                shipment_ids,
            } => assign::cmd_reorder(&settings, &manifest_id, &shipment_ids).await,
            AssignCommands::Available => assign::cmd_available(&settings).await,
        },
        Commands::Outcome { command } => match command {
            OutcomeCommands::Delivered {
                manifest_id,
                shipment_id,
                recipient,
                driver,
                notes,
            } => {
                outcome::cmd_delivered(&settings, &manifest_id, &shipment_id, recipient, driver, notes)
                    .await
            }
            OutcomeCommands::Failed {
                manifest_id,
                shipment_id,
                reason,
                code,
                reschedule,
                driver,
            } => {
                outcome::cmd_failed(
                    &settings,
                    &manifest_id,
                    &shipment_id,
                    reason,
                    code,
                    reschedule.as_deref(),
                    driver,
                )
                .await
            }
            OutcomeCommands::InTransit {
                manifest_id,
                shipment_id,
                driver,
            } => {
                outcome::cmd_in_transit(&settings, &manifest_id, &shipment_id, driver.as_deref())
                    .await
            }
            OutcomeCommands::Skip {
                manifest_id,
                shipment_id,
                reason,
                driver,
            } => {
                outcome::cmd_skip(
                    &settings,
                    &manifest_id,
                    &shipment_id,
                    reason.as_deref(),
                    driver.as_deref(),
                )
                .await
            }
        },
        Commands::Shipment { command } => match command {
            ShipmentCommands::Add {
                tracking_number,
                weight,
                packages,
                cod,
            } => shipment::cmd_add(&settings, &tracking_number, weight, packages, cod).await,
            ShipmentCommands::History { shipment_id } => {
                shipment::cmd_history(&settings, &shipment_id).await
            }
        },
    }
}

/// Bail out with a hint when the database has not been initialized.
fn require_database(settings: &Settings) -> anyhow::Result<()> {
    if !settings.database_exists() {
        anyhow::bail!(
            "{} database not found at {}; run `manifesto init` first",
            style("✗").red(),
            settings.database_path().display()
        );
    }
    Ok(())
}

/// Parse a status argument, listing the accepted values on failure.
fn parse_status(s: &str) -> anyhow::Result<ManifestStatus> {
    ManifestStatus::from_str(s).ok_or_else(|| {
        anyhow::anyhow!("unknown status '{s}' (expected draft, confirmed, in_progress, completed, or cancelled)")
    })
}

/// Parse a YYYY-MM-DD date argument.
fn parse_date_arg(s: &str) -> anyhow::Result<chrono::NaiveDate> {
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| anyhow::anyhow!("invalid date '{s}' (expected YYYY-MM-DD)"))
}
