//! proctorlens CLI
//!
//! Commands:
//! - replay: run a recorded sample script through the pipeline offline
//! - live: play a script through a real session with scripted providers
//! - defaults: write the default settings file

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use log::info;

use proctorlens_lib::events::export::report_file_name;
use proctorlens_lib::events::to_table;
use proctorlens_lib::providers::scripted::{
    MemoryRecorder, ScriptedCapture, ScriptedFaces, ScriptedObjects,
};
use proctorlens_lib::replay::{replay, ReplayScript};
use proctorlens_lib::{Collaborators, MonitorSettings, SessionController, SettingsStore};

#[derive(Parser)]
#[command(name = "proctorlens")]
#[command(version)]
#[command(about = "Integrity events and scores from proctoring detections", long_about = None)]
struct Cli {
    /// Settings file; defaults are used when it does not exist
    #[arg(long, global = true, env = "PROCTORLENS_SETTINGS")]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a sample script offline on a synthetic clock
    Replay {
        /// Replay script (JSON)
        script: PathBuf,

        /// Write the event table here; a directory gets a timestamped file name
        #[arg(long)]
        csv: Option<PathBuf>,

        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Play a sample script through a live session in real time
    Live {
        script: PathBuf,

        #[arg(long)]
        csv: Option<PathBuf>,

        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Write the default settings to a file
    Defaults {
        path: PathBuf,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Summary block followed by the event table
    Text,
    /// Pretty-printed JSON
    Json,
}

#[tokio::main]
async fn main() -> ExitCode {
    proctorlens_lib::init_logging();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Replay {
            script,
            csv,
            format,
        } => {
            let settings = load_settings(cli.settings.as_deref())?;
            let script = ReplayScript::load(&script)?;
            let outcome = replay(&script, &settings);
            info!("replayed {} ticks", outcome.ticks);

            match format {
                OutputFormat::Text => {
                    println!("{}", outcome.summary.render_text());
                    println!();
                    println!("{}", to_table(&outcome.events));
                }
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&outcome)?),
            }
            if let Some(csv) = csv {
                write_table(&csv, &to_table(&outcome.events))?;
            }
            Ok(())
        }
        Commands::Live {
            script,
            csv,
            format,
        } => {
            let settings = load_settings(cli.settings.as_deref())?;
            let script = ReplayScript::load(&script)?;
            live(&script, settings, csv.as_deref(), format).await
        }
        Commands::Defaults { path } => {
            let store = SettingsStore::new(path)?;
            store.update(MonitorSettings::default())?;
            println!("wrote default settings to {}", store.path().display());
            Ok(())
        }
    }
}

async fn live(
    script: &ReplayScript,
    mut settings: MonitorSettings,
    csv: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    if let Some(interval_ms) = script.interval_ms {
        settings.sampling.sample_interval_ms = interval_ms;
    }

    let coverage = script.coverage.unwrap_or_else(proctorlens_lib::Coverage::full);
    let mut faces = ScriptedFaces::empty();
    let mut objects = ScriptedObjects::empty();
    for step in &script.steps {
        let repeat = step.repeat as usize;
        faces = faces.respond_times(step.sample.faces.clone(), repeat);
        objects = objects.respond_times(step.sample.objects.clone(), repeat);
    }

    let mut collaborators = Collaborators::new(Arc::new(ScriptedCapture::new(script.frame)))
        .with_recorder(Arc::new(MemoryRecorder::new()));
    if coverage.faces {
        collaborators = collaborators.with_faces(Arc::new(faces));
    }
    if coverage.objects {
        collaborators = collaborators.with_objects(Arc::new(objects));
    }

    let run_for = Duration::from_millis(settings.sampling.sample_interval_ms * script.tick_count());
    let controller = SessionController::new(collaborators, settings);
    controller.start().await?;
    if let Some(name) = &script.candidate {
        controller.annotate_candidate(name).await?;
    }
    tokio::time::sleep(run_for).await;
    let archive = controller.stop().await?;

    let report = archive.report();
    match format {
        OutputFormat::Text => {
            println!("{}", report.render_text());
            println!();
            println!("{}", archive.export_table());
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
    }
    if let Some(csv) = csv {
        write_table(csv, &archive.export_table())?;
    }
    Ok(())
}

fn load_settings(path: Option<&Path>) -> Result<MonitorSettings> {
    match path {
        Some(path) => Ok(SettingsStore::new(path.to_path_buf())?.settings()),
        None => Ok(MonitorSettings::default()),
    }
}

fn write_table(target: &Path, table: &str) -> Result<()> {
    let path = if target.is_dir() {
        target.join(report_file_name(chrono::Utc::now()))
    } else {
        target.to_path_buf()
    };
    fs::write(&path, table)
        .with_context(|| format!("failed to write event table to {}", path.display()))?;
    info!("event table written to {}", path.display());
    Ok(())
}
