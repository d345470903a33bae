//! cantor: sings a MIDI score through an external speech synthesizer

mod config;
mod pipeline;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[derive(Parser)]
#[command(name = "cantor")]
#[command(about = "Render MIDI tracks as sung syllables through a speech synthesizer")]
#[command(version)]
struct Cli {
    /// Path to the run configuration
    #[arg(short, long, default_value = "cantor.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render every track to a WAV file (default)
    Render,
    /// Print the notes that would be sung, after humanization and phoneme assignment
    Notes {
        /// Print JSON instead of one line per note
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("cantor=info,cantor_core=info,cantor_services=info"));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;

    match cli.command.unwrap_or(Commands::Render) {
        Commands::Render => {
            let written = pipeline::run(&config)?;
            tracing::info!("Rendered {} track(s) to {}", written.len(), config.output_dir.display());
        }
        Commands::Notes { json } => {
            let prepared = pipeline::prepare(&config)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&prepared.tracks)?);
            } else {
                for track in &prepared.tracks {
                    println!("[track {}]", track.index);
                    for note in &track.notes {
                        println!("{note}");
                    }
                }
            }
            if !prepared.rejected.is_empty() {
                tracing::warn!("Tracks without enough phonemes: {:?}", prepared.rejected);
            }
        }
    }

    Ok(())
}
