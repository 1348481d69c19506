//! vlf: command-line VLF cable test report wizard.
//!
//! Collects the five steps of the inspection form, either interactively
//! or from a batch answers file, and writes the filled Word report.
//!
//! # Usage
//!
//! ```text
//! vlf --templates plantillas --assets static                 # interactive
//! vlf --answers respuestas.json --uploads fotos -o informes  # batch
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

mod batch;
mod config;
mod prompt;
mod services;

use std::error::Error;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use vlf_io::{DirectoryTemplateStore, load_answers, write_download};
use vlf_wizard::{TemplateStore, Wizard};

use crate::config::{ConfigError, ReportConfig};
use crate::prompt::{Outcome, Prompter};
use crate::services::Services;

/// Fill a VLF cable test report template.
///
/// Without `--answers` every field is asked on the terminal.
#[derive(Parser)]
#[command(name = "vlf", version)]
struct Cli {
    /// Batch answers file: a JSON object keyed by field key.
    #[arg(long)]
    answers: Option<PathBuf>,

    /// Directory of segment photos named `{slotKey}.png|jpg|jpeg`.
    #[arg(long)]
    uploads: Option<PathBuf>,

    /// JSON configuration file. Flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Template directory.
    #[arg(long)]
    templates: Option<PathBuf>,

    /// Static asset directory (voltage reference images).
    #[arg(long)]
    assets: Option<PathBuf>,

    /// Street tile pyramid `{z}/{x}/{y}.png` for urban sites. Caches
    /// downloads when a street tile server is set.
    #[arg(long)]
    street_tiles: Option<PathBuf>,

    /// Satellite tile pyramid `{z}/{x}/{y}.png|jpg` for rural sites.
    #[arg(long)]
    satellite_tiles: Option<PathBuf>,

    /// Street tile server URL template with `{z}`, `{x}` and `{y}`.
    #[arg(long)]
    street_tiles_url: Option<String>,

    /// Satellite tile server URL template.
    #[arg(long)]
    satellite_tiles_url: Option<String>,

    /// Never contact tile servers; use only the tile pyramids.
    #[arg(long, conflicts_with_all = ["street_tiles_url", "satellite_tiles_url"])]
    offline: bool,

    /// Report file or directory.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Meters shown above and below a rural site.
    #[arg(long)]
    satellite_buffer: Option<f64>,

    /// Tile zoom for both map kinds.
    #[arg(long, value_parser = clap::value_parser!(u8).range(0..=22))]
    zoom: Option<u8>,

    /// Print the assembled report context as JSON instead of writing a report.
    #[arg(long)]
    print_context: bool,

    /// Debug logging.
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "info,vlf=debug,vlf_wizard=debug,vlf_map=debug,vlf_export=debug,vlf_io=debug"
    } else {
        "info"
    };
    let filter = if verbose {
        tracing_subscriber::EnvFilter::new(default)
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn config_from_cli(cli: &Cli) -> Result<ReportConfig, ConfigError> {
    let mut config = match &cli.config {
        Some(path) => ReportConfig::load(path)?,
        None => ReportConfig::default(),
    };
    if let Some(dir) = &cli.templates {
        config.templates_dir.clone_from(dir);
    }
    if let Some(dir) = &cli.assets {
        config.assets_dir.clone_from(dir);
    }
    if let Some(dir) = &cli.street_tiles {
        config.street_tiles_dir = Some(dir.clone());
    }
    if let Some(dir) = &cli.satellite_tiles {
        config.satellite_tiles_dir = Some(dir.clone());
    }
    if let Some(url) = &cli.street_tiles_url {
        config.street_tiles_url = Some(url.clone());
    }
    if let Some(url) = &cli.satellite_tiles_url {
        config.satellite_tiles_url = Some(url.clone());
    }
    if cli.offline {
        config.street_tiles_url = None;
        config.satellite_tiles_url = None;
    }
    if let Some(output) = &cli.output {
        config.output.clone_from(output);
    }
    if let Some(buffer) = cli.satellite_buffer {
        config.assembly.satellite_buffer_m = buffer;
    }
    if let Some(zoom) = cli.zoom {
        config.assembly.marker_map_zoom = zoom;
        config.assembly.satellite_zoom = zoom;
    }
    Ok(config)
}

/// Render the report of a completed wizard, or dump its context.
///
/// Returns the path written, `None` when only the context was printed.
fn finish<T: TemplateStore>(
    wizard: &Wizard<T>,
    services: &Services,
    print_context: bool,
) -> Result<Option<PathBuf>, Box<dyn Error>> {
    let collaborators = services.collaborators();
    if print_context {
        let context = wizard.build_context(&collaborators)?;
        println!("{}", serde_json::to_string_pretty(&context)?);
        return Ok(None);
    }
    let download = wizard.render(&collaborators, services.renderer())?;
    Ok(Some(write_download(&download, &services.config().output)?))
}

fn run(cli: &Cli) -> Result<(), Box<dyn Error>> {
    let services = Services::new(config_from_cli(cli)?)?;
    let templates = DirectoryTemplateStore::new(&services.config().templates_dir);
    let mut wizard = Wizard::new(templates);

    if let Some(path) = &cli.answers {
        let answers = load_answers(path)?;
        batch::fill(&mut wizard, &answers, cli.uploads.as_deref())?;
    } else {
        let mut prompter = Prompter::new(io::stdin().lock(), io::stdout().lock());
        if prompter.run(&mut wizard)? == Outcome::Quit {
            tracing::info!(step = wizard.step().number(), "session abandoned");
            return Ok(());
        }
    }

    if let Some(path) = finish(&wizard, &services, cli.print_context)? {
        println!("{}", path.display());
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            let mut source = err.source();
            while let Some(cause) = source {
                eprintln!("  caused by: {cause}");
                source = cause.source();
            }
            ExitCode::FAILURE
        }
    }
}
