//! Plantid: identify plants from photos with the Pl@ntNet API.
//!
//! A photo goes through two pure stages around a single HTTP call:
//!
//! - [`request`]: normalizes the photo (RGB, longer edge at most 1024 px,
//!   JPEG quality 85) and lays it out as a multipart identification request.
//! - [`response`]: classifies the service reply into ranked candidates or a
//!   typed [`IdentifyError`].
//!
//! [`client`] performs the blocking HTTP exchange between the two, and
//! [`render`] formats results for the terminal. The CLI in this crate is one
//! front end; any other UI can drive the same functions.
//!
//! # Modules
//!
//! - [`model`]: projects, organs, candidates and confidence tiers
//! - [`inspect`]: header-level image details
//! - [`error`]: error types for plantid operations

pub mod client;
pub mod error;
pub mod inspect;
pub mod model;
pub mod render;
pub mod request;
pub mod response;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

pub use client::{ClientConfig, PlantNetClient};
pub use error::{ErrorKind, IdentifyError, PlantIdError};
pub use model::{Candidate, ConfidenceTier, Identification, Organ, Outcome, Project};
pub use request::{build_request, build_request_from_image, IdentificationRequest};
pub use response::{interpret, TransportError};

/// Normalizes `image_bytes` and sends one identification request.
///
/// Credential and image problems are reported before any network traffic.
pub fn identify<T: client::Transport>(
    client: &PlantNetClient<T>,
    image_bytes: &[u8],
    api_key: &str,
    project: Project,
    organ: Organ,
) -> Outcome {
    let request = build_request(image_bytes, api_key, project, organ)?;
    client.identify(&request)
}

/// The plantid CLI application.
#[derive(Parser)]
#[command(name = "plantid")]
#[command(version, about)]
#[command(propagate_version = true)]
struct Cli {
    /// Increase log verbosity (-v for info, -vv for debug).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Identify the plant in a photo.
    Identify(IdentifyArgs),
    /// Show image details and the size it will be uploaded at.
    Inspect(InspectArgs),
    /// List the available projects and organs.
    List,
}

/// Arguments for the identify subcommand.
#[derive(clap::Args)]
struct IdentifyArgs {
    /// Photo of the plant (JPEG, PNG, BMP, GIF or WebP).
    image: PathBuf,

    /// Flora project to search ('all', 'weurope', 'k-world-flora', 'weeds', 'crop').
    #[arg(long, default_value = "all")]
    project: Project,

    /// Plant part shown in the photo ('leaf', 'flower', 'fruit', 'bark', 'habit').
    #[arg(long, default_value = "leaf")]
    organ: Organ,

    /// Pl@ntNet API key.
    #[arg(long, env = "PLANTNET_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Identification endpoint; the project is appended as a path segment.
    #[arg(long, env = "PLANTNET_API_URL", default_value = client::DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Request timeout in seconds.
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    timeout: u64,

    /// Output format ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,
}

/// Arguments for the inspect subcommand.
#[derive(clap::Args)]
struct InspectArgs {
    /// Image file to inspect.
    image: PathBuf,

    /// Output format ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    Text,
    Json,
}

fn parse_output(value: &str) -> Result<OutputFormat, PlantIdError> {
    match value {
        "text" => Ok(OutputFormat::Text),
        "json" => Ok(OutputFormat::Json),
        other => Err(PlantIdError::UnsupportedOutput(format!(
            "'{}' (supported: text, json)",
            other
        ))),
    }
}

/// Run the plantid CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), PlantIdError> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Some(Commands::Identify(args)) => run_identify(args),
        Some(Commands::Inspect(args)) => run_inspect(args),
        Some(Commands::List) => {
            run_list();
            Ok(())
        }
        None => {
            println!("plantid {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Identify plants from photos using the Pl@ntNet API.");
            println!();
            println!("Run 'plantid --help' for usage information.");
            Ok(())
        }
    }
}

/// Logs go to stderr so stdout stays clean for reports.
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_env("PLANTID_LOG")
        .unwrap_or_else(|_| EnvFilter::new(format!("plantid={default_level}")));

    // A subscriber may already be installed when run() is called twice in-process.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Execute the identify subcommand.
fn run_identify(args: IdentifyArgs) -> Result<(), PlantIdError> {
    let output = parse_output(&args.output)?;

    let api_key = args.api_key.unwrap_or_default();
    if api_key.trim().is_empty() {
        return Err(IdentifyError::with_detail(
            ErrorKind::InvalidCredential,
            "API key is required (pass --api-key or set PLANTNET_API_KEY)",
        )
        .into());
    }

    let image_bytes = std::fs::read(&args.image).map_err(|source| PlantIdError::ImageRead {
        path: args.image.clone(),
        source,
    })?;

    let config = ClientConfig {
        endpoint: args.endpoint,
        timeout: Duration::from_secs(args.timeout),
        ..ClientConfig::default()
    };
    let client = PlantNetClient::new(&config)?;

    let outcome = identify(&client, &image_bytes, &api_key, args.project, args.organ);

    match (output, outcome) {
        (OutputFormat::Text, Ok(identification)) => {
            print!("{}", render::IdentificationReport::new(&identification));
            Ok(())
        }
        (OutputFormat::Json, Ok(identification)) => {
            let json =
                render::identification_to_json(&identification).map_err(PlantIdError::JsonWrite)?;
            println!("{}", json);
            Ok(())
        }
        (OutputFormat::Text, Err(error)) => Err(error.into()),
        (OutputFormat::Json, Err(error)) => {
            let json = render::error_to_json(&error).map_err(PlantIdError::JsonWrite)?;
            println!("{}", json);
            Err(error.into())
        }
    }
}

/// Execute the inspect subcommand.
fn run_inspect(args: InspectArgs) -> Result<(), PlantIdError> {
    let output = parse_output(&args.output)?;
    let details = inspect::inspect_image(&args.image)?;

    match output {
        OutputFormat::Text => print!("{}", details),
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&details).map_err(PlantIdError::JsonWrite)?;
            println!("{}", json);
        }
    }
    Ok(())
}

/// Execute the list subcommand.
fn run_list() {
    println!("Projects:");
    for project in Project::ALL {
        println!("  {:<15} {}", project.as_str(), project.description());
    }
    println!();
    println!("Organs:");
    for organ in Organ::ALL {
        println!("  {:<15} {}", organ.as_str(), organ.description());
    }
}
