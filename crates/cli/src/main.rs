//! kuadrantctl CLI
//!
//! Command-line interface for generating Kuadrant resources from OpenAPI
//! documents.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::*;
use kuadrantctl_generator::{AuthPolicyGenerator, OutputFormat};
use kuadrantctl_parser::OpenApiParser;
use std::process::ExitCode;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "kuadrantctl")]
#[command(version, about = "Kuadrant configuration command line utility", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output (debug logs on stderr)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Commands related to kubernetes object generation
    Generate {
        #[command(subcommand)]
        command: GenerateCommands,
    },
}

#[derive(Subcommand)]
enum GenerateCommands {
    /// Generate Kuadrant resources
    Kuadrant {
        #[command(subcommand)]
        command: KuadrantCommands,
    },
}

#[derive(Subcommand)]
enum KuadrantCommands {
    /// Generate Kuadrant AuthPolicy from OpenAPI 3.0.X
    #[command(after_help = "EXAMPLES:\n  \
        # From a local file\n  \
        kuadrantctl generate kuadrant authpolicy --oas petstore.yaml\n\n  \
        # From a URL, as JSON\n  \
        kuadrantctl generate kuadrant authpolicy --oas https://example.com/petstore.json -o json\n\n  \
        # From standard input\n  \
        cat petstore.yaml | kuadrantctl generate kuadrant authpolicy --oas -")]
    Authpolicy(AuthPolicyArgs),
}

#[derive(Args)]
struct AuthPolicyArgs {
    /// Path to OpenAPI spec file (in JSON or YAML format), URL, or '-' to read from standard input
    #[arg(long)]
    oas: String,

    /// Output format; any other value is rejected
    #[arg(short, long = "output-format", value_enum, default_value_t = Format::Yaml)]
    output_format: Format,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Format {
    /// YAML document
    Yaml,
    /// Compact JSON document
    Json,
}

impl From<Format> for OutputFormat {
    fn from(format: Format) -> Self {
        match format {
            Format::Yaml => OutputFormat::Yaml,
            Format::Json => OutputFormat::Json,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Generate {
            command:
                GenerateCommands::Kuadrant {
                    command: KuadrantCommands::Authpolicy(args),
                },
        } => generate_authpolicy_command(&args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {:#}", "error:".red().bold(), err);
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so stdout only ever carries the generated manifest
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();
}

fn generate_authpolicy_command(args: &AuthPolicyArgs) -> Result<()> {
    tracing::debug!(oas = %args.oas, format = ?args.output_format, "generating AuthPolicy");

    let parser = OpenApiParser::from_source(&args.oas)
        .with_context(|| format!("Failed to load OpenAPI spec from {}", args.oas))?;

    let generator =
        AuthPolicyGenerator::new(parser.spec()).context("Failed to build AuthPolicy")?;

    let output = generator
        .render(args.output_format.into())
        .context("Failed to render AuthPolicy")?;

    println!("{}", output.trim_end());
    Ok(())
}
