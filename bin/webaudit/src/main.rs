mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "webaudit")]
#[command(about = "AI-powered web performance & security auditor", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the audit gateway (long-running daemon)
    Serve {
        /// Port to listen on (overrides config gateway.port)
        #[arg(short, long)]
        port: Option<u16>,

        /// Host to bind to (overrides config gateway.host)
        #[arg(long)]
        host: Option<String>,
    },

    /// Audit a single URL and print the combined report
    Audit {
        /// Target website URL (http/https)
        url: String,
    },

    /// Inspect the procedures declared by the automation subprocess
    Tools {
        #[command(subcommand)]
        command: ToolsCommands,
    },

    /// Show current configuration status
    Status,
}

#[derive(Subcommand)]
enum ToolsCommands {
    /// List declared procedures
    List,
    /// Print full procedure definitions as JSON
    Export,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup tracing
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    match cli.command {
        Commands::Serve { port, host } => {
            commands::serve::run(host, port).await?;
        }
        Commands::Audit { url } => {
            commands::audit_cmd::run(&url).await?;
        }
        Commands::Tools { command } => match command {
            ToolsCommands::List => {
                commands::tools_cmd::list().await?;
            }
            ToolsCommands::Export => {
                commands::tools_cmd::export().await?;
            }
        },
        Commands::Status => {
            commands::status::run().await?;
        }
    }

    Ok(())
}
