pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "agency")]
#[command(about = "Agency admin CLI - password hashes, tokens, migrations and first admin")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Print a bcrypt hash of a password")]
    HashPassword {
        #[arg(help = "Plain-text password")]
        password: String,
    },

    #[command(about = "Mint a bearer token with the configured secret")]
    Token(commands::token::TokenArgs),

    #[command(about = "Apply the bundled SQL migrations")]
    Migrate,

    #[command(about = "Create an admin role with every permission and its first staff member")]
    BootstrapAdmin(commands::bootstrap::BootstrapArgs),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);
    let config = crate::config::config();

    match cli.command {
        Commands::HashPassword { password } => commands::password::handle(&password, config, output_format),
        Commands::Token(args) => commands::token::handle(args, config, output_format),
        Commands::Migrate => commands::migrate::handle(config, output_format).await,
        Commands::BootstrapAdmin(args) => commands::bootstrap::handle(args, config, output_format).await,
    }
}
