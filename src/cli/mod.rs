pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "chatbi")]
#[command(about = "ChatBI CLI - compile semantic queries and manage credentials")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Compile a semantic query JSON document to SQL")]
    Compile(commands::compile::CompileArgs),

    #[command(about = "Encode or decode credential header values")]
    Token {
        #[command(subcommand)]
        cmd: commands::token::TokenCommands,
    },

    #[command(about = "Run the HTTP server")]
    Serve,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
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

    match cli.command {
        Commands::Compile(args) => commands::compile::handle(args, output_format),
        Commands::Token { cmd } => commands::token::handle(cmd, output_format),
        Commands::Serve => commands::serve::handle().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_token_encode_with_repeated_roles() {
        let cli = Cli::try_parse_from([
            "chatbi", "--json", "token", "encode", "--user-id", "u1", "--role", "ADMIN", "--role", "USER",
        ])
        .unwrap();
        assert!(matches!(OutputFormat::from_cli(&cli), OutputFormat::Json));
        match cli.command {
            Commands::Token {
                cmd: commands::token::TokenCommands::Encode { user_id, role, .. },
            } => {
                assert_eq!(user_id, "u1");
                assert_eq!(role, vec!["ADMIN", "USER"]);
            }
            _ => panic!("expected token encode"),
        }
    }
}
