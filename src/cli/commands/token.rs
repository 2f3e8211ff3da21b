use anyhow::Context;
use clap::Subcommand;
use serde_json::json;

use crate::auth::{decode_credential, IdentityClaim};
use crate::cli::utils::output_success;
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum TokenCommands {
    #[command(about = "Print a base64 credential header value")]
    Encode {
        #[arg(long, help = "Whitelist user id")]
        user_id: String,
        #[arg(long, help = "Display name")]
        name: Option<String>,
        #[arg(long, help = "Role name (repeatable)")]
        role: Vec<String>,
    },

    #[command(about = "Decode a JSON or base64 JSON credential")]
    Decode {
        #[arg(help = "Credential header value")]
        value: String,
    },
}

pub fn handle(cmd: TokenCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        TokenCommands::Encode { user_id, name, role } => {
            let mut claim = IdentityClaim::new(user_id).with_roles(role);
            if let Some(name) = name {
                claim = claim.with_name(name);
            }
            let credential = claim.to_credential().context("encoding credential")?;

            match output_format {
                OutputFormat::Text => println!("{}", credential),
                OutputFormat::Json => output_success(
                    &output_format,
                    "Credential encoded",
                    Some(json!({ "credential": credential, "claim": claim })),
                )?,
            }
            Ok(())
        }
        TokenCommands::Decode { value } => {
            let claim = decode_credential(&value).context("credential is neither JSON nor base64 JSON")?;
            if claim.user_id.is_none() {
                tracing::warn!("Decoded credential has no userId and would be rejected by the gate");
            }

            match output_format {
                OutputFormat::Text => println!("{}", serde_json::to_string_pretty(&claim)?),
                OutputFormat::Json => {
                    output_success(&output_format, "Credential decoded", Some(json!({ "claim": claim })))?
                }
            }
            Ok(())
        }
    }
}
