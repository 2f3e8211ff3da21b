use clap::Args;
use serde_json::json;
use std::path::PathBuf;

use crate::cli::utils::{output_error, output_success, read_input};
use crate::cli::OutputFormat;
use crate::semantic::{extract_semantic_query, validate, SqlCompiler};

#[derive(Args, Debug)]
pub struct CompileArgs {
    #[arg(help = "Semantic query JSON file (reads stdin when omitted or '-')")]
    pub file: Option<PathBuf>,

    #[arg(long, help = "Fail when the query does not pass validation")]
    pub validate: bool,
}

pub fn handle(args: CompileArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let input = read_input(args.file.as_deref())?;
    let query = extract_semantic_query(&input)?;

    let validation = validate(&query);
    let sql = SqlCompiler::compile(&query);

    match output_format {
        OutputFormat::Json => output_success(
            &output_format,
            "Compiled",
            Some(json!({
                "sql": sql,
                "valid": validation.is_ok(),
                "error": validation.as_ref().err().map(|e| e.to_string()),
            })),
        )?,
        OutputFormat::Text => println!("{}", sql),
    }

    if args.validate {
        if let Err(e) = validation {
            if matches!(output_format, OutputFormat::Text) {
                output_error(&output_format, &e.to_string(), Some("invalid_query"))?;
            }
            anyhow::bail!("semantic query failed validation: {}", e);
        }
    }
    Ok(())
}
