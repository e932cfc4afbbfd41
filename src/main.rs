//! Learnix mention responder — one-shot CLI entry point.
//!
//! Reads a mention from the command line, answers it via the configured
//! LLM provider, and prints the answer plus the new privacy-safe summary.
//! The caller (the chat backend) stores the summary and passes it back in
//! on the next mention.
//!
//! Startup sequence:
//!   1. Load .env (if present)
//!   2. Load config
//!   3. Init logger at configured level
//!   4. Build the LLM provider
//!   5. Respond and print
//!
//! # Usage
//!
//! ```text
//! learnix-responder [flags] <message...>
//!
//! Flags:
//!   --memory <text>        prior privacy-safe summary (default: none)
//!   --memory-file <path>   read the prior summary from a file
//!   --config <path>        config file (default: config/default.toml)
//!   --help, -h             print this help
//! ```
//!
//! The answer goes to stdout, followed by the new summary after a
//! `--- summary ---` separator. Logs go to stderr.

use std::path::PathBuf;
use std::process;

use tracing::info;

use learnix_responder::config;
use learnix_responder::error::AppError;
use learnix_responder::llm::providers;
use learnix_responder::logger;
use learnix_responder::responder::Responder;

const USAGE: &str = "usage: learnix-responder [--memory <text> | --memory-file <path>] [--config <path>] <message...>";

#[derive(Debug)]
struct CliArgs {
    message: String,
    memory: String,
    config_path: PathBuf,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<CliArgs, String> {
    let mut memory: Option<String> = None;
    let mut memory_file: Option<PathBuf> = None;
    let mut config_path = PathBuf::from("config/default.toml");
    let mut message_parts: Vec<String> = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" | "-h" => return Err(USAGE.to_string()),
            "--memory" => {
                memory = Some(args.next().ok_or("--memory requires a value")?);
            }
            "--memory-file" => {
                memory_file = Some(PathBuf::from(
                    args.next().ok_or("--memory-file requires a value")?,
                ));
            }
            "--config" => {
                config_path = PathBuf::from(args.next().ok_or("--config requires a value")?);
            }
            other if other.starts_with("--") => {
                return Err(format!("unknown flag: {other}\n{USAGE}"));
            }
            _ => message_parts.push(arg),
        }
    }

    if message_parts.is_empty() {
        return Err(format!("no message given\n{USAGE}"));
    }
    if memory.is_some() && memory_file.is_some() {
        return Err("--memory and --memory-file are mutually exclusive".to_string());
    }

    let memory = match memory_file {
        Some(path) => std::fs::read_to_string(&path)
            .map_err(|e| format!("cannot read {}: {e}", path.display()))?,
        None => memory.unwrap_or_default(),
    };

    Ok(CliArgs {
        message: message_parts.join(" "),
        memory,
        config_path,
    })
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    // Load .env if present — ignore errors (file is optional).
    let _ = dotenvy::dotenv();

    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(msg) => {
            eprintln!("{msg}");
            process::exit(2);
        }
    };

    let config = config::load(&args.config_path)?;
    // Reject bad level strings up front — EnvFilter would accept them as
    // target directives and silently log nothing.
    logger::parse_level(&config.log_level)?;
    logger::init(&config.log_level)?;

    info!(
        provider = %config.llm.provider,
        model = %config.llm.gemini.model,
        "config loaded"
    );

    let provider = providers::build(&config.llm, config.api_key.clone())?;
    let responder = Responder::new(provider, &config.prompts_dir);

    let reply = responder.respond(&args.message, &args.memory).await?;

    println!("{}", reply.answer);
    println!();
    println!("--- summary ---");
    println!("{}", reply.summary);

    Ok(())
}
