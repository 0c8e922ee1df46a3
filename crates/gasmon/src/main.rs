//! gasmon: gas cylinder monitoring dashboard
//!
//! Drives the dashboard view state from the command line, either one
//! command at a time (`exec`) or through an interactive shell (`run`).

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use gasmon::commands::{COMMANDS, CommandRequest, exec_once, handle_command, summary};
use gasmon::{Confirm, FixedAnswer, GasmonConfig, create_controller};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "gasmon")]
#[command(about = "Gas cylinder monitoring dashboard")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the interactive dashboard shell
    Run {
        /// Path to config file (default: ~/.gasmon/config.json)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Execute one dashboard command and print the JSON result
    ///
    /// Examples:
    ///   gasmon exec session.login
    ///   gasmon exec tank.refill
    ///   gasmon exec settings.threshold --params '{"value": 35}'
    ///   gasmon exec order.delete --params '{"id": "2024001", "confirm": true}'
    Exec {
        /// Command name (e.g. tank.refill, order.create, settings.vendor)
        command: String,

        /// JSON parameters for the command (default: {})
        #[arg(long, default_value = "{}")]
        params: String,

        /// Path to config file (default: ~/.gasmon/config.json)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print the dashboard summary
    Status {
        /// Path to config file (default: ~/.gasmon/config.json)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Generate a sample config file
    InitConfig {
        /// Path to write config (default: ~/.gasmon/config.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

fn config_path(path: Option<PathBuf>) -> PathBuf {
    path.unwrap_or_else(|| gasmon::config::default_state_path().join("config.json"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Keep stdout clean JSON for one-shot commands
    if matches!(cli.command, Commands::Run { .. } | Commands::InitConfig { .. }) {
        tracing_subscriber::registry()
            .with(fmt::layer().with_writer(std::io::stderr))
            .with(EnvFilter::from_default_env().add_directive("gasmon=info".parse()?))
            .init();
    }

    match cli.command {
        Commands::Run { config } => {
            run_shell(config_path(config)).await?;
        }
        Commands::Exec {
            command,
            params,
            config,
        } => {
            exec_command(&command, &params, config_path(config)).await?;
        }
        Commands::Status { config } => {
            let config = GasmonConfig::load_or_default(&config_path(config))?;
            let ctrl = create_controller(&config)?;
            println!("{}", serde_json::to_string_pretty(&summary(&ctrl.snapshot().await))?);
        }
        Commands::InitConfig { output } => {
            init_config(config_path(output))?;
        }
    }

    Ok(())
}

// ─── Run ─────────────────────────────────────────────────────────────────────

/// Reads the answer from the shell's own input stream.
struct LinePrompt<'a> {
    lines: &'a Mutex<Lines<BufReader<Stdin>>>,
}

#[async_trait]
impl Confirm for LinePrompt<'_> {
    async fn confirm(&self, prompt: &str) -> bool {
        print!("{prompt} [y/N] ");
        let _ = std::io::stdout().flush();
        match self.lines.lock().await.next_line().await {
            Ok(Some(answer)) => matches!(answer.trim(), "y" | "Y" | "yes"),
            _ => false,
        }
    }
}

async fn run_shell(config_path: PathBuf) -> anyhow::Result<()> {
    let config = GasmonConfig::load_or_default(&config_path)?;
    info!(
        config = %config_path.display(),
        state = %config.state_path.display(),
        provider = ?config.insight.provider,
        "starting gasmon"
    );

    let ctrl = create_controller(&config)?;
    ctrl.resume().await;

    let mut toasts = ctrl.subscribe_toasts();
    let printer = tokio::spawn(async move {
        while toasts.changed().await.is_ok() {
            let shown = toasts.borrow_and_update().clone();
            if let Some(toast) = shown {
                println!("  [{:?}] {}", toast.kind, toast.message);
            }
        }
    });

    println!("gasmon v{}: type 'help' for commands, 'quit' to exit", env!("CARGO_PKG_VERSION"));
    let lines = Mutex::new(BufReader::new(tokio::io::stdin()).lines());

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.lock().await.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (command, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        match command {
            "quit" | "exit" => break,
            "help" => {
                for name in COMMANDS {
                    println!("  {name}");
                }
                continue;
            }
            _ => {}
        }

        let params: serde_json::Value = if rest.trim().is_empty() {
            serde_json::json!({})
        } else {
            match serde_json::from_str(rest) {
                Ok(v) => v,
                Err(e) => {
                    println!("invalid JSON params: {e}");
                    continue;
                }
            }
        };

        let fixed = params.get("confirm").and_then(|v| v.as_bool()).map(FixedAnswer);
        let prompt = LinePrompt { lines: &lines };
        let confirm: &dyn Confirm = match &fixed {
            Some(answer) => answer,
            None => &prompt,
        };

        match handle_command(&ctrl, CommandRequest::new(command, params), confirm).await {
            Ok(result) => println!("{}", serde_json::to_string_pretty(&result)?),
            Err(e) => {
                error!(command, error = %e, "command failed");
                println!("error: {e}");
            }
        }
    }

    ctrl.shutdown();
    printer.abort();
    info!("gasmon stopped");
    Ok(())
}

// ─── Exec ─────────────────────────────────────────────────────────────────────

async fn exec_command(command: &str, params_str: &str, config_path: PathBuf) -> anyhow::Result<()> {
    let params: serde_json::Value = serde_json::from_str(params_str)
        .map_err(|e| anyhow::anyhow!("invalid JSON params: {e}"))?;
    let confirm = FixedAnswer(
        params
            .get("confirm")
            .and_then(|v| v.as_bool())
            .unwrap_or(false),
    );

    let config = GasmonConfig::load_or_default(&config_path)?;
    let ctrl = create_controller(&config)?;

    match exec_once(&ctrl, CommandRequest::new(command, params), &confirm).await {
        Ok(out) => {
            println!("{}", serde_json::to_string_pretty(&out)?);
            ctrl.shutdown();
        }
        Err(e) => {
            let err = serde_json::json!({
                "ok": false,
                "error": e.to_string(),
                "command": command,
            });
            println!("{}", serde_json::to_string_pretty(&err)?);
            std::process::exit(1);
        }
    }

    Ok(())
}

// ─── InitConfig ───────────────────────────────────────────────────────────────

fn init_config(output: PathBuf) -> anyhow::Result<()> {
    let config = GasmonConfig::default();
    config.save(&output)?;

    println!("Config written to {}", output.display());
    println!();
    println!("Set insight.api_key (or GEMINI_API_KEY), then run:");
    println!("  gasmon run --config {}", output.display());

    Ok(())
}
