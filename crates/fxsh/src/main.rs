//! fxsh binary
//!
//! Run with: `fxsh [--store DIR] [--slack BYTES] [SCRIPT]`. `FXSH_STORE` and
//! `FXSH_SLACK` stand in for the flags; `RUST_LOG` controls logging.

use std::io::Write;
use std::sync::Arc;

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use tokio::io::AsyncBufReadExt;
use tokio::io::BufReader;
use tracing::info;
use tracing_subscriber::EnvFilter;

use fxrun::Config;
use fxrun::Runtime;
use fxsh::Outcome;
use fxsh::Settings;
use fxsh::Shell;
use fxstore::DirStore;

fn prompt() -> Result<()> {
    print!(">> ");
    std::io::stdout().flush().context("Failed to flush stdout")
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let settings = Settings::parse();
    let store = DirStore::open(&settings.store)
        .await
        .with_context(|| format!("Failed to open store at {}", settings.store.display()))?;
    let config = Config::standard().slack(settings.slack);
    let runtime = Runtime::with_config(Arc::new(store), config)?;
    let shell = Shell::new(runtime);
    info!(store = %settings.store.display(), slack = settings.slack, "fxsh ready");

    if let Some(script) = &settings.script {
        match shell.run_script(script).await {
            Ok(outcome) => println!("{}", outcome),
            Err(e) => eprintln!("{}", e),
        }
    }

    println!("{}", fxsh::shell::HELP);
    prompt()?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        if !line.trim().is_empty() {
            match shell.exec_line(&line).await {
                Ok(Outcome::Exit) => break,
                Ok(outcome) => println!("{}", outcome),
                Err(e) => eprintln!("{}", e),
            }
        }
        prompt()?;
    }
    Ok(())
}
