mod cli;
mod commands;
mod config;
mod render;

use blogstore::{FaultMonitor, PostStore, StoreConfig};

pub async fn run(args: Vec<String>) -> anyhow::Result<()> {
    let cmd = cli::parse_args(&args)?;
    let invocation = match cmd {
        cli::Command::Help(topic) => {
            cli::print_help(topic);
            return Ok(());
        }
        cli::Command::Run(invocation) => invocation,
    };

    let store_config = match &invocation.config {
        Some(path) => config::ProjectConfig::load(path.clone())?.store_config(),
        None => StoreConfig::from_env()?,
    };
    let store = PostStore::connect(&store_config)?;
    let mut monitor = FaultMonitor::spawn(&store);

    // Exactly one response per invocation: either the operation's output or the fault.
    let output = tokio::select! {
        output = commands::execute(&store, invocation.operation, invocation.format) => output?,
        fault = monitor.wait() => return Err(fault.into()),
    };
    println!("{output}");
    Ok(())
}
