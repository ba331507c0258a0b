mod cli;
mod watch;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands, WindowArgs};
use crate::watch::run_watch;

fn run_mean(window: WindowArgs, values: Vec<i64>) -> Result<()> {
    let dwa = window.build()?;
    dwa.add(&values);
    info!(samples = values.len(), capacity = dwa.capacity(), "Recorded samples");
    println!("{}", dwa.value());
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
        .ok();

    let cli = Cli::parse();
    let result: Result<()> = match cli.command {
        Some(Commands::Mean { window, values }) => run_mean(window, values),
        Some(Commands::Watch(watch)) => run_watch(watch),
        None => {
            Cli::command().print_help().ok();
            println!();
            Ok(())
        }
    };

    if let Err(err) = result {
        let code = exit_code_for_error(&err);
        eprintln!("error: {err:?}");
        std::process::exit(code);
    }
}

pub(crate) fn exit_code_for_error(err: &anyhow::Error) -> i32 {
    // 2: invalid window configuration, 3: I/O failure, 1: other
    for cause in err.chain() {
        if cause.is::<dwa::ConfigError>() {
            return 2;
        }
        if cause.is::<std::io::Error>() {
            return 3;
        }
    }
    1
}
