//! npcli - numpy-style array expressions for shell pipelines
//!
//! Usage:
//!   npcli 'd * 2' < numbers.txt
//!   npcli 'd1 + d2' a.txt b.txt
//!   npcli --help

mod cli;

use cli::{parse_args, print_help, print_version};
use env_logger::Env;
use log::LevelFilter;
use std::env;
use std::io;
use std::process::ExitCode;

fn init_logging(debug: bool) {
    let mut builder = env_logger::Builder::from_env(Env::default().filter_or("NPCLI_LOG", "warn"));
    if debug {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.format_timestamp(None).init();
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().collect();
    let cli = match parse_args(&args) {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("npcli: config error: {}", e);
            eprintln!("Try 'npcli --help' for usage.");
            return ExitCode::FAILURE;
        }
    };

    if cli.help {
        print_help();
        return ExitCode::SUCCESS;
    }

    if cli.version {
        print_version();
        return ExitCode::SUCCESS;
    }

    init_logging(cli.debug);

    let invocation = match cli.into_invocation() {
        Ok(inv) => inv,
        Err(e) => {
            eprintln!("npcli: config error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    log::debug!("invocation: {:?}", invocation);

    let stdin = io::stdin();
    let stdout = io::stdout();
    match npcli::run(&invocation, &mut stdin.lock(), &mut stdout.lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("npcli: {} error: {}", e.stage(), e);
            ExitCode::FAILURE
        }
    }
}
