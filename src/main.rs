//! fontwarden CLI entry point

use std::process::ExitCode;

use clap::Parser;

use fontwarden::commands::{run_agent, run_config, run_scan, CommandContext};
use fontwarden::{Cli, Commands};

fn main() -> ExitCode {
    match run() {
        Ok(output) => {
            print!("{}", output);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            e.exit_code()
        }
    }
}

fn run() -> fontwarden::Result<String> {
    let cli = Cli::parse();
    let ctx = CommandContext::new(cli.format, cli.config.clone());

    match &cli.command {
        Commands::Run(args) => run_agent(args, &ctx),
        Commands::Scan(args) => run_scan(args, &ctx),
        Commands::Config(args) => run_config(args, &ctx),
    }
}
