pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "threadlink",
    about = "threadlink operator CLI",
    long_about = "Inspect configuration, check readiness and push single events through the Slack-to-Jira pipeline.",
    after_help = "Examples:\n  threadlink doctor --json\n  threadlink config\n  threadlink invoke --file event.json"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, Slack token shape and tracker URL")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Run one webhook body through the pipeline and print the response")]
    Invoke {
        #[arg(long, help = "Path to the JSON file to send")]
        file: PathBuf,
        #[arg(long, help = "Treat the file as an invocation envelope (`{\"body\": ...}`)")]
        envelope: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Config => commands::config::run(),
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Invoke { file, envelope } => commands::invoke::run(&file, envelope),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
