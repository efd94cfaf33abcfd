use anyhow::Result;
use clap::Parser;
use loopwatch_cli::bootstrap_helpers::init_tracing;
use loopwatch_cli::{execute_evaluate_command, Cli, Command};

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    match cli.command {
        Command::Evaluate(args) => {
            let output = execute_evaluate_command(&args)?;
            println!("{output}");
        }
    }
    Ok(())
}
