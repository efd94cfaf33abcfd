//! Command-line surface for evaluating loop device-status exports.

pub mod bootstrap_helpers;
pub mod cli_args;
pub mod evaluate_command;

pub use cli_args::{Cli, Command, EvaluateArgs};
pub use evaluate_command::{
    execute_evaluate_command, render_evaluate_report, run_evaluate, settings_from_args,
    EvaluateReport,
};
