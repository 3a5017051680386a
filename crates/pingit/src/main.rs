#![warn(clippy::all, clippy::pedantic, clippy::nursery, rust_2018_idioms)]
#![allow(
    clippy::module_name_repetitions,
    clippy::redundant_field_names,
    clippy::struct_field_names,
    clippy::option_if_let_else,
    clippy::missing_const_for_fn,
    clippy::cast_precision_loss,
    clippy::redundant_pub_crate,
    clippy::struct_excessive_bools
)]
#![forbid(unsafe_code)]

use crate::config::PingitAction;
use clap::Parser;
use config::Args;
use pingit_privilege::Privilege;

mod app;
mod config;
mod history;
mod print;
mod report;

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let privilege = Privilege::acquire_privileges()?;
    match PingitAction::from(args, &privilege)? {
        PingitAction::Ping(cfg) => app::run_pingit(&cfg, &privilege)?,
        PingitAction::PrintConfigTemplate => print::print_config_template(),
        PingitAction::PrintShellCompletions(shell) => print::print_shell_completions(shell)?,
    }
    Ok(())
}
