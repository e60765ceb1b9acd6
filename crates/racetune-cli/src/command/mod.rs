use clap::{Parser, Subcommand};

use self::{
    bench::BenchArg, check_model::CheckModelArg, control::ControlArg, layout::LayoutArg,
};

mod bench;
mod check_model;
mod control;
mod layout;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Show where each control module lives in the parameter vector
    Layout(#[clap(flatten)] LayoutArg),
    /// Validate a parameter file against the control modules
    CheckModel(#[clap(flatten)] CheckModelArg),
    /// Run one control step on a sensor snapshot
    Control(#[clap(flatten)] ControlArg),
    /// Run the swarm against a synthetic objective
    Bench(#[clap(flatten)] BenchArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    match args.mode {
        Mode::Layout(arg) => layout::run(&arg)?,
        Mode::CheckModel(arg) => check_model::run(&arg)?,
        Mode::Control(arg) => control::run(&arg)?,
        Mode::Bench(arg) => bench::run(&arg)?,
    }
    Ok(())
}
