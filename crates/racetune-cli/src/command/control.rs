use std::path::PathBuf;

use racetune_driver::{
    controller::ControllerOptions, driver::Driver, state::CarState,
};

use crate::{config::Config, util};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct ControlArg {
    /// Parameter file to install
    #[arg(long)]
    model: PathBuf,
    /// Sensor snapshot (JSON)
    #[arg(long)]
    state: PathBuf,
    /// Configuration file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Output file path
    #[arg(long)]
    output: Option<PathBuf>,
}

pub(crate) fn run(arg: &ControlArg) -> anyhow::Result<()> {
    let ControlArg {
        model,
        state,
        config,
        output,
    } = arg;
    let config = Config::load(config.as_deref())?;
    let state: CarState = util::read_json_file("sensor snapshot", state)?;

    let options = ControllerOptions {
        model_path: Some(model.clone()),
        seed: None,
    };
    let mut driver = Driver::deployment(config.episode, options)?;
    let control = driver.drive(&state);
    util::write_json(&control, output.as_deref())?;
    Ok(())
}
