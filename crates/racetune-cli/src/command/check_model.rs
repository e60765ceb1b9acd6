use std::path::PathBuf;

use anyhow::Context as _;
use racetune_driver::{model_file, modules::CarModules};
use racetune_model::tunable::Tunable as _;

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct CheckModelArg {
    /// Parameter file to validate
    #[arg(long)]
    model: PathBuf,
}

/// Indices (relative to the module) of values outside their bounds.
fn out_of_bounds(values: &[f64], lower: &[f64], upper: &[f64]) -> Vec<usize> {
    values
        .iter()
        .zip(lower.iter().zip(upper))
        .enumerate()
        .filter(|(_, (v, (lo, hi)))| *v < *lo || *v > *hi)
        .map(|(i, _)| i)
        .collect()
}

pub(crate) fn run(arg: &CheckModelArg) -> anyhow::Result<()> {
    let CheckModelArg { model } = arg;
    let mut modules = CarModules::new()?;
    let values = model_file::load(model, modules.parameter_count())?;
    modules
        .set_parameters(&values)
        .with_context(|| format!("Failed to install parameters from {}", model.display()))?;

    println!("{}: {} parameters", model.display(), values.len());
    let mut violations = 0;
    for layout in modules.layout() {
        let block = &values[layout.segment.range()];
        let outside = out_of_bounds(block, &layout.lower, &layout.upper);
        if outside.is_empty() {
            println!("  {:<14} ok", layout.name);
        } else {
            println!(
                "  {:<14} {} out of bounds at {:?}",
                layout.name,
                outside.len(),
                outside
            );
        }
        violations += outside.len();
    }

    if violations > 0 {
        eprintln!("{violations} values lie outside the search bounds");
    }
    Ok(())
}
