use racetune_driver::modules::{CarModules, ModuleLayout};
use serde::Serialize;

use crate::util;

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct LayoutArg {
    /// Print the full per-parameter bounds as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Debug, Clone, Serialize)]
struct LayoutEntry {
    name: &'static str,
    offset: usize,
    len: usize,
    lower: Vec<f64>,
    upper: Vec<f64>,
}

impl From<ModuleLayout> for LayoutEntry {
    fn from(layout: ModuleLayout) -> Self {
        Self {
            name: layout.name,
            offset: layout.segment.offset,
            len: layout.segment.len,
            lower: layout.lower,
            upper: layout.upper,
        }
    }
}

fn range_of(values: &[f64]) -> (f64, f64) {
    values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        })
}

pub(crate) fn run(arg: &LayoutArg) -> anyhow::Result<()> {
    let modules = CarModules::new()?;
    let entries = modules
        .layout()
        .into_iter()
        .map(LayoutEntry::from)
        .collect::<Vec<_>>();

    if arg.json {
        return util::write_json(&entries, None);
    }

    println!(
        "{:<14} {:>6} {:>5}  {:>21}  {:>21}",
        "module", "offset", "len", "lower (min..max)", "upper (min..max)"
    );
    for entry in &entries {
        let (lower_min, lower_max) = range_of(&entry.lower);
        let (upper_min, upper_max) = range_of(&entry.upper);
        println!(
            "{:<14} {:>6} {:>5}  {lower_min:>10.3}..{lower_max:<9.3}  {upper_min:>10.3}..{upper_max:<9.3}",
            entry.name, entry.offset, entry.len,
        );
    }
    let total = entries.iter().map(|e| e.len).sum::<usize>();
    println!("total parameters: {total}");
    Ok(())
}
