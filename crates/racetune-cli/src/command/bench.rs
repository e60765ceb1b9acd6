use std::{f64::consts::PI, path::PathBuf};

use chrono::Utc;
use racetune_driver::controller::{Controller, ControllerOptions};
use racetune_model::tunable::{Bounds, ParameterBlock};
use racetune_swarm::{solution::Task, topology::TopologyKind};
use tracing::info;

use crate::{config::Config, schema::bench_report::BenchReport, util};

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::FromStr)]
pub enum BenchFunction {
    #[default]
    #[display("sphere")]
    Sphere,
    #[display("rastrigin")]
    Rastrigin,
}

impl BenchFunction {
    /// Search box used for every dimension.
    fn bounds(self, dimension: usize) -> anyhow::Result<Bounds> {
        let limit = match self {
            Self::Sphere => 100.0,
            Self::Rastrigin => 5.12,
        };
        Ok(Bounds::uniform(dimension, -limit, limit)?)
    }

    /// Objective value; both functions have their minimum 0 at the origin.
    fn cost(self, x: &[f64]) -> f64 {
        match self {
            Self::Sphere => x.iter().map(|v| v * v).sum(),
            Self::Rastrigin => x
                .iter()
                .map(|v| v * v - 10.0 * (2.0 * PI * v).cos() + 10.0)
                .sum(),
        }
    }
}

#[derive(Default, Debug, Clone, clap::Args)]
pub(crate) struct BenchArg {
    #[arg(long, default_value = "sphere")]
    function: BenchFunction,
    #[arg(long, default_value_t = 10)]
    dimension: usize,
    /// Configuration file
    #[arg(long)]
    config: Option<PathBuf>,
    /// Seed for the swarm's random source
    #[arg(long)]
    seed: Option<u64>,
    /// Overrides the configured topology
    #[arg(long)]
    topology: Option<TopologyKind>,
    /// Overrides the configured particle count
    #[arg(long)]
    particles: Option<usize>,
    /// Report output file path
    #[arg(long)]
    output: Option<PathBuf>,
    /// Where to keep the best vector found so far
    #[arg(long)]
    model_output: Option<PathBuf>,
}

fn fitness_of(task: Task, cost: f64) -> f64 {
    match task {
        Task::Maximize => -cost,
        Task::Minimize => cost,
    }
}

pub(crate) fn run(arg: &BenchArg) -> anyhow::Result<()> {
    let BenchArg {
        function,
        dimension,
        config,
        seed,
        topology,
        particles,
        output,
        model_output,
    } = arg;

    let mut swarm = Config::load(config.as_deref())?.swarm;
    if let Some(topology) = topology {
        swarm.topology = *topology;
    }
    if let Some(particles) = particles {
        swarm.particle_count = *particles;
    }
    swarm.validate()?;

    let modules = ParameterBlock::new(function.bounds(*dimension)?);
    let options = ControllerOptions {
        model_path: model_output.clone(),
        seed: *seed,
    };
    let mut controller = Controller::training(modules, &swarm, options)?;
    info!(%function, dimension, "benchmark started");

    while !controller.finished_learning() {
        let cost = function.cost(&controller.parameters());
        controller.update(fitness_of(swarm.task, cost))?;
    }

    let Some(optimizer) = controller.optimizer() else {
        anyhow::bail!("benchmark controller is not training");
    };
    let best_position = optimizer.best_position()?.to_vec();
    let best_cost = function.cost(&best_position);
    let termination = optimizer
        .termination_reason()
        .map(|reason| reason.to_string())
        .unwrap_or_default();
    let report = BenchReport {
        function: function.to_string(),
        dimension: *dimension,
        seed: controller.seed(),
        swarm: swarm.clone(),
        iterations: optimizer.iterations(),
        evaluations: optimizer.evaluations(),
        termination,
        best_fitness: fitness_of(swarm.task, best_cost),
        best_cost,
        best_position,
        finished_at: Utc::now(),
    };
    info!(
        best_cost = report.best_cost,
        iterations = report.iterations,
        evaluations = report.evaluations,
        termination = %report.termination,
        "benchmark finished"
    );
    util::write_json(&report, output.as_deref())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_functions_vanish_at_origin() {
        for function in [BenchFunction::Sphere, BenchFunction::Rastrigin] {
            assert!(function.cost(&[0.0; 4]).abs() < 1e-12);
            assert!(function.cost(&[1.0; 4]) > 0.0);
        }
        assert!((BenchFunction::Sphere.cost(&[3.0, 4.0]) - 25.0).abs() < 1e-12);
    }

    #[test]
    fn test_function_names() {
        assert_eq!("rastrigin".parse::<BenchFunction>().unwrap(), BenchFunction::Rastrigin);
        assert_eq!(BenchFunction::Sphere.to_string(), "sphere");
        assert_eq!(BenchFunction::Rastrigin.bounds(3).unwrap().upper(), &[5.12; 3]);
    }

    #[test]
    fn test_swarm_improves_on_sphere() {
        let modules = ParameterBlock::new(BenchFunction::Sphere.bounds(3).unwrap());
        let options = ControllerOptions {
            model_path: None,
            seed: Some(5),
        };
        let swarm = racetune_swarm::params::SwarmParams {
            particle_count: 15,
            max_iterations: 60,
            ..Default::default()
        };
        let mut controller = Controller::training(modules, &swarm, options).unwrap();
        let first = BenchFunction::Sphere.cost(&controller.parameters());
        while !controller.finished_learning() {
            let cost = BenchFunction::Sphere.cost(&controller.parameters());
            controller.update(fitness_of(Task::Maximize, cost)).unwrap();
        }
        let best = controller.optimizer().unwrap().best_fitness().unwrap();
        assert!(-best <= first);
    }
}
