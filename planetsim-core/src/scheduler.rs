use std::time::Instant;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::params::GenerationParams;
use crate::systems;
use crate::tuning::Tuning;
use crate::world::World;

const LOG_TARGET: &str = "planetsim::worldgen";

/// Generation stages in their required order; later stages read the
/// aggregates earlier ones leave behind.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Step {
    Altitude,
    Roughness,
    Temperature,
    Water,
    Soil,
    Vegetation,
    TerrainFeatures,
    PostProcess,
    Equilibrium,
}

impl Step {
    pub const ALL: [Step; 9] = [
        Step::Altitude,
        Step::Roughness,
        Step::Temperature,
        Step::Water,
        Step::Soil,
        Step::Vegetation,
        Step::TerrainFeatures,
        Step::PostProcess,
        Step::Equilibrium,
    ];

    /// Position in the pipeline, counting from 1.
    pub fn ordinal(self) -> usize {
        match self {
            Step::Altitude => 1,
            Step::Roughness => 2,
            Step::Temperature => 3,
            Step::Water => 4,
            Step::Soil => 5,
            Step::Vegetation => 6,
            Step::TerrainFeatures => 7,
            Step::PostProcess => 8,
            Step::Equilibrium => 9,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Step::Altitude => "altitude",
            Step::Roughness => "roughness",
            Step::Temperature => "temperature",
            Step::Water => "water",
            Step::Soil => "soil",
            Step::Vegetation => "vegetation",
            Step::TerrainFeatures => "terrain_features",
            Step::PostProcess => "post_process",
            Step::Equilibrium => "equilibrium",
        }
    }

    pub fn next(self) -> Option<Step> {
        let position = Step::ALL.iter().position(|s| *s == self)?;
        Step::ALL.get(position + 1).copied()
    }
}

pub fn run_step(world: &mut World, step: Step) -> Result<()> {
    world.setup_in_progress = true;
    let start = Instant::now();
    tracing::info!(target: LOG_TARGET, step = step.name(), "worldgen.step.start");

    match step {
        Step::Altitude => systems::altitude::run(world).context("generating altitude")?,
        Step::Roughness => systems::altitude::run_roughness(world),
        Step::Temperature => {
            systems::temperature::run(world).context("generating temperature")?;
        }
        Step::Water => systems::water::run(world),
        Step::Soil => systems::soil_vegetation::run_soil(world),
        Step::Vegetation => systems::soil_vegetation::run_vegetation(world),
        Step::TerrainFeatures => systems::features::run(world),
        Step::PostProcess => systems::post_process::run(world),
        Step::Equilibrium => {
            let report = world.simulate_climate_equilibrium();
            tracing::info!(
                target: LOG_TARGET,
                iterations = report.iterations,
                converged = report.converged,
                target = report.target,
                "worldgen.equilibrium"
            );
            finish_generation(world);
        }
    }

    let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
    world.current_step = Some(step);
    world.step_timings_ms.insert(step, elapsed_ms);
    world.update_diagnostics();
    tracing::info!(
        target: LOG_TARGET,
        step = step.name(),
        elapsed_ms,
        checksum = %world.diagnostics.checksum,
        "worldgen.step.finish"
    );
    Ok(())
}

fn finish_generation(world: &mut World) {
    world.setup_in_progress = false;
    let vapor = world.water_vapor();
    world.refresh_clouds(vapor);
    world.refresh_expected_offsets();
    world.climate.current_atmosphere_offset = world.atmosphere_offset();
    world.climate.sky_color = world.sky_color();
}

pub fn run_next_step(world: &mut World) -> Result<Option<Step>> {
    let next = match world.current_step {
        None => Some(Step::Altitude),
        Some(step) => step.next(),
    };
    if let Some(step) = next {
        run_step(world, step)?;
    }
    Ok(next)
}

pub fn run_all_steps(world: &mut World) -> Result<()> {
    for step in Step::ALL {
        run_step(world, step)?;
    }
    Ok(())
}

/// Builds a world and runs every generation stage.
pub fn new_world(params: GenerationParams, tuning: Tuning) -> Result<World> {
    let mut world = World::new(params, tuning).context("building world")?;
    run_all_steps(&mut world)?;
    Ok(world)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steps_chain_in_order() {
        let mut walked = vec![Step::Altitude];
        while let Some(next) = walked.last().and_then(|s| s.next()) {
            walked.push(next);
        }
        assert_eq!(walked, Step::ALL.to_vec());
    }

    #[test]
    fn ordinals_count_from_one() {
        for (position, step) in Step::ALL.into_iter().enumerate() {
            assert_eq!(step.ordinal(), position + 1);
        }
        assert_eq!(Step::Altitude.next(), Some(Step::Roughness));
        assert_eq!(Step::Equilibrium.next(), None);
    }

    #[test]
    fn stepping_records_progress_and_timings() {
        let mut w = World::new(GenerationParams::default(), Tuning::default()).expect("world");
        assert_eq!(run_next_step(&mut w).expect("step"), Some(Step::Altitude));
        assert_eq!(w.current_step(), Some(Step::Altitude));
        assert!(w.step_timings_ms().contains_key(&Step::Altitude));
        assert!(!w.diagnostics().checksum.is_empty());
        assert_eq!(run_next_step(&mut w).expect("step"), Some(Step::Roughness));
    }

    #[test]
    fn full_run_ends_outside_setup() {
        let w = new_world(GenerationParams::default(), Tuning::default()).expect("generate");
        assert_eq!(w.current_step(), Some(Step::Equilibrium));
        assert!(!w.setup_in_progress);
        assert_eq!(w.step_timings_ms().len(), Step::ALL.len());
    }
}
