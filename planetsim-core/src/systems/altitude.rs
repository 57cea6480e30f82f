use crate::error::WorldError;
use crate::location::ParameterKind;
use crate::systems::smoothing;
use crate::systems::worm::{run_worm, scaled_length, Worm};
use crate::world::World;

pub fn run(world: &mut World) -> Result<(), WorldError> {
    let baseline = world.params().altitude_baseline();
    for idx in 0..world.area() {
        world.set_at(idx, ParameterKind::Altitude, baseline, false);
    }

    let tuning = world.tuning().clone();
    let min_length = scaled_length(world, tuning.altitude_worm_min_length);
    let max_length = scaled_length(world, tuning.altitude_worm_max_length);
    for _ in 0..tuning.altitude_worm_count {
        let delta = if world.rng.chance(tuning.altitude_raise_chance) {
            1
        } else {
            -1
        };
        let worm = Worm::additive(ParameterKind::Altitude, delta, tuning.altitude_worm_bound)
            .with_length(min_length, max_length);
        run_worm(world, &worm);
    }

    if world.params().smooth_altitude() {
        smoothing::smooth_to_convergence(world, ParameterKind::Altitude)?;
    }
    Ok(())
}

/// Roughness worms only ever add and are never smoothed.
pub fn run_roughness(world: &mut World) {
    let tuning = world.tuning().clone();
    let min_length = scaled_length(world, tuning.roughness_worm_min_length);
    let max_length = scaled_length(world, tuning.roughness_worm_max_length);
    for _ in 0..tuning.roughness_worm_count {
        let worm = Worm::additive(ParameterKind::Roughness, 1, 0).with_length(min_length, max_length);
        run_worm(world, &worm);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{Customization, GenerationParams};
    use crate::tuning::Tuning;

    #[test]
    fn raised_baseline_lifts_the_floor() {
        let params = GenerationParams {
            customization: Some(Customization {
                smooth_altitude: false,
                ..Customization::default()
            }),
            ..GenerationParams::default()
        };
        let mut w = World::new(params, Tuning::default()).expect("world");
        run(&mut w).expect("altitude");
        assert!(w.average_altitude() > 1.0);
    }

    #[test]
    fn roughness_only_grows() {
        let mut w = World::new(GenerationParams::default(), Tuning::default()).expect("world");
        run_roughness(&mut w);
        assert!(w.parameter_total(ParameterKind::Roughness) > 0);
    }
}
