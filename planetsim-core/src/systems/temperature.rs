use crate::error::WorldError;
use crate::location::ParameterKind;
use crate::systems::smoothing;
use crate::systems::worm::{run_worm, scaled_length, Worm, WormWeight};
use crate::world::World;

/// Seeds temperatures around the estimated target, then carves cold poles
/// and a warm equator before settling on the target average.
pub fn run(world: &mut World) -> Result<(), WorldError> {
    let target = world.estimate_target_temperature();
    let variation = world.tuning().initial_temperature_variation;
    for idx in 0..world.area() {
        let jitter = world.rng.uniform_f64(-variation, variation);
        let value = (target + jitter).round() as i32;
        world.set_at(idx, ParameterKind::Temperature, value, false);
    }
    smoothing::smooth_to_convergence(world, ParameterKind::Temperature)?;

    run_pole_worms(world);
    run_equator_worms(world);

    let target = world.estimate_target_temperature();
    world.change_to_temperature_target(target);
    Ok(())
}

fn worm_lengths(world: &World) -> (usize, usize) {
    let tuning = world.tuning();
    (
        scaled_length(world, tuning.temperature_worm_min_length),
        scaled_length(world, tuning.temperature_worm_max_length),
    )
}

fn run_pole_worms(world: &mut World) {
    let (min_length, max_length) = worm_lengths(world);
    let poles = [world.topology().north_pole, world.topology().south_pole];
    for _ in 0..world.tuning().temperature_worm_count {
        for pole in poles {
            let worm = Worm::additive(ParameterKind::Temperature, -1, 1)
                .with_length(min_length, max_length)
                .starting_at(pole)
                .weighted_by(WormWeight::InversePoleDistance);
            run_worm(world, &worm);
        }
    }
}

fn run_equator_worms(world: &mut World) {
    let equator = world.topology().equator.clone();
    if equator.is_empty() {
        return;
    }
    let (min_length, max_length) = worm_lengths(world);
    for _ in 0..world.tuning().temperature_worm_count {
        let start = equator[world.rng.index(equator.len())];
        let worm = Worm::additive(ParameterKind::Temperature, 1, 1)
            .with_length(min_length, max_length)
            .starting_at(start)
            .weighted_by(WormWeight::PoleDistance);
        run_worm(world, &worm);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::GenerationParams;
    use crate::tuning::Tuning;

    #[test]
    fn earth_average_lands_on_target() {
        let mut w = World::new(GenerationParams::default(), Tuning::default()).expect("world");
        run(&mut w).expect("temperature");
        let target = w.climate().average_temperature_target;
        let tolerance = w.tuning().temperature_tolerance;
        assert!((w.average_temperature() - target).abs() <= tolerance + 1e-9);
    }

    fn flat_world(value: i32) -> World {
        let mut w = World::new(GenerationParams::default(), Tuning::default()).expect("world");
        for idx in 0..w.area() {
            w.set_at(idx, ParameterKind::Temperature, value, false);
        }
        w
    }

    #[test]
    fn pole_worms_only_cool() {
        let mut w = flat_world(3);
        run_pole_worms(&mut w);
        let north = w.topology().north_pole;
        assert!(w.location(north).expect("loc").get(ParameterKind::Temperature) < 3);
        assert!(w
            .locations()
            .as_slice()
            .iter()
            .all(|l| l.get(ParameterKind::Temperature) <= 3));
    }

    #[test]
    fn equator_worms_only_warm() {
        let mut w = flat_world(3);
        run_equator_worms(&mut w);
        assert!(w.parameter_total(ParameterKind::Temperature) > 3 * 225);
        assert!(w
            .locations()
            .as_slice()
            .iter()
            .all(|l| l.get(ParameterKind::Temperature) >= 3));
    }
}
