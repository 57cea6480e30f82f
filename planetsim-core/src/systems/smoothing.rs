use crate::error::WorldError;
use crate::location::ParameterKind;
use crate::world::World;

/// One shuffled pass over every cell. Each neighbour pair that differs by 2
/// or more is pulled together by one step, either end chosen at random.
/// Returns the number of nudges made.
pub fn sweep(world: &mut World, parameter: ParameterKind) -> usize {
    let mut order: Vec<usize> = (0..world.area()).collect();
    world.rng.shuffle(&mut order);
    let notify = !world.setup_in_progress;

    let mut changes = 0;
    for idx in order {
        for neighbor in world.neighbor_indices(idx) {
            let a = world.value_at(idx, parameter);
            let b = world.value_at(neighbor, parameter);
            if (a - b).abs() < 2 {
                continue;
            }
            let (high, low) = if a > b { (idx, neighbor) } else { (neighbor, idx) };
            if world.rng.chance(0.5) {
                world.change_at(high, parameter, -1, notify);
            } else {
                world.change_at(low, parameter, 1, notify);
            }
            changes += 1;
        }
    }
    changes
}

/// Sweeps until a pass makes no change.
pub fn smooth_to_convergence(world: &mut World, parameter: ParameterKind) -> Result<usize, WorldError> {
    let max_sweeps = world.tuning().smoothing_max_sweeps;
    for pass in 1..=max_sweeps {
        if sweep(world, parameter) == 0 {
            tracing::debug!(
                target: "planetsim::worldgen",
                parameter = parameter.name(),
                sweeps = pass,
                "worldgen.smoothing.settled"
            );
            return Ok(pass);
        }
    }
    tracing::warn!(
        target: "planetsim::worldgen",
        parameter = parameter.name(),
        sweeps = max_sweeps,
        "worldgen.smoothing.cap_reached"
    );
    Err(WorldError::Smoothing {
        parameter,
        sweeps: max_sweeps,
    })
}

/// True when no two neighbours differ by 2 or more.
pub fn is_smooth(world: &World, parameter: ParameterKind) -> bool {
    (0..world.area()).all(|idx| {
        let value = world.value_at(idx, parameter);
        world
            .neighbor_indices(idx)
            .iter()
            .all(|n| (world.value_at(*n, parameter) - value).abs() < 2)
    })
}
