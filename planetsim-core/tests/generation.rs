use planetsim_core::systems::smoothing::is_smooth;
use planetsim_core::systems::worm::{run_worm, Worm};
use planetsim_core::{
    new_world, Coord, GenerationParams, ParameterKind, PlanetPreset, Tuning, World, WorldSnapshot,
};

fn earth(seed: u64) -> World {
    let params = GenerationParams {
        seed,
        ..GenerationParams::default()
    };
    new_world(params, Tuning::default()).expect("generate earth")
}

#[test]
fn earth_altitude_is_smooth() {
    let w = earth(7);
    assert!(is_smooth(&w, ParameterKind::Altitude));
    let n = w.dimensions();
    for y in 0..n {
        for x in 0..n {
            let here = w.location(Coord::new(x, y)).expect("loc");
            for c in here.adjacency() {
                let there = w.location(c).expect("neighbor");
                let diff = here.get(ParameterKind::Altitude) - there.get(ParameterKind::Altitude);
                assert!(diff.abs() < 2, "({x},{y}) vs {c:?}");
            }
        }
    }
}

#[test]
fn every_layer_stays_in_bounds() {
    for preset in PlanetPreset::ALL {
        let w = new_world(
            GenerationParams {
                preset,
                seed: 99,
                ..GenerationParams::default()
            },
            Tuning::default(),
        )
        .expect("generate");
        for location in w.locations().as_slice() {
            for kind in ParameterKind::ALL {
                let (min, max) = kind.bounds();
                let v = location.get(kind);
                assert!((min..=max).contains(&v), "{preset:?} {kind:?} = {v}");
            }
        }
    }
}

#[test]
fn running_totals_match_cells() {
    let w = earth(3);
    for kind in ParameterKind::ALL {
        let summed: i64 = w
            .locations()
            .as_slice()
            .iter()
            .map(|l| i64::from(l.get(kind)))
            .sum();
        assert_eq!(w.parameter_total(kind), summed, "{kind:?}");
    }
}

#[test]
fn worms_never_leave_bounds() {
    let mut w = World::new(GenerationParams::default(), Tuning::default()).expect("world");
    for _ in 0..200 {
        run_worm(&mut w, &Worm::additive(ParameterKind::Altitude, 1, 0).with_length(5, 30));
    }
    for _ in 0..200 {
        run_worm(&mut w, &Worm::additive(ParameterKind::Temperature, -1, 0).with_length(5, 30));
    }
    for location in w.locations().as_slice() {
        assert!((0..=5).contains(&location.get(ParameterKind::Altitude)));
        assert!((-6..=11).contains(&location.get(ParameterKind::Temperature)));
    }
}

#[test]
fn flow_conserves_water() {
    let mut w = World::new(GenerationParams::default(), Tuning::default()).expect("world");
    let n = w.dimensions();
    for y in 0..n {
        for x in 0..n {
            let c = Coord::new(x, y);
            w.set_location_parameter(c, ParameterKind::Temperature, 5, false)
                .expect("temp");
            w.set_location_parameter(c, ParameterKind::Altitude, (x % 4) as i32, false)
                .expect("alt");
        }
    }
    w.set_location_parameter(Coord::new(3, 3), ParameterKind::Water, 5, false)
        .expect("water");
    w.set_location_parameter(Coord::new(7, 11), ParameterKind::Water, 4, false)
        .expect("water");

    let before = w.parameter_total(ParameterKind::Water);
    w.flow(Coord::new(3, 3)).expect("flow");
    w.flow(Coord::new(7, 11)).expect("flow");
    assert_eq!(w.parameter_total(ParameterKind::Water), before);
}

#[test]
fn snapshot_round_trip_preserves_world() {
    let w = earth(11);
    let json = w.snapshot().to_json().expect("serialize");
    let snap = WorldSnapshot::from_json(&json).expect("parse");
    let restored = World::from_snapshot(snap, Tuning::default()).expect("restore");

    assert_eq!(restored.diagnostics().checksum, w.diagnostics().checksum);
    assert_eq!(restored.current_step(), w.current_step());
    for (a, b) in w
        .locations()
        .as_slice()
        .iter()
        .zip(restored.locations().as_slice())
    {
        assert_eq!(a.parameters(), b.parameters());
        assert_eq!(a.terrain_features(), b.terrain_features());
    }
}

#[test]
fn day_length_is_carried_but_not_simulated() {
    let slow = GenerationParams {
        seed: 8,
        rotation: 30.0,
        ..GenerationParams::default()
    };
    let w = new_world(slow, Tuning::default()).expect("generate");
    assert_eq!(w.diagnostics().checksum, earth(8).diagnostics().checksum);

    let json = w.snapshot().to_json().expect("serialize");
    let restored =
        World::from_snapshot(WorldSnapshot::from_json(&json).expect("parse"), Tuning::default())
            .expect("restore");
    assert_eq!(restored.params().rotation, 30.0);
}

#[test]
fn restored_worlds_advance_identically() {
    let w = earth(5);
    let snap = w.snapshot();
    let mut a = World::from_snapshot(snap.clone(), Tuning::default()).expect("restore a");
    let mut b = World::from_snapshot(snap, Tuning::default()).expect("restore b");
    for _ in 0..3 {
        a.advance_turn();
        b.advance_turn();
    }
    assert_eq!(a.turn(), 3);
    assert_eq!(a.diagnostics().checksum, b.diagnostics().checksum);
}

#[test]
fn generation_is_deterministic() {
    assert_eq!(earth(2024).diagnostics().checksum, earth(2024).diagnostics().checksum);
}

#[test]
fn relative_changes_clamp_at_the_bounds() {
    let mut w = World::new(GenerationParams::default(), Tuning::default()).expect("world");
    let c = Coord::new(4, 9);
    w.change_location_parameter(c, ParameterKind::Soil, 9, false)
        .expect("raise");
    assert_eq!(w.location(c).expect("loc").get(ParameterKind::Soil), 5);
    w.change_location_parameter(c, ParameterKind::Soil, -2, false)
        .expect("lower");
    assert_eq!(w.location(c).expect("loc").get(ParameterKind::Soil), 3);
    assert_eq!(w.parameter_total(ParameterKind::Soil), 3);
    assert!(w
        .change_location_parameter(Coord::new(15, 0), ParameterKind::Soil, 1, false)
        .is_err());
}
