//! Toroidal distance and the pole/equator layout derived from it.
//!
//! The north pole is pinned at `(0, 0)`; the south pole is the cell farthest
//! from it. Latitude lines run pole to pole through every equator cell, and
//! extra lines are added until every cell sits on at least one.

use serde::{Deserialize, Serialize};

use crate::error::WorldError;
use crate::grid::{Coord, Direction, Grid2D};
use crate::location::PoleWeights;

const EPS: f64 = 1e-9;
const NORTHERN_TROPIC_LATITUDE: f64 = 0.37;
const SOUTHERN_TROPIC_LATITUDE: f64 = 0.63;

#[inline]
pub fn axis_distance(a: usize, b: usize, n: usize) -> usize {
    let d = a.abs_diff(b);
    d.min(n.saturating_sub(d))
}

#[inline]
pub fn x_distance(a: Coord, b: Coord, n: usize) -> usize {
    axis_distance(a.x, b.x, n)
}

#[inline]
pub fn y_distance(a: Coord, b: Coord, n: usize) -> usize {
    axis_distance(a.y, b.y, n)
}

#[inline]
pub fn manhattan_distance(a: Coord, b: Coord, n: usize) -> usize {
    x_distance(a, b, n) + y_distance(a, b, n)
}

#[inline]
pub fn euclidean_distance(a: Coord, b: Coord, n: usize) -> f64 {
    let dx = x_distance(a, b, n) as f64;
    let dy = y_distance(a, b, n) as f64;
    dx.hypot(dy)
}

/// Shortest signed offset from `from` to `to` along one wrapped axis. An exact
/// half-turn resolves to the positive direction.
#[inline]
pub fn signed_axis_delta(from: usize, to: usize, n: usize) -> isize {
    if n == 0 {
        return 0;
    }
    let n = n as isize;
    let mut d = (to as isize - from as isize).rem_euclid(n);
    if d * 2 > n {
        d -= n;
    }
    d
}

/// Four-connected line from `from` to `to` along the shortest wrap. Each step
/// advances the axis that is further behind the ideal slope; ties go to x
/// unless `prefer_y` is set. Both endpoints are included.
pub fn draw_coordinate_line(from: Coord, to: Coord, n: usize, prefer_y: bool) -> Vec<Coord> {
    let dx = signed_axis_delta(from.x, to.x, n);
    let dy = signed_axis_delta(from.y, to.y, n);
    let mut line = Vec::with_capacity(dx.unsigned_abs() + dy.unsigned_abs() + 1);
    line.push(from);

    let (mut cx, mut cy) = (0isize, 0isize);
    while (cx, cy) != (dx, dy) {
        let rx = dx - cx;
        let ry = dy - cy;
        let x_lag = rx.unsigned_abs() * dy.unsigned_abs();
        let y_lag = ry.unsigned_abs() * dx.unsigned_abs();
        let step_x = if rx == 0 {
            false
        } else if ry == 0 || x_lag > y_lag {
            true
        } else if x_lag < y_lag {
            false
        } else {
            !prefer_y
        };
        if step_x {
            cx += rx.signum();
        } else {
            cy += ry.signum();
        }
        line.push(wrap(from, cx, cy, n));
    }
    line
}

#[inline]
fn wrap(origin: Coord, dx: isize, dy: isize, n: usize) -> Coord {
    let n = n.max(1) as isize;
    Coord::new(
        (origin.x as isize + dx).rem_euclid(n) as usize,
        (origin.y as isize + dy).rem_euclid(n) as usize,
    )
}

/// Pole, equator and latitude-line layout for one grid size.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PoleTopology {
    pub dimensions: usize,
    pub north_pole: Coord,
    pub south_pole: Coord,
    pub equator: Vec<Coord>,
    pub northern_tropic: Vec<Coord>,
    pub southern_tropic: Vec<Coord>,
    pub latitude_lines: Vec<Vec<Coord>>,
    pub alternate_latitude_lines: Vec<Vec<Coord>>,
    north_distance: Grid2D<f64>,
    south_distance: Grid2D<f64>,
    line_of: Grid2D<Option<usize>>,
}

impl PoleTopology {
    pub fn build(dimensions: usize) -> Self {
        let n = dimensions.max(1);
        let probe = Grid2D::new(n, n, 0.0f64);
        let north_pole = Coord::new(0, 0);

        let mut north_distance = probe.map(|_| 0.0);
        let mut south_pole = north_pole;
        let mut farthest = -1.0;
        for c in probe.iter_coords() {
            let d = euclidean_distance(north_pole, c, n);
            *north_distance.at_mut(c) = d;
            if d > farthest + EPS {
                farthest = d;
                south_pole = c;
            }
        }

        let mut south_distance = probe.map(|_| 0.0);
        for c in probe.iter_coords() {
            *south_distance.at_mut(c) = euclidean_distance(south_pole, c, n);
        }

        let mut topology = Self {
            dimensions: n,
            north_pole,
            south_pole,
            equator: Vec::new(),
            northern_tropic: Vec::new(),
            southern_tropic: Vec::new(),
            latitude_lines: Vec::new(),
            alternate_latitude_lines: Vec::new(),
            north_distance,
            south_distance,
            line_of: Grid2D::new(n, n, None),
        };
        topology.equator = topology.find_equator(&probe);
        topology.latitude_lines = topology.trace_lines(false);
        topology.alternate_latitude_lines = topology.trace_lines(true);
        for (i, line) in topology.latitude_lines.iter().enumerate() {
            for c in line {
                let slot = topology.line_of.at_mut(*c);
                if slot.is_none() {
                    *slot = Some(i);
                }
            }
        }
        topology.northern_tropic = topology.band_along_lines(NORTHERN_TROPIC_LATITUDE);
        topology.southern_tropic = topology.band_along_lines(SOUTHERN_TROPIC_LATITUDE);

        tracing::debug!(
            target: "planetsim::geometry",
            dimensions = n,
            south_x = south_pole.x,
            south_y = south_pole.y,
            equator_cells = topology.equator.len(),
            latitude_lines = topology.latitude_lines.len(),
            "geometry.topology.built"
        );
        topology
    }

    #[inline]
    fn pole_difference(&self, c: Coord) -> f64 {
        self.north_distance.at(c) - self.south_distance.at(c)
    }

    /// Cells equidistant from both poles. Where no cell is exactly equidistant
    /// the boundary between hemispheres is used, taking the northern side below
    /// the diagonal and the southern side above it so the band stays one cell
    /// thick on even grids.
    fn find_equator(&self, probe: &Grid2D<f64>) -> Vec<Coord> {
        if self.north_pole == self.south_pole {
            return Vec::new();
        }
        let mut equator = Vec::new();
        for c in probe.iter_coords() {
            if c == self.north_pole || c == self.south_pole {
                continue;
            }
            let d = self.pole_difference(c);
            if d.abs() < EPS {
                equator.push(c);
                continue;
            }
            let crosses = Direction::ALL.into_iter().any(|dir| {
                let m = probe.step(c, dir);
                let dm = self.pole_difference(m);
                dm.abs() >= EPS && (dm > 0.0) != (d > 0.0)
            });
            if !crosses {
                continue;
            }
            let north_side = d < 0.0;
            if (north_side && c.x >= c.y) || (!north_side && c.x < c.y) {
                equator.push(c);
            }
        }
        equator
    }

    fn pole_to_pole(&self, via: Coord, prefer_y: bool) -> Vec<Coord> {
        let n = self.dimensions;
        let mut line = draw_coordinate_line(self.north_pole, via, n, prefer_y);
        let tail = draw_coordinate_line(via, self.south_pole, n, prefer_y);
        line.extend(tail.into_iter().skip(1));
        line
    }

    fn trace_lines(&self, prefer_y: bool) -> Vec<Vec<Coord>> {
        let n = self.dimensions;
        let mut covered = Grid2D::new(n, n, false);
        let mut lines = Vec::with_capacity(self.equator.len() + 4);
        for &e in &self.equator {
            let line = self.pole_to_pole(e, prefer_y);
            for c in &line {
                *covered.at_mut(*c) = true;
            }
            lines.push(line);
        }
        let cells: Vec<Coord> = covered.iter_coords().collect();
        for c in cells {
            if *covered.at(c) {
                continue;
            }
            let line = self.pole_to_pole(c, prefer_y);
            for p in &line {
                *covered.at_mut(*p) = true;
            }
            lines.push(line);
        }
        lines
    }

    /// One cell per latitude line: the one whose latitude fraction is closest
    /// to `latitude`.
    fn band_along_lines(&self, latitude: f64) -> Vec<Coord> {
        let mut band: Vec<Coord> = Vec::new();
        if self.north_pole == self.south_pole {
            return band;
        }
        for line in &self.latitude_lines {
            let best = line
                .iter()
                .copied()
                .filter(|c| *c != self.north_pole && *c != self.south_pole)
                .min_by(|a, b| {
                    let da = (self.latitude_fraction(*a) - latitude).abs();
                    let db = (self.latitude_fraction(*b) - latitude).abs();
                    da.total_cmp(&db)
                });
            if let Some(c) = best {
                if !band.contains(&c) {
                    band.push(c);
                }
            }
        }
        band.sort();
        band
    }

    /// 0 at the north pole, 1 at the south pole.
    pub fn latitude_fraction(&self, c: Coord) -> f64 {
        let dn = *self.north_distance.at(c);
        let ds = *self.south_distance.at(c);
        if dn + ds < EPS {
            0.5
        } else {
            dn / (dn + ds)
        }
    }

    pub fn north_distance(&self, c: Coord) -> f64 {
        *self.north_distance.at(c)
    }

    pub fn south_distance(&self, c: Coord) -> f64 {
        *self.south_distance.at(c)
    }

    pub fn pole_to_pole_distance(&self) -> f64 {
        *self.north_distance.at(self.south_pole)
    }

    pub fn is_equator(&self, c: Coord) -> bool {
        self.equator.contains(&c)
    }

    /// Index of the first latitude line passing through `c`.
    pub fn latitude_line_of(&self, c: Coord) -> Result<usize, WorldError> {
        let n = self.dimensions;
        if c.x >= n || c.y >= n {
            return Err(WorldError::CoordinateOutOfBounds {
                x: c.x,
                y: c.y,
                dimensions: n,
            });
        }
        self.line_of
            .at(c)
            .ok_or(WorldError::MissingLatitudeLine { x: c.x, y: c.y })
    }

    pub fn pole_weights(&self, c: Coord) -> PoleWeights {
        let span = self.pole_to_pole_distance();
        if span < EPS {
            return PoleWeights::default();
        }
        let dn = *self.north_distance.at(c);
        let ds = *self.south_distance.at(c);
        let pole_distance = (dn.min(ds) / (span / 2.0)).clamp(0.1, 1.0);
        PoleWeights {
            pole_distance,
            north_pole_distance: (dn / span).clamp(0.1, 1.0),
            south_pole_distance: (ds / span).clamp(0.1, 1.0),
            inverse_pole_distance: (1.1 - pole_distance).clamp(0.1, 1.0),
        }
    }
}
