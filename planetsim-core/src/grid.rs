use serde::{Deserialize, Serialize};

/// A cell position on the square torus.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Coord {
    pub x: usize,
    pub y: usize,
}

impl Coord {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

/// Cardinal directions in adjacency order: up, down, left, right.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    #[inline]
    pub fn offset(self) -> (isize, isize) {
        match self {
            Self::Up => (0, -1),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Right => (1, 0),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Grid2D<T> {
    width: usize,
    height: usize,
    data: Vec<T>,
}

impl<T: Clone> Grid2D<T> {
    pub fn new(width: usize, height: usize, value: T) -> Self {
        let len = width.saturating_mul(height);
        Self {
            width,
            height,
            data: vec![value; len],
        }
    }
}

impl<T> Grid2D<T> {
    /// Builds a grid from row-major data; `None` when the lengths disagree.
    pub fn from_vec(width: usize, height: usize, data: Vec<T>) -> Option<Self> {
        (data.len() == width.saturating_mul(height)).then_some(Self {
            width,
            height,
            data,
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[inline]
    pub fn idx(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    /// Wraps a signed position onto the torus.
    #[inline]
    pub fn wrap(&self, x: isize, y: isize) -> Coord {
        Coord::new(
            x.rem_euclid(self.width as isize) as usize,
            y.rem_euclid(self.height as isize) as usize,
        )
    }

    #[inline]
    pub fn step(&self, coord: Coord, direction: Direction) -> Coord {
        let (dx, dy) = direction.offset();
        self.wrap(coord.x as isize + dx, coord.y as isize + dy)
    }

    /// The four toroidal neighbours in `Direction::ALL` order.
    pub fn neighbors(&self, coord: Coord) -> [Coord; 4] {
        Direction::ALL.map(|d| self.step(coord, d))
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> &T {
        &self.data[self.idx(x, y)]
    }

    #[inline]
    pub fn get_mut(&mut self, x: usize, y: usize) -> &mut T {
        let idx = self.idx(x, y);
        &mut self.data[idx]
    }

    #[inline]
    pub fn at(&self, coord: Coord) -> &T {
        self.get(coord.x, coord.y)
    }

    #[inline]
    pub fn at_mut(&mut self, coord: Coord) -> &mut T {
        self.get_mut(coord.x, coord.y)
    }

    #[inline]
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    pub fn map<U>(&self, f: impl FnMut(&T) -> U) -> Grid2D<U> {
        Grid2D {
            width: self.width,
            height: self.height,
            data: self.data.iter().map(f).collect(),
        }
    }

    pub fn iter_coords(&self) -> impl Iterator<Item = Coord> + '_ {
        (0..self.height).flat_map(move |y| (0..self.width).map(move |x| Coord::new(x, y)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wrap_crosses_both_edges() {
        let g = Grid2D::new(5, 5, 0u8);
        assert_eq!(g.wrap(-1, 0), Coord::new(4, 0));
        assert_eq!(g.wrap(5, 7), Coord::new(0, 2));
    }

    #[test]
    fn every_cell_has_four_neighbors_on_torus() {
        let g = Grid2D::new(3, 3, 0u8);
        let n = g.neighbors(Coord::new(0, 0));
        assert_eq!(
            n,
            [
                Coord::new(0, 2),
                Coord::new(0, 1),
                Coord::new(2, 0),
                Coord::new(1, 0)
            ]
        );
    }

    #[test]
    fn single_cell_grid_neighbors_itself() {
        let g = Grid2D::new(1, 1, 0u8);
        assert!(g.neighbors(Coord::new(0, 0)).iter().all(|c| *c == Coord::new(0, 0)));
    }
}
