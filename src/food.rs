use rand::seq::IteratorRandom;
use rand::Rng;

use crate::grid::{Cell, Grid};

/// Random draws tried before falling back to picking among the free cells.
const MAX_SAMPLE_ATTEMPTS: usize = 64;

/// Picks a random in-bounds cell not covered by `occupied`.
///
/// Rejection sampling first, so placement on a sparse board stays a couple of
/// random draws. A crowded board falls back to a uniform choice among the
/// remaining free cells. `None` means the board is full.
pub fn place_food<R: Rng + ?Sized>(grid: &Grid, occupied: &[Cell], rng: &mut R) -> Option<Cell> {
    if grid.area() == 0 {
        return None;
    }

    for _ in 0..MAX_SAMPLE_ATTEMPTS {
        let candidate = Cell::new(rng.gen_range(0..grid.cols()), rng.gen_range(0..grid.rows()));
        if !occupied.contains(&candidate) {
            return Some(candidate);
        }
    }

    grid.cells().filter(|cell| !occupied.contains(cell)).choose(rng)
}
