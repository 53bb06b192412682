use std::cmp::max;
use std::collections::VecDeque;

use crate::grid::{Cell, Grid};

/// What a candidate head position means for the step.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    WallCollision,
    SelfCollision,
    AteFood,
    Moved,
}

/// Classifies `new_head` against the body as it was before the step.
///
/// The tail is still part of `body` here, so stepping into the cell the tail
/// is about to leave counts as a self collision.
pub fn check_outcome(new_head: Cell, body: &VecDeque<Cell>, food: Option<Cell>, grid: &Grid) -> Outcome {
    if !grid.in_bounds(new_head) {
        Outcome::WallCollision
    } else if body.contains(&new_head) {
        Outcome::SelfCollision
    } else if food == Some(new_head) {
        Outcome::AteFood
    } else {
        Outcome::Moved
    }
}

/// Tick interval in ms for a score: half a millisecond faster per point,
/// never below `min_ms`.
pub fn speed_for_score(score: u32, initial_ms: u64, min_ms: u64) -> u64 {
    max(initial_ms.saturating_sub(u64::from(score) / 2), min_ms)
}
