use std::collections::VecDeque;

use crate::grid::Cell;
use Direction::*;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right
}

impl Direction {
    pub fn opposite(self) -> Direction {
        match self {
            Up => Down,
            Down => Up,
            Left => Right,
            Right => Left,
        }
    }

    /// One grid step; rows grow downwards.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Up => (0, -1),
            Down => (0, 1),
            Left => (-1, 0),
            Right => (1, 0),
        }
    }
}

/// Body segments, head first, plus the applied and requested directions.
#[derive(Clone, Debug)]
pub struct Snake {
    body: VecDeque<Cell>,
    direction: Direction,
    pending: Direction,
}

impl Snake {
    /// Builds a straight snake whose head is at `head`, the body trailing
    /// behind it opposite to `direction`.
    pub fn new(head: Cell, size: usize, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        let body = (0..size as i32)
            .map(|i| head.offset(-dx * i, -dy * i))
            .collect();
        Snake { body, direction, pending: direction }
    }

    pub fn from_segments(segments: &[Cell], direction: Direction) -> Self {
        Snake { body: segments.iter().copied().collect(), direction, pending: direction }
    }

    pub fn body(&self) -> &VecDeque<Cell> {
        &self.body
    }

    pub fn segments(&self) -> Vec<Cell> {
        self.body.iter().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    pub fn head(&self) -> Option<Cell> {
        self.body.front().copied()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    #[cfg(test)]
    pub fn pending_direction(&self) -> Direction {
        self.pending
    }

    /// Buffers a turn for the next step. A reversal of the direction already
    /// applied is dropped and the previous request stays in place.
    pub fn set_pending_direction(&mut self, requested: Direction) -> bool {
        if requested == self.direction.opposite() {
            return false;
        }
        self.pending = requested;
        true
    }

    /// Applies the buffered turn and returns where the head goes next,
    /// without touching the body.
    pub fn next_head(&mut self) -> Option<Cell> {
        self.direction = self.pending;
        let (dx, dy) = self.direction.delta();
        self.head().map(|head| head.offset(dx, dy))
    }

    /// Moves one step in the current direction: prepends the new head and
    /// drops the tail unless `grow` is set. Returns the new head and the
    /// vacated tail cell, if any.
    pub fn advance(&mut self, grow: bool) -> Option<(Cell, Option<Cell>)> {
        let new_head = self.next_head()?;
        self.body.push_front(new_head);
        let old_tail = if grow { None } else { self.body.pop_back() };
        Some((new_head, old_tail))
    }
}
