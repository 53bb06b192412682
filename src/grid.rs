use std::cmp::{max, min};

/// A board position in grid units. Signed so a head that steps off the
/// top or left edge is still representable.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Cell { x, y }
    }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Cell { x: self.x + dx, y: self.y + dy }
    }
}

/// Square board of `cells x cells`, each `cell_size` pixels wide.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    cells: i32,
    cell_size: u32,
}

impl Grid {
    /// A zero `cell_size` is treated as 1.
    pub fn from_board(board_px: u32, cell_size: u32) -> Self {
        let cell_size = max(cell_size, 1);
        Grid { cells: (board_px / cell_size) as i32, cell_size }
    }

    /// Board edge for the space available, following the canvas rule:
    /// leave a margin, never exceed `max_px`, keep at least one cell.
    pub fn responsive_board_px(available_px: u32, margin: u32, max_px: u32, cell_size: u32) -> u32 {
        let px = min(available_px.saturating_sub(margin), max_px);
        max(px, cell_size)
    }

    pub fn cols(&self) -> i32 {
        self.cells
    }

    pub fn rows(&self) -> i32 {
        self.cells
    }

    pub fn board_px(&self) -> u32 {
        self.cells as u32 * self.cell_size
    }

    pub fn in_bounds(&self, cell: Cell) -> bool {
        cell.x >= 0 && cell.y >= 0 && cell.x < self.cols() && cell.y < self.rows()
    }

    pub fn area(&self) -> usize {
        (self.cols() * self.rows()) as usize
    }

    /// Every cell of the board, row by row.
    pub fn cells(&self) -> impl Iterator<Item = Cell> {
        let (cols, rows) = (self.cols(), self.rows());
        (0..rows).flat_map(move |y| (0..cols).map(move |x| Cell::new(x, y)))
    }

    #[cfg(test)]
    pub fn to_pixels(&self, cell: Cell) -> (i32, i32) {
        let size = self.cell_size as i32;
        (cell.x * size, cell.y * size)
    }

    #[cfg(test)]
    pub fn from_pixels(&self, px: (i32, i32)) -> Cell {
        let size = self.cell_size as i32;
        Cell::new(px.0.div_euclid(size), px.1.div_euclid(size))
    }
}
