use crate::grid::{Cell, Grid};
use crate::snake::Direction;
use crate::state::{Ending, GameState, Snapshot};
use crate::{Coords, TermInt};
use std::{io::{Stdout, Write, stdout}, time::Duration};

use crossterm::{cursor, execute, queue, style, terminal};
use crossterm::terminal::{ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::event::{Event, KeyEvent, read, poll};

/// Terminal columns per board cell, so cells come out roughly square.
pub const CELL_WIDTH: TermInt = 2;

const SNAKE_BODY: [char; 2] = ['█', '█'];
const DEAD_SNAKE: [char; 2] = ['X', 'X'];
const FOOD_PULSE: [[char; 2]; 2] = [['@', '@'], ['o', 'o']];
const EMPTY: [char; 2] = [' ', ' '];

pub struct TermManager {
    width: TermInt,
    height: TermInt,
    stdout: Stdout,
    screen: Vec<char>,
    current_msg: Option<Message>,
    origin: Coords,
}

struct Message {
    top_left: Coords,
    width: TermInt,
    height: TermInt,
}

impl TermManager {
    pub fn new() -> crossterm::Result<Self> {
        let (width, height) = terminal::size()?;
        let stdout = stdout();
        let screen = vec![' '; width as usize * height as usize];
        Ok(TermManager { width, height, stdout, screen, current_msg: None, origin: (1, 1) })
    }

    pub fn setup(&mut self) -> crossterm::Result<()> {
        execute!(self.stdout, EnterAlternateScreen)?;
        terminal::enable_raw_mode()?;
        execute!(self.stdout, cursor::Hide, cursor::DisableBlinking)
    }

    pub fn restore(&mut self) -> crossterm::Result<()> {
        terminal::disable_raw_mode()?;
        execute!(self.stdout, cursor::Show, cursor::EnableBlinking, LeaveAlternateScreen)
    }

    pub fn read_key_blocking(&self) -> crossterm::Result<KeyEvent> {
        loop {
            if let Event::Key(ev) = read()? {
                return Ok(ev);
            }
        }
    }

    /// Waits up to `timeout` for the first event, then drains whatever else
    /// is queued.
    pub fn read_key_events(&self, timeout: Duration) -> crossterm::Result<Vec<KeyEvent>> {
        let mut events = vec![];
        let mut wait = timeout;

        while poll(wait)? {
            if let Event::Key(ev) = read()? {
                events.push(ev);
            }
            wait = Duration::from_millis(0);
        }

        Ok(events)
    }

    pub fn get_terminal_size(&self) -> Coords {
        (self.width, self.height)
    }

    /// Board cells that fit on screen next to the border and status line.
    pub fn available_cells(&self) -> u32 {
        let cols = self.width.saturating_sub(2) / CELL_WIDTH;
        let rows = self.height.saturating_sub(3);
        u32::from(cols.min(rows))
    }

    /// Clears the screen and draws the frame for `grid`, centred.
    pub fn layout(&mut self, grid: &Grid) -> crossterm::Result<()> {
        self.clear()?;

        let inner_w = grid.cols() as TermInt * CELL_WIDTH;
        let inner_h = grid.rows() as TermInt;
        let left = self.width.saturating_sub(inner_w + 2) / 2;
        let top = self.height.saturating_sub(inner_h + 3) / 2;
        self.origin = (left + 1, top + 1);

        self.draw_borders((left, top), (inner_w + 2, inner_h + 2))?;
        self.flush()
    }

    /// Redraws board and status line from a snapshot.
    pub fn render(&mut self, snap: &Snapshot, pulse: usize) -> crossterm::Result<()> {
        for cell in snap.grid.cells() {
            self.print_cell(cell, EMPTY)?;
        }

        let dead = matches!(snap.ending, Some(Ending::Wall) | Some(Ending::SelfHit));
        for (i, cell) in snap.snake.iter().enumerate() {
            let glyph = if dead {
                DEAD_SNAKE
            } else if i == 0 {
                head_glyph(snap.direction)
            } else {
                SNAKE_BODY
            };
            if snap.grid.in_bounds(*cell) {
                self.print_cell(*cell, glyph)?;
            }
        }

        self.draw_food(snap, pulse)?;
        self.draw_status(snap)?;
        self.flush()
    }

    /// Redraws only the food, for the pulse animation between ticks.
    pub fn draw_food(&mut self, snap: &Snapshot, pulse: usize) -> crossterm::Result<()> {
        if let Some(food) = snap.food {
            self.print_cell(food, FOOD_PULSE[pulse % FOOD_PULSE.len()])?;
        }
        Ok(())
    }

    fn draw_status(&mut self, snap: &Snapshot) -> crossterm::Result<()> {
        let line = format!(
            "Score: {}  High Score: {}  [Enter] {}  [R] Reset  [Q] Quit",
            snap.score,
            snap.high_score,
            snap.state.action_label()
        );
        let y = self.origin.1 + snap.grid.rows() as TermInt + 1;
        if y >= self.height {
            return Ok(());
        }

        let x0 = self.origin.0.saturating_sub(1);
        for x in x0..self.width {
            self.print_at((x, y), ' ')?;
        }
        for (i, ch) in line.chars().enumerate() {
            let x = x0 + i as TermInt;
            if x >= self.width {
                break;
            }
            self.print_at((x, y), ch)?;
        }
        Ok(())
    }

    pub fn show_state_message(&mut self, snap: &Snapshot) -> crossterm::Result<()> {
        let score = format!("Score: {}", snap.score);
        match (snap.state, snap.ending) {
            (GameState::Paused, _) => self.show_message(&["Paused", "", "Enter to resume"]),
            (GameState::GameOver, Some(Ending::BoardFilled)) => {
                self.show_message(&["YOU WIN", score.as_str(), "", "Enter to play again"])
            }
            (GameState::GameOver, _) => {
                self.show_message(&["GAME OVER", score.as_str(), "", "Enter to play again"])
            }
            _ => self.hide_message(),
        }
    }

    pub fn show_message(&mut self, lines: &[&str]) -> crossterm::Result<()> {
        if self.has_message() {
            self.hide_message()?;
        }

        let msg_height = (lines.len() + 2) as TermInt;
        let msg_width = (lines.iter().map(|x| x.chars().count()).max().unwrap_or(0) + 2) as TermInt;
        let center = (self.width / 2, self.height / 2);
        let top_left = (
            center.0.saturating_sub(msg_width / 2),
            center.1.saturating_sub(msg_height / 2),
        );

        // Print the top and bottom empty lines
        for y in [top_left.1, top_left.1 + msg_height - 1].iter() {
            for x_diff in 0..msg_width {
                self.print_at_no_save((top_left.0 + x_diff, *y), ' ')?;
            }
        }

        // Print the message lines
        for (i, line) in lines.iter().enumerate() {
            let padded_line = format!("{line: ^width$}", line = line, width = msg_width as usize);
            let y = top_left.1 + i as TermInt + 1;
            for (x_diff, ch) in padded_line.chars().enumerate() {
                self.print_at_no_save((top_left.0 + x_diff as TermInt, y), ch)?;
            }
        }

        self.current_msg = Some(Message::new(msg_width, msg_height, top_left));
        self.flush()
    }

    pub fn hide_message(&mut self) -> crossterm::Result<()> {
        let msg = match self.current_msg.take() {
            Some(msg) => msg,
            None => return Ok(()),
        };
        let top_left = msg.top_left();

        // Restore the content from the screen buffer
        for y_diff in 0..msg.height() {
            for x_diff in 0..msg.width() {
                let (x, y) = (top_left.0 + x_diff, top_left.1 + y_diff);
                if let Some(ch) = self.screen_at((x, y)) {
                    self.print_at_no_save((x, y), ch)?;
                }
            }
        }

        self.flush()
    }

    pub fn has_message(&self) -> bool {
        self.current_msg.is_some()
    }

    pub fn flush(&mut self) -> crossterm::Result<()> {
        self.stdout.flush()?;
        Ok(())
    }

    ///////////////////////////////////////////////////////////////////////////

    fn draw_borders(&mut self, top_left: Coords, size: Coords) -> crossterm::Result<()> {
        let (x0, y0) = top_left;
        let (width, height) = size;
        let end_x = x0 + width - 1;
        let end_y = y0 + height - 1;

        for x in x0..=end_x {
            let ch = if x == x0 || x == end_x {'+'} else {'-'};
            self.print_at((x, y0), ch)?;
            self.print_at((x, end_y), ch)?;
        }

        for y in y0 + 1..end_y {
            self.print_at((x0, y), '|')?;
            self.print_at((end_x, y), '|')?;
        }

        Ok(())
    }

    fn print_cell(&mut self, cell: Cell, glyph: [char; 2]) -> crossterm::Result<()> {
        let x = self.origin.0 + cell.x as TermInt * CELL_WIDTH;
        let y = self.origin.1 + cell.y as TermInt;
        self.print_at((x, y), glyph[0])?;
        self.print_at((x + 1, y), glyph[1])
    }

    fn print_at(&mut self, pos: Coords, ch: char) -> crossterm::Result<()> {
        if pos.0 >= self.width || pos.1 >= self.height {
            return Ok(());
        }
        queue!(self.stdout, cursor::MoveTo(pos.0, pos.1), style::Print(ch))?;
        self.screen[self.width as usize * pos.1 as usize + pos.0 as usize] = ch;
        Ok(())
    }

    fn print_at_no_save(&mut self, pos: Coords, ch: char) -> crossterm::Result<()> {
        // To be used for printing messages, where we don't wanna overwrite our
        // local buffer to restore it when the message is hidden
        queue!(self.stdout, cursor::MoveTo(pos.0, pos.1), style::Print(ch))
    }

    fn screen_at(&self, pos: Coords) -> Option<char> {
        if pos.0 >= self.width || pos.1 >= self.height {
            return None;
        }
        self.screen.get(self.width as usize * pos.1 as usize + pos.0 as usize).copied()
    }

    fn clear(&mut self) -> crossterm::Result<()> {
        self.current_msg = None;
        self.screen = vec![' '; self.width as usize * self.height as usize];
        execute!(self.stdout, terminal::Clear(ClearType::All))
    }
}

fn head_glyph(direction: Direction) -> [char; 2] {
    match direction {
        Direction::Up => ['^', '^'],
        Direction::Down => ['v', 'v'],
        Direction::Left => ['<', '<'],
        Direction::Right => ['>', '>'],
    }
}

impl Message {
    pub fn new(width: TermInt, height: TermInt, top_left: Coords) -> Self {
        Message { width, height, top_left }
    }

    pub fn width(&self) -> TermInt {
        self.width
    }

    pub fn height(&self) -> TermInt {
        self.height
    }

    pub fn top_left(&self) -> Coords {
        self.top_left
    }
}
