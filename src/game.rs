use std::time::{Duration, Instant};

use crate::config::Config;
use crate::grid::Grid;
use crate::input::{intent_for, is_ctrl_c, Intent};
use crate::state::{Game, GameState, Rules};
use crate::storage::HighScoreStore;
use crate::term::TermManager;

use anyhow::Result;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, warn};

/// How often the food glyph changes.
const PULSE_INTERVAL_MS: u128 = 200;

/// Terminal front-end: owns the screen and the session, and feeds key
/// presses and timer ticks into the state machine.
pub struct SnakeGame<S> {
    term: TermManager,
    game: Game<S, StdRng>,
    started_at: Instant,
    pulse: usize,
}

impl<S: HighScoreStore> SnakeGame<S> {
    pub fn new(config: &Config, store: S) -> Result<Self> {
        let term = TermManager::new()?;

        let available_px = term.available_cells() * config.cell_size;
        let board_px = Grid::responsive_board_px(
            available_px,
            config.board_margin,
            config.max_board_size,
            config.cell_size,
        );
        let grid = Grid::from_board(board_px, config.cell_size);
        info!(
            "Terminal {:?}, board {}px = {}x{} cells",
            term.get_terminal_size(),
            grid.board_px(),
            grid.cols(),
            grid.rows()
        );

        let game = Game::new(grid, Rules::from(config), store, StdRng::from_entropy());
        Ok(SnakeGame { term, game, started_at: Instant::now(), pulse: 0 })
    }

    /// Runs until the player quits. The terminal is restored on every exit path.
    pub fn run(&mut self) -> Result<()> {
        self.term.setup()?;
        let res = self.play();
        finish_session(res, self.term.restore())
    }

    ///////////////////////////////////////////////////////////////////////////

    fn play(&mut self) -> Result<()> {
        if !self.show_intro()? {
            return Ok(());
        }

        self.term.layout(&self.game.snapshot().grid)?;
        self.redraw()?;

        loop {
            let wait = self.next_wait(Instant::now());
            let mut dirty = false;

            for key_ev in self.term.read_key_events(wait)? {
                let now = Instant::now();
                match intent_for(&key_ev) {
                    Some(Intent::Quit) => {
                        info!("Quit at score {}, high score {}", self.game.score(), self.game.high_score());
                        return Ok(());
                    }
                    Some(Intent::Turn(dir)) => {
                        self.game.set_pending_direction(dir);
                    }
                    Some(Intent::StartPause) => {
                        self.game.start(now);
                        dirty = true;
                    }
                    Some(Intent::Resume) => dirty |= self.game.resume(now),
                    Some(Intent::Reset) => {
                        self.game.reset();
                        dirty = true;
                    }
                    None => debug!("Ignoring key {:?}", key_ev.code),
                }
            }

            if let Some(report) = self.game.poll_tick(Instant::now()) {
                debug!("Tick: {:?}, interval {} ms", report, self.game.speed_ms());
                dirty = true;
            }

            if dirty {
                self.redraw()?;
            } else {
                self.animate_food()?;
            }
        }
    }

    /// Returns false if the player asked to quit.
    fn show_intro(&mut self) -> Result<bool> {
        let lines = &[
            "Arrow keys or WASD to move",
            "Enter to start or pause",
            "Space to resume, R to reset",
            "Q or Esc to quit",
            "",
            "Press any key to begin",
        ];

        self.term.show_message(lines)?;
        let key = self.term.read_key_blocking()?;
        self.term.hide_message()?;

        Ok(!is_ctrl_c(&key) && intent_for(&key) != Some(Intent::Quit))
    }

    fn redraw(&mut self) -> Result<()> {
        self.term.hide_message()?;
        let snap = self.game.snapshot();
        self.term.render(&snap, self.pulse)?;
        self.term.show_state_message(&snap)?;
        Ok(())
    }

    fn animate_food(&mut self) -> Result<()> {
        let pulse = (self.started_at.elapsed().as_millis() / PULSE_INTERVAL_MS) as usize;
        if pulse == self.pulse {
            return Ok(());
        }
        self.pulse = pulse;

        // Overlays sit on top of the board, leave them alone.
        if matches!(self.game.state(), GameState::Idle | GameState::Running) {
            self.term.draw_food(&self.game.snapshot(), pulse)?;
            self.term.flush()?;
        }
        Ok(())
    }

    /// Sleep until the next tick or the next pulse frame, whichever is first.
    fn next_wait(&self, now: Instant) -> Duration {
        let pulse = Duration::from_millis(PULSE_INTERVAL_MS as u64);
        match self.game.ticker().time_until_due(now) {
            Some(due) => due.min(pulse),
            None => pulse,
        }
    }
}

/// The session's own error wins over a failure to restore the terminal.
fn finish_session(res: Result<()>, restored: crossterm::Result<()>) -> Result<()> {
    match (res, restored) {
        (Err(e), Err(restore_err)) => {
            warn!("Could not restore the terminal: {}", restore_err);
            Err(e)
        }
        (Ok(()), Err(restore_err)) => Err(restore_err.into()),
        (res, Ok(())) => res,
    }
}
