use std::cmp::min;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

use rand::Rng;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::food::place_food;
use crate::grid::{Cell, Grid};
use crate::rules::{check_outcome, speed_for_score, Outcome};
use crate::snake::{Direction, Snake};
use crate::storage::HighScoreStore;
use crate::timer::Ticker;

const INITIAL_SNAKE_LENGTH: usize = 3;
const INITIAL_HEAD: Cell = Cell::new(5, 10);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum GameState {
    Idle,
    Running,
    Paused,
    GameOver,
}

impl GameState {
    /// Label of the start/pause control in this state.
    pub fn action_label(self) -> &'static str {
        match self {
            GameState::Idle | GameState::GameOver => "Start Game",
            GameState::Running => "Pause Game",
            GameState::Paused => "Resume Game",
        }
    }
}

/// Why a game reached `GameOver`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Ending {
    Wall,
    SelfHit,
    /// No free cell left for food. The player wins.
    BoardFilled,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TickReport {
    /// Not running; nothing happened.
    Skipped,
    Moved { head: Cell, old_tail: Option<Cell> },
    Ate { head: Cell, score: u32, new_high_score: bool },
    Ended(Ending),
}

/// Scoring and speed constants of one session.
#[derive(Copy, Clone, Debug)]
pub struct Rules {
    pub food_reward: u32,
    pub initial_speed_ms: u64,
    pub min_speed_ms: u64,
}

impl From<&Config> for Rules {
    fn from(config: &Config) -> Self {
        Rules {
            food_reward: config.food_reward,
            initial_speed_ms: config.initial_speed_ms,
            min_speed_ms: config.min_speed_ms,
        }
    }
}

impl Default for Rules {
    fn default() -> Self {
        Rules::from(&Config::default())
    }
}

/// Read-only view handed to renderers.
#[derive(Copy, Clone, Debug)]
pub struct Snapshot<'a> {
    pub grid: Grid,
    pub snake: &'a VecDeque<Cell>,
    pub food: Option<Cell>,
    pub direction: Direction,
    pub score: u32,
    pub high_score: u32,
    pub state: GameState,
    pub ending: Option<Ending>,
}

/// Owns everything a session mutates: snake, food, score, speed, the tick
/// schedule and the high score store.
pub struct Game<S, R> {
    grid: Grid,
    rules: Rules,
    snake: Snake,
    food: Option<Cell>,
    score: u32,
    high_score: u32,
    speed_ms: u64,
    state: GameState,
    ending: Option<Ending>,
    ticker: Ticker,
    store: S,
    rng: R,
}

impl<S: HighScoreStore, R: Rng> Game<S, R> {
    pub fn new(grid: Grid, rules: Rules, store: S, rng: R) -> Self {
        let high_score = store.load().unwrap_or_else(|e| {
            warn!("Could not read high score, starting from 0: {}", e);
            0
        });

        let mut game = Game {
            grid,
            rules,
            snake: Snake::from_segments(&[], Direction::Right),
            food: None,
            score: 0,
            high_score,
            speed_ms: rules.initial_speed_ms,
            state: GameState::Idle,
            ending: None,
            ticker: Ticker::new(),
            store,
            rng,
        };
        game.initialize();
        game
    }

    /// Start/pause toggle. Idle and GameOver begin a fresh game, Paused
    /// resumes where it left off, Running pauses.
    pub fn start(&mut self, now: Instant) {
        match self.state {
            GameState::Idle | GameState::GameOver => {
                self.initialize();
                self.state = GameState::Running;
                self.arm(now);
                info!("Game started on a {}x{} board", self.grid.cols(), self.grid.rows());
            }
            GameState::Paused => {
                self.state = GameState::Running;
                self.arm(now);
                info!("Game resumed");
            }
            GameState::Running => {
                self.ticker.cancel();
                self.state = GameState::Paused;
                info!("Game paused at score {}", self.score);
            }
        }
    }

    /// The restart key: only leaves a stopped state that already has a snake
    /// on the board. Returns whether it did anything.
    pub fn resume(&mut self, now: Instant) -> bool {
        let stopped = matches!(self.state, GameState::Idle | GameState::Paused);
        if !stopped || self.snake.is_empty() {
            return false;
        }
        self.start(now);
        true
    }

    /// Back to a fresh board in Idle, from any state.
    pub fn reset(&mut self) {
        self.ticker.cancel();
        self.initialize();
        self.state = GameState::Idle;
        info!("Game reset");
    }

    /// Buffers a turn for the next tick. Accepted while running or paused,
    /// so a turn made during a pause applies on the first tick after it.
    pub fn set_pending_direction(&mut self, direction: Direction) -> bool {
        if !matches!(self.state, GameState::Running | GameState::Paused) {
            return false;
        }
        self.snake.set_pending_direction(direction)
    }

    /// Runs the tick if the schedule says one is due.
    pub fn poll_tick(&mut self, now: Instant) -> Option<TickReport> {
        if self.ticker.poll(now) {
            Some(self.tick(now))
        } else {
            None
        }
    }

    /// One simulation step.
    pub fn tick(&mut self, now: Instant) -> TickReport {
        if self.state != GameState::Running {
            return TickReport::Skipped;
        }

        let new_head = match self.snake.next_head() {
            Some(head) => head,
            None => return TickReport::Skipped,
        };

        let outcome = check_outcome(new_head, self.snake.body(), self.food, &self.grid);
        match outcome {
            Outcome::WallCollision => return self.end(Ending::Wall),
            Outcome::SelfCollision => return self.end(Ending::SelfHit),
            Outcome::Moved | Outcome::AteFood => {}
        }

        let (head, old_tail) = match self.snake.advance(outcome == Outcome::AteFood) {
            Some(step) => step,
            None => return TickReport::Skipped,
        };
        if outcome == Outcome::Moved {
            return TickReport::Moved { head, old_tail };
        }

        self.score += self.rules.food_reward;
        let new_high_score = self.record_high_score();
        self.update_speed(now);
        debug!("Ate food at {:?}, score {}", head, self.score);

        self.food = place_food(&self.grid, &self.snake.segments(), &mut self.rng);
        if self.food.is_none() {
            return self.end(Ending::BoardFilled);
        }
        TickReport::Ate { head, score: self.score, new_high_score }
    }

    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            grid: self.grid,
            snake: self.snake.body(),
            food: self.food,
            direction: self.snake.direction(),
            score: self.score,
            high_score: self.high_score,
            state: self.state,
            ending: self.ending,
        }
    }

    pub fn state(&self) -> GameState {
        self.state
    }

    #[cfg(test)]
    pub fn ending(&self) -> Option<Ending> {
        self.ending
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn high_score(&self) -> u32 {
        self.high_score
    }

    pub fn speed_ms(&self) -> u64 {
        self.speed_ms
    }

    #[cfg(test)]
    pub fn snake(&self) -> &Snake {
        &self.snake
    }

    #[cfg(test)]
    pub fn food(&self) -> Option<Cell> {
        self.food
    }

    pub fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    ///////////////////////////////////////////////////////////////////////////

    fn initialize(&mut self) {
        self.snake = initial_snake(&self.grid);
        self.food = place_food(&self.grid, &self.snake.segments(), &mut self.rng);
        self.score = 0;
        self.speed_ms = self.rules.initial_speed_ms;
        self.ending = None;
    }

    fn arm(&mut self, now: Instant) {
        self.ticker.arm(Duration::from_millis(self.speed_ms), now);
    }

    fn end(&mut self, ending: Ending) -> TickReport {
        self.ticker.cancel();
        self.state = GameState::GameOver;
        self.ending = Some(ending);
        info!("Game over ({:?}), score {}, length {}", ending, self.score, self.snake.len());
        TickReport::Ended(ending)
    }

    fn record_high_score(&mut self) -> bool {
        if self.score <= self.high_score {
            return false;
        }
        self.high_score = self.score;
        if let Err(e) = self.store.save(self.high_score) {
            warn!("Could not save high score {}: {}", self.high_score, e);
        }
        true
    }

    fn update_speed(&mut self, now: Instant) {
        let speed = speed_for_score(self.score, self.rules.initial_speed_ms, self.rules.min_speed_ms);
        if speed != self.speed_ms {
            self.speed_ms = speed;
            self.arm(now);
            debug!("Tick interval now {} ms", speed);
        }
    }
}

/// Three cells heading right from (5,10); centred instead when the board
/// is too small for that.
fn initial_snake(grid: &Grid) -> Snake {
    let fits = grid.in_bounds(INITIAL_HEAD)
        && grid.in_bounds(INITIAL_HEAD.offset(1 - INITIAL_SNAKE_LENGTH as i32, 0));
    if fits {
        return Snake::new(INITIAL_HEAD, INITIAL_SNAKE_LENGTH, Direction::Right);
    }

    let head = Cell::new(grid.cols() / 2, grid.rows() / 2);
    let length = min(INITIAL_SNAKE_LENGTH, head.x as usize + 1);
    Snake::new(head, length, Direction::Right)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::{FailingStore, MemoryStore};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn game_with(store: MemoryStore) -> Game<MemoryStore, StdRng> {
        Game::new(Grid::from_board(400, 20), Rules::default(), store, StdRng::seed_from_u64(42))
    }

    fn game() -> Game<MemoryStore, StdRng> {
        game_with(MemoryStore::default())
    }

    fn running() -> (Game<MemoryStore, StdRng>, Instant) {
        let now = Instant::now();
        let mut game = game();
        game.start(now);
        game.food = Some(Cell::new(0, 0));
        (game, now)
    }

    fn cells(list: &[(i32, i32)]) -> Vec<Cell> {
        list.iter().map(|&(x, y)| Cell::new(x, y)).collect()
    }

    #[test]
    fn fresh_game_is_idle_with_three_segments() {
        let game = game();
        assert_eq!(game.state(), GameState::Idle);
        assert_eq!(game.snake().segments(), cells(&[(5, 10), (4, 10), (3, 10)]));
        assert_eq!(game.score(), 0);
        assert_eq!(game.speed_ms(), 150);
        assert!(!game.ticker().is_armed());
        let food = game.food().unwrap();
        assert!(!game.snake().body().contains(&food));
    }

    #[test]
    fn start_toggles_pause_and_resume() {
        let (mut game, now) = running();
        assert_eq!(game.state(), GameState::Running);
        assert_eq!(game.ticker().interval(), Some(Duration::from_millis(150)));

        game.tick(now);
        let moved = game.snake().segments();

        game.start(now);
        assert_eq!(game.state(), GameState::Paused);
        assert!(!game.ticker().is_armed());
        assert_eq!(game.tick(now), TickReport::Skipped);

        game.start(now);
        assert_eq!(game.state(), GameState::Running);
        assert!(game.ticker().is_armed());
        assert_eq!(game.snake().segments(), moved);
    }

    #[test]
    fn tick_moves_right_and_drops_tail() {
        let (mut game, now) = running();
        let report = game.tick(now);

        assert_eq!(
            report,
            TickReport::Moved { head: Cell::new(6, 10), old_tail: Some(Cell::new(3, 10)) }
        );
        assert_eq!(game.snake().segments(), cells(&[(6, 10), (5, 10), (4, 10)]));
        assert_eq!(game.snapshot().grid.to_pixels(Cell::new(6, 10)), (120, 200));
    }

    #[test]
    fn reversal_request_is_ignored() {
        let (mut game, now) = running();
        assert!(!game.set_pending_direction(Direction::Left));
        game.tick(now);
        assert_eq!(game.snake().head(), Some(Cell::new(6, 10)));
        assert_eq!(game.snake().direction(), Direction::Right);
    }

    #[test]
    fn turn_applies_on_next_tick() {
        let (mut game, now) = running();
        assert!(game.set_pending_direction(Direction::Up));
        assert_eq!(game.snake().direction(), Direction::Right);
        game.tick(now);
        assert_eq!(game.snake().head(), Some(Cell::new(5, 9)));
    }

    #[test]
    fn wall_ends_the_game_and_stops_ticking() {
        let (mut game, now) = running();
        game.snake = Snake::from_segments(&cells(&[(19, 10), (18, 10), (17, 10)]), Direction::Right);

        assert_eq!(game.tick(now), TickReport::Ended(Ending::Wall));
        assert_eq!(game.state(), GameState::GameOver);
        assert_eq!(game.ending(), Some(Ending::Wall));
        assert!(!game.ticker().is_armed());

        let body = game.snake().segments();
        assert_eq!(game.tick(now), TickReport::Skipped);
        assert_eq!(game.snake().segments(), body);
        assert_eq!(game.poll_tick(now + Duration::from_secs(5)), None);
    }

    #[test]
    fn running_into_itself_ends_the_game() {
        let (mut game, now) = running();
        game.snake = Snake::from_segments(
            &cells(&[(5, 5), (6, 5), (6, 6), (5, 6), (4, 6)]),
            Direction::Left,
        );
        game.set_pending_direction(Direction::Down);

        assert_eq!(game.tick(now), TickReport::Ended(Ending::SelfHit));
        assert_eq!(game.score(), 0);
    }

    #[test]
    fn eating_grows_scores_and_speeds_up() {
        let store = MemoryStore::default();
        let now = Instant::now();
        let mut game = game_with(store.clone());
        game.start(now);
        game.food = Some(Cell::new(6, 10));

        let report = game.tick(now);
        assert_eq!(report, TickReport::Ate { head: Cell::new(6, 10), score: 10, new_high_score: true });
        assert_eq!(game.snake().segments(), cells(&[(6, 10), (5, 10), (4, 10), (3, 10)]));
        assert_eq!(game.score(), 10);
        assert_eq!(game.high_score(), 10);
        assert_eq!(store.value(), 10);
        assert_eq!(game.speed_ms(), 145);
        assert_eq!(game.ticker().interval(), Some(Duration::from_millis(145)));

        let food = game.food().unwrap();
        assert!(!game.snake().body().contains(&food));
    }

    #[test]
    fn speed_bottoms_out() {
        let (mut game, now) = running();
        game.score = 190;
        game.food = Some(Cell::new(6, 10));
        game.tick(now);

        assert_eq!(game.score(), 200);
        assert_eq!(game.speed_ms(), 50);
        assert_eq!(game.ticker().interval(), Some(Duration::from_millis(50)));
    }

    #[test]
    fn high_score_is_loaded_and_only_saved_when_beaten() {
        let store = MemoryStore::with_value(20);
        let now = Instant::now();
        let mut game = game_with(store.clone());
        assert_eq!(game.high_score(), 20);

        game.start(now);
        game.food = Some(Cell::new(6, 10));
        assert!(matches!(game.tick(now), TickReport::Ate { new_high_score: false, .. }));
        assert_eq!(store.save_count(), 0);

        game.food = Some(Cell::new(7, 10));
        game.tick(now);
        game.food = Some(Cell::new(8, 10));
        assert!(matches!(game.tick(now), TickReport::Ate { score: 30, new_high_score: true, .. }));
        assert_eq!(store.value(), 30);
        assert_eq!(game.high_score(), 30);
    }

    #[test]
    fn filling_the_board_is_a_win() {
        let now = Instant::now();
        let mut game = Game::new(Grid::from_board(40, 20), Rules::default(), MemoryStore::default(), StdRng::seed_from_u64(5));
        game.start(now);
        game.snake = Snake::from_segments(&cells(&[(0, 0), (0, 1), (1, 1)]), Direction::Up);
        game.food = Some(Cell::new(1, 0));
        game.set_pending_direction(Direction::Right);

        assert_eq!(game.tick(now), TickReport::Ended(Ending::BoardFilled));
        assert_eq!(game.state(), GameState::GameOver);
        assert_eq!(game.score(), 10);
        assert_eq!(game.food(), None);
        assert_eq!(game.snake().len(), 4);
    }

    #[test]
    fn reset_is_repeatable() {
        let (mut game, now) = running();
        game.food = Some(Cell::new(6, 10));
        game.tick(now);
        game.tick(now);

        game.reset();
        let first = (game.snake().segments(), game.score(), game.speed_ms(), game.state());
        game.reset();
        let second = (game.snake().segments(), game.score(), game.speed_ms(), game.state());

        assert_eq!(first, second);
        assert_eq!(second.3, GameState::Idle);
        assert!(!game.ticker().is_armed());
        assert!(!game.snake().body().contains(&game.food().unwrap()));
        assert_eq!(game.ending(), None);
    }

    #[test]
    fn directions_are_ignored_unless_running() {
        let mut game = game();
        assert!(!game.set_pending_direction(Direction::Up));
        assert_eq!(game.snake().pending_direction(), Direction::Right);
    }

    #[test]
    fn turn_during_pause_applies_after_resume() {
        let (mut game, now) = running();
        game.start(now);
        assert_eq!(game.state(), GameState::Paused);

        assert!(game.set_pending_direction(Direction::Up));
        assert!(!game.set_pending_direction(Direction::Left));
        game.start(now);
        game.tick(now);

        assert_eq!(game.snake().head(), Some(Cell::new(5, 9)));
        assert_eq!(game.snake().direction(), Direction::Up);
    }

    #[test]
    fn broken_store_reads_as_zero_and_play_goes_on() {
        let now = Instant::now();
        let mut game = Game::new(
            Grid::from_board(400, 20),
            Rules::default(),
            FailingStore::default(),
            StdRng::seed_from_u64(42),
        );
        assert_eq!(game.high_score(), 0);

        game.start(now);
        game.food = Some(Cell::new(6, 10));
        assert_eq!(
            game.tick(now),
            TickReport::Ate { head: Cell::new(6, 10), score: 10, new_high_score: true }
        );
        assert_eq!(game.state(), GameState::Running);
        assert_eq!(game.high_score(), 10);
        assert_eq!(game.store.save_attempts, 1);

        assert!(!matches!(game.tick(now), TickReport::Ended(_)));
        assert_eq!(game.state(), GameState::Running);
    }

    #[test]
    fn resume_needs_a_stopped_game_with_a_snake() {
        let now = Instant::now();
        let mut game = game();
        assert!(game.resume(now));
        assert_eq!(game.state(), GameState::Running);
        assert!(!game.resume(now));

        game.start(now);
        assert!(game.resume(now));
        assert_eq!(game.state(), GameState::Running);

        game.snake = Snake::from_segments(&cells(&[(19, 0)]), Direction::Right);
        game.tick(now);
        assert_eq!(game.state(), GameState::GameOver);
        assert!(!game.resume(now));

        game.reset();
        game.snake = Snake::from_segments(&[], Direction::Right);
        assert!(!game.resume(now));
        assert_eq!(game.state(), GameState::Idle);
    }

    #[test]
    fn start_after_game_over_begins_fresh() {
        let (mut game, now) = running();
        game.snake = Snake::from_segments(&cells(&[(19, 10), (18, 10), (17, 10)]), Direction::Right);
        game.score = 30;
        game.tick(now);

        game.start(now);
        assert_eq!(game.state(), GameState::Running);
        assert_eq!(game.score(), 0);
        assert_eq!(game.ending(), None);
        assert_eq!(game.snake().len(), 3);
    }

    #[test]
    fn poll_tick_follows_the_schedule() {
        let (mut game, now) = running();
        assert_eq!(game.poll_tick(now + Duration::from_millis(100)), None);
        assert!(matches!(
            game.poll_tick(now + Duration::from_millis(150)),
            Some(TickReport::Moved { .. })
        ));
    }

    #[test]
    fn random_play_keeps_invariants() {
        let mut dirs = StdRng::seed_from_u64(99);
        let now = Instant::now();

        for seed in 0..20 {
            let mut game = Game::new(
                Grid::from_board(200, 20),
                Rules::default(),
                MemoryStore::default(),
                StdRng::seed_from_u64(seed),
            );
            game.start(now);

            while game.state() == GameState::Running {
                let len = game.snake().len();
                let dir = match dirs.gen_range(0..4) {
                    0 => Direction::Up,
                    1 => Direction::Down,
                    2 => Direction::Left,
                    _ => Direction::Right,
                };
                game.set_pending_direction(dir);
                let report = game.tick(now);

                assert_eq!(game.score() % 10, 0);
                assert!(game.high_score() >= game.score());
                assert!(game.speed_ms() >= 50);
                if game.state() == GameState::Running {
                    let grown = game.snake().len() - len;
                    assert!(grown <= 1);
                    assert_eq!(grown == 1, matches!(report, TickReport::Ate { .. }));
                    let food = game.food().unwrap();
                    assert!(!game.snake().body().contains(&food));
                }
            }
        }
    }

    #[test]
    fn small_board_centres_the_snake() {
        let snake = initial_snake(&Grid::from_board(120, 20));
        assert_eq!(snake.segments(), cells(&[(3, 3), (2, 3), (1, 3)]));

        let snake = initial_snake(&Grid::from_board(20, 20));
        assert_eq!(snake.segments(), cells(&[(0, 0)]));
    }

    #[test]
    fn labels_follow_state() {
        assert_eq!(GameState::Idle.action_label(), "Start Game");
        assert_eq!(GameState::Running.action_label(), "Pause Game");
        assert_eq!(GameState::Paused.action_label(), "Resume Game");
        assert_eq!(GameState::GameOver.action_label(), "Start Game");
    }
}
