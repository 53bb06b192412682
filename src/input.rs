use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::snake::Direction;

/// What the player asked for.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Intent {
    Turn(Direction),
    /// The start/pause button
    StartPause,
    /// Leave Idle or Paused with the current board
    Resume,
    Reset,
    Quit,
}

pub fn intent_for(ev: &KeyEvent) -> Option<Intent> {
    if is_ctrl_c(ev) {
        return Some(Intent::Quit);
    }

    let intent = match ev.code {
        KeyCode::Char('w') | KeyCode::Up => Intent::Turn(Direction::Up),
        KeyCode::Char('a') | KeyCode::Left => Intent::Turn(Direction::Left),
        KeyCode::Char('s') | KeyCode::Down => Intent::Turn(Direction::Down),
        KeyCode::Char('d') | KeyCode::Right => Intent::Turn(Direction::Right),
        KeyCode::Enter | KeyCode::Char('p') => Intent::StartPause,
        KeyCode::Char(' ') => Intent::Resume,
        KeyCode::Char('r') => Intent::Reset,
        KeyCode::Esc | KeyCode::Char('q') => Intent::Quit,
        _ => return None,
    };
    Some(intent)
}

pub fn is_ctrl_c(ev: &KeyEvent) -> bool {
    matches!(ev, KeyEvent { code: KeyCode::Char('c'), modifiers: KeyModifiers::CONTROL })
}
