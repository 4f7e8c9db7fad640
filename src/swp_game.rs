// Game session: one board, its timer and the input state around it
// The UI sends coordinate commands here and renders from `board()`

use log::{info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::Path;

use crate::swp_board::{Board, ClickMode, Status};
use crate::swp_config::Difficulty;
use crate::swp_error::{Result, SweepError};
use crate::swp_state::GameState;
use crate::swp_timer::{Clock, GameTimer, SystemClock};

/// Input commands understood by a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Primary(usize, usize), // Reveal, or flag while flagging mode is on
    Reveal(usize, usize),
    ToggleFlag(usize, usize),
    QuickReveal(usize, usize),
    ToggleFlaggingMode,
}

/// Press-and-hold flag gesture: armed on secondary press, resolved only if
/// the release lands on the same cell
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlagIntent {
    armed: Option<(usize, usize)>,
}

impl FlagIntent {
    pub fn arm(&mut self, pos: (usize, usize)) {
        self.armed = Some(pos);
    }

    pub fn cancel(&mut self) {
        self.armed = None;
    }

    pub fn armed(&self) -> Option<(usize, usize)> {
        self.armed
    }

    /// Consume the intent; `pos` is the cell under the release, if any
    pub fn release(&mut self, pos: Option<(usize, usize)>) -> Option<(usize, usize)> {
        match (self.armed.take(), pos) {
            (Some(armed), Some(pos)) if armed == pos => Some(armed),
            _ => None,
        }
    }
}

pub struct Session<C: Clock = SystemClock> {
    difficulty: Difficulty,
    board: Board,
    timer: GameTimer<C>,
    rng: StdRng,
    flag_intent: FlagIntent,
}

impl Session<SystemClock> {
    pub fn new(difficulty: Difficulty) -> Result<Self> {
        Self::with_parts(difficulty, GameTimer::new(), StdRng::from_entropy())
    }
}

impl<C: Clock> Session<C> {
    pub fn with_parts(difficulty: Difficulty, timer: GameTimer<C>, rng: StdRng) -> Result<Self> {
        let (w, h, n) = difficulty.params();
        Ok(Session {
            difficulty,
            board: Board::new(w, h, n)?,
            timer,
            rng,
            flag_intent: FlagIntent::default(),
        })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn timer(&self) -> &GameTimer<C> {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut GameTimer<C> {
        &mut self.timer
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn status(&self) -> Status {
        self.board.status()
    }

    /// Place mines and start the clock; no-op once started
    pub fn start(&mut self) -> Status {
        if self.board.status() == Status::NotStarted {
            self.board.start(&mut self.rng);
            self.timer.start();
        }
        self.board.status()
    }

    /// Apply a command. A reveal on a fresh board starts the game first.
    pub fn handle(&mut self, cmd: Command) -> Result<Status> {
        if matches!(cmd, Command::Primary(..) | Command::Reveal(..)) {
            self.start();
        }
        let before = self.board.status();
        let status = match cmd {
            Command::Primary(x, y) => self.board.primary_click(x, y)?,
            Command::Reveal(x, y) => self.board.click(x, y, ClickMode::Reveal)?,
            Command::ToggleFlag(x, y) => self.board.click(x, y, ClickMode::Flag)?,
            Command::QuickReveal(x, y) => self.board.try_quick_reveal(x, y)?,
            Command::ToggleFlaggingMode => {
                self.board.toggle_flagging_mode();
                self.board.status()
            }
        };
        if status.is_finished() && !before.is_finished() {
            self.timer.stop();
            info!(
                "{:?} after {}s on {}",
                status,
                self.timer.elapsed_secs(),
                self.difficulty.name()
            );
        }
        Ok(status)
    }

    /// Arm a flag gesture on a cell (secondary button pressed)
    pub fn secondary_press(&mut self, x: usize, y: usize) {
        if self.board.cell(x, y).is_some() {
            self.flag_intent.arm((x, y));
        }
    }

    /// Secondary button released over `pos` (None when off the board)
    pub fn secondary_release(&mut self, pos: Option<(usize, usize)>) -> Result<Status> {
        match self.flag_intent.release(pos) {
            Some((x, y)) => self.handle(Command::ToggleFlag(x, y)),
            None => Ok(self.board.status()),
        }
    }

    pub fn flag_intent(&self) -> FlagIntent {
        self.flag_intent
    }

    /// Discard the board and deal a fresh one with the same settings
    pub fn play_again(&mut self) -> Result<()> {
        self.new_game(self.difficulty)
    }

    /// Replace the board; on an invalid configuration the old game stays
    pub fn new_game(&mut self, difficulty: Difficulty) -> Result<()> {
        let (w, h, n) = difficulty.params();
        self.board = Board::new(w, h, n)?;
        self.difficulty = difficulty;
        self.timer.reset();
        self.flag_intent.cancel();
        Ok(())
    }

    /// Write the running game to `path`
    pub fn save(&self, path: &Path) -> Result<()> {
        if self.board.status() != Status::InProgress {
            return Err(SweepError::NoGameInProgress);
        }
        GameState::capture(&self.board, &self.timer).save_to(path)
    }

    /// Resume a saved game. Nothing changes unless the whole load succeeds.
    pub fn load(&mut self, path: &Path) -> Result<()> {
        let state = GameState::load_from(path)?;
        let board = state.restore().inspect_err(|e| {
            warn!("rejected save {}: {e}", path.display());
        })?;
        let difficulty = Difficulty::from_params(board.width(), board.height(), board.mine_count());
        self.timer.reset();
        self.timer.start_at(state.elapsed_millis);
        self.flag_intent.cancel();
        self.difficulty = difficulty;
        self.board = board;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::swp_timer::tests::ManualClock;
    use std::fs;
    use std::path::PathBuf;

    fn session(seed: u64) -> (Session<ManualClock>, ManualClock) {
        let clock = ManualClock::default();
        let timer = GameTimer::with_clock(clock.clone());
        let s = Session::with_parts(Difficulty::Easy, timer, StdRng::seed_from_u64(seed)).unwrap();
        (s, clock)
    }

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("swpr-session-{}", std::process::id()))
            .join(name)
    }

    fn positions(s: &Session<ManualClock>, mine: bool) -> Vec<(usize, usize)> {
        s.board()
            .iter()
            .filter(|(_, c)| c.has_mine() == mine)
            .map(|(pos, _)| pos)
            .collect()
    }

    /// Reveal a safe cell that does not finish the game
    fn open_one(s: &mut Session<ManualClock>) {
        s.start();
        let (w, h) = (s.board().width(), s.board().height());
        let numbered = (0..h)
            .flat_map(|y| (0..w).map(move |x| (x, y)))
            .find(|&(x, y)| {
                let c = s.board().cell(x, y).unwrap();
                !c.has_mine() && c.adjacent_mine_count() > 0
            })
            .unwrap();
        s.handle(Command::Reveal(numbered.0, numbered.1)).unwrap();
    }

    #[test]
    fn first_reveal_starts_game_and_clock() {
        let (mut s, _) = session(3);
        assert_eq!(s.status(), Status::NotStarted);
        assert!(!s.timer().is_running());

        s.handle(Command::Reveal(4, 4)).unwrap();

        assert!(s.status() != Status::NotStarted);
        assert_eq!(positions(&s, true).len(), 10);
    }

    #[test]
    fn flag_on_unstarted_board_does_nothing() {
        let (mut s, _) = session(3);
        assert_eq!(s.handle(Command::ToggleFlag(0, 0)).unwrap(), Status::NotStarted);
        assert!(!s.board().cell(0, 0).unwrap().has_flag());
    }

    #[test]
    fn losing_freezes_the_clock() {
        let (mut s, clock) = session(11);
        s.start();
        clock.advance(5_000);
        let (x, y) = positions(&s, true)[0];

        assert_eq!(s.handle(Command::Reveal(x, y)).unwrap(), Status::Lose);
        clock.advance(9_000);

        assert!(!s.timer().is_running());
        assert_eq!(s.timer().elapsed_millis(), 5_000);
    }

    #[test]
    fn clearing_all_safe_cells_wins() {
        let (mut s, clock) = session(5);
        s.start();
        for (x, y) in positions(&s, false) {
            if !s.board().cell(x, y).unwrap().is_revealed() {
                s.handle(Command::Reveal(x, y)).unwrap();
            }
        }
        clock.advance(1_000);
        assert_eq!(s.status(), Status::Win);
        assert_eq!(s.timer().elapsed_millis(), 0);
    }

    #[test]
    fn flag_intent_needs_release_on_same_cell() {
        let mut intent = FlagIntent::default();
        assert_eq!(intent.release(Some((1, 1))), None);

        intent.arm((1, 1));
        assert_eq!(intent.release(Some((1, 2))), None);
        assert_eq!(intent.armed(), None);

        intent.arm((1, 1));
        assert_eq!(intent.release(None), None);

        intent.arm((1, 1));
        assert_eq!(intent.release(Some((1, 1))), Some((1, 1)));
    }

    #[test]
    fn secondary_gesture_toggles_flag() {
        let (mut s, _) = session(8);
        s.start();
        let (x, y) = positions(&s, true)[0];

        s.secondary_press(x, y);
        s.secondary_release(Some((x, y))).unwrap();
        assert!(s.board().cell(x, y).unwrap().has_flag());

        s.secondary_press(x, y);
        s.secondary_release(None).unwrap();
        assert!(s.board().cell(x, y).unwrap().has_flag());
    }

    #[test]
    fn flagging_mode_command() {
        let (mut s, _) = session(8);
        s.start();
        let (x, y) = positions(&s, true)[0];
        s.handle(Command::ToggleFlaggingMode).unwrap();

        assert_eq!(s.handle(Command::Primary(x, y)).unwrap(), Status::InProgress);
        assert!(s.board().cell(x, y).unwrap().has_flag());
        assert!(s.board().is_flagging());
    }

    #[test]
    fn save_then_load_restores_board_and_clock() {
        let path = temp_path("resume.json");
        let (mut s, clock) = session(21);
        open_one(&mut s);
        clock.advance(42_000);
        s.save(&path).unwrap();
        let saved = s.board().clone();

        s.new_game(Difficulty::Hard).unwrap();
        assert_eq!(s.status(), Status::NotStarted);

        s.load(&path).unwrap();
        assert_eq!(s.board(), &saved);
        assert_eq!(s.difficulty(), Difficulty::Easy);
        assert!(s.timer().is_running());
        assert_eq!(s.timer().elapsed_secs(), 42);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn failed_load_keeps_current_game() {
        let (mut s, _) = session(21);
        open_one(&mut s);
        let before = s.board().clone();

        let err = s.load(&temp_path("missing.json")).unwrap_err();
        assert!(matches!(err, SweepError::PersistenceIo { .. }));

        let corrupt = temp_path("corrupt.json");
        fs::create_dir_all(corrupt.parent().unwrap()).unwrap();
        fs::write(&corrupt, "not json").unwrap();
        let err = s.load(&corrupt).unwrap_err();
        assert!(matches!(err, SweepError::Deserialization(_)));

        let mut endless = GameState::capture(s.board(), s.timer());
        endless.elapsed_millis = 1 << 63;
        let endless_path = temp_path("endless.json");
        endless.save_to(&endless_path).unwrap();
        let err = s.load(&endless_path).unwrap_err();
        assert!(matches!(err, SweepError::Deserialization(_)));

        assert_eq!(s.board(), &before);
        assert_eq!(s.difficulty(), Difficulty::Easy);
        let _ = fs::remove_file(&corrupt);
        let _ = fs::remove_file(&endless_path);
    }

    #[test]
    fn only_running_games_are_saved() {
        let (s, _) = session(1);
        let err = s.save(&temp_path("never.json")).unwrap_err();
        assert!(matches!(err, SweepError::NoGameInProgress));
    }

    #[test]
    fn invalid_custom_size_keeps_old_board() {
        let (mut s, _) = session(1);
        let err = s.new_game(Difficulty::Custom(9, 9, 41)).unwrap_err();
        assert!(matches!(err, SweepError::InvalidConfiguration(_)));
        let err = s.new_game(Difficulty::Custom(usize::MAX / 2, 3, 5)).unwrap_err();
        assert!(matches!(err, SweepError::InvalidConfiguration(_)));
        assert_eq!(s.difficulty(), Difficulty::Easy);
        assert_eq!(s.board().mine_count(), 10);
    }
}
