// Save-game snapshot and its on-disk format
// A save is a versioned JSON envelope around the six GameState fields.
// Adjacency is never stored; it is recomputed when the board is rebuilt.

use chrono::Local;
use directories::ProjectDirs;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::swp_board::{Board, MAX_SIDE, MIN_SIDE};
use crate::swp_cell::Cell;
use crate::swp_error::{Result, SweepError};
use crate::swp_timer::{Clock, GameTimer};

pub const SAVE_FORMAT: &str = "swpr-save";
pub const SAVE_VERSION: u32 = 1;
pub const SAVE_EXTENSION: &str = "json";

/// Longest play time a save may carry: 100 years
pub const MAX_ELAPSED_MILLIS: u64 = 100 * 365 * 24 * 60 * 60 * 1000;

pub type Coords = BTreeSet<(usize, usize)>;

/// Everything needed to resume a game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GameState {
    pub width: usize,
    pub height: usize,
    pub mine_locations: Coords,
    pub flag_locations: Coords,
    pub revealed_locations: Coords,
    pub elapsed_millis: u64,
}

#[derive(Serialize, Deserialize)]
struct SaveFile {
    format: String,
    version: u32,
    saved_at: String, // RFC 3339, informational only
    state: GameState,
}

impl GameState {
    /// Snapshot a board and its timer
    pub fn capture<C: Clock>(board: &Board, timer: &GameTimer<C>) -> Self {
        let mut state = GameState {
            width: board.width(),
            height: board.height(),
            mine_locations: Coords::new(),
            flag_locations: Coords::new(),
            revealed_locations: Coords::new(),
            elapsed_millis: timer.elapsed_millis(),
        };
        for (pos, cell) in board.iter() {
            if cell.has_mine() {
                state.mine_locations.insert(pos);
            }
            if cell.has_flag() {
                state.flag_locations.insert(pos);
            }
            if cell.is_revealed() {
                state.revealed_locations.insert(pos);
            }
        }
        state
    }

    /// Rebuild an in-progress board. Random placement and the mine-count
    /// bounds are skipped; contradictory snapshots are refused.
    pub fn restore(&self) -> Result<Board> {
        self.validate()?;
        let cells = (0..self.height)
            .flat_map(|y| (0..self.width).map(move |x| (x, y)))
            .map(|pos| {
                Cell::restored(
                    self.mine_locations.contains(&pos),
                    self.flag_locations.contains(&pos),
                    self.revealed_locations.contains(&pos),
                )
            })
            .collect();
        Ok(Board::from_cells(self.width, self.height, cells))
    }

    /// Check the snapshot describes a game that can still be played
    pub fn validate(&self) -> Result<()> {
        let bad = |msg: String| Err(SweepError::Deserialization(msg));
        let (w, h) = (self.width, self.height);
        if w < MIN_SIDE || h < MIN_SIDE || w > MAX_SIDE || h > MAX_SIDE {
            return bad(format!("board size {w}x{h} out of range"));
        }
        if self.elapsed_millis > MAX_ELAPSED_MILLIS {
            return bad(format!("elapsed time {}ms out of range", self.elapsed_millis));
        }
        for (name, set) in [
            ("mine", &self.mine_locations),
            ("flag", &self.flag_locations),
            ("revealed", &self.revealed_locations),
        ] {
            if let Some(&(x, y)) = set.iter().find(|&&(x, y)| x >= w || y >= h) {
                return bad(format!("{name} location ({x}, {y}) outside {w}x{h} board"));
            }
        }
        if let Some((x, y)) = self
            .flag_locations
            .intersection(&self.revealed_locations)
            .next()
        {
            return bad(format!("cell ({x}, {y}) is both flagged and revealed"));
        }
        if let Some((x, y)) = self
            .mine_locations
            .intersection(&self.revealed_locations)
            .next()
        {
            return bad(format!("mine at ({x}, {y}) is revealed; the game was already lost"));
        }
        let safe = w * h - self.mine_locations.len().min(w * h);
        if safe == 0 {
            return bad("every cell holds a mine".to_string());
        }
        if self.revealed_locations.len() == safe {
            return bad("every safe cell is revealed; the game was already won".to_string());
        }
        Ok(())
    }

    /// Write the snapshot to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let file = SaveFile {
            format: SAVE_FORMAT.to_string(),
            version: SAVE_VERSION,
            saved_at: Local::now().to_rfc3339(),
            state: self.clone(),
        };
        write_json(path, &file)?;
        info!("game saved to {}", path.display());
        Ok(())
    }

    /// Read and validate a snapshot from `path`
    pub fn load_from(path: &Path) -> Result<GameState> {
        let text = fs::read_to_string(path).map_err(|e| SweepError::io(path, e))?;
        let file: SaveFile = serde_json::from_str(&text).map_err(|e| {
            warn!("unreadable save {}: {e}", path.display());
            SweepError::Deserialization(e.to_string())
        })?;
        if file.format != SAVE_FORMAT {
            return Err(SweepError::Deserialization(format!(
                "not a save file (format \"{}\")",
                file.format
            )));
        }
        if file.version != SAVE_VERSION {
            return Err(SweepError::Deserialization(format!(
                "unsupported save version {} (expected {SAVE_VERSION})",
                file.version
            )));
        }
        file.state.validate()?;
        info!("game loaded from {} (saved {})", path.display(), file.saved_at);
        Ok(file.state)
    }
}

/// Encode `value` and write it to `path`, creating parent directories.
/// An encoding failure is reported against the path, like a write failure.
pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value).map_err(|e| SweepError::io(path, e.into()))?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| SweepError::io(parent, e))?;
        }
    }
    fs::write(path, text).map_err(|e| SweepError::io(path, e))
}

/// Platform data directory for saves, e.g. ~/.local/share/swpr/saves on Linux
pub fn default_save_dir() -> Option<PathBuf> {
    ProjectDirs::from("com", "xhbl", "swpr").map(|p| p.data_dir().join("saves"))
}

/// Resolve a user-entered save name against a directory, adding the extension
pub fn save_path(dir: &Path, name: &str) -> PathBuf {
    let mut path = dir.join(name.trim());
    if path.extension().is_none() {
        path.set_extension(SAVE_EXTENSION);
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::swp_board::Status;
    use crate::swp_board::tests::layout;
    use crate::swp_timer::tests::ManualClock;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("swpr-state-{}", std::process::id()))
            .join(name)
    }

    fn played_board() -> Board {
        let mut board = layout(5, 5, &[(0, 0), (2, 2), (4, 4)]);
        board.reveal_at(1, 1).unwrap();
        board.toggle_flag_at(0, 0).unwrap();
        board.toggle_flag_at(3, 3).unwrap();
        board
    }

    fn stopped_timer(millis: u64) -> GameTimer<ManualClock> {
        let mut timer = GameTimer::with_clock(ManualClock::default());
        timer.start_at(millis);
        timer.stop();
        timer
    }

    fn set(items: &[(usize, usize)]) -> Coords {
        items.iter().copied().collect()
    }

    #[test]
    fn capture_collects_all_sets() {
        let state = GameState::capture(&played_board(), &stopped_timer(12_345));

        assert_eq!((state.width, state.height), (5, 5));
        assert_eq!(state.mine_locations, set(&[(0, 0), (2, 2), (4, 4)]));
        assert_eq!(state.flag_locations, set(&[(0, 0), (3, 3)]));
        assert_eq!(state.revealed_locations, set(&[(1, 1)]));
        assert_eq!(state.elapsed_millis, 12_345);
    }

    #[test]
    fn restore_reproduces_board() {
        let board = played_board();
        let state = GameState::capture(&board, &stopped_timer(0));

        let restored = state.restore().unwrap();

        assert_eq!(restored.status(), Status::InProgress);
        assert_eq!(restored, board);
        assert_eq!(GameState::capture(&restored, &stopped_timer(0)), state);
    }

    #[test]
    fn restore_skips_mine_count_bounds() {
        // 1 mine on 10x10 is below the construction minimum of 5
        let state = GameState {
            width: 10,
            height: 10,
            mine_locations: set(&[(9, 9)]),
            flag_locations: Coords::new(),
            revealed_locations: Coords::new(),
            elapsed_millis: 0,
        };
        let board = state.restore().unwrap();
        assert_eq!(board.mine_count(), 1);
        assert_eq!(board.cell(8, 8).unwrap().adjacent_mine_count(), 1);
    }

    #[test]
    fn rejects_contradictions() {
        let base = GameState::capture(&played_board(), &stopped_timer(0));

        let mut both = base.clone();
        both.flag_locations.insert((1, 1));
        assert!(matches!(both.restore(), Err(SweepError::Deserialization(_))));

        let mut lost = base.clone();
        lost.revealed_locations.insert((2, 2));
        assert!(matches!(lost.restore(), Err(SweepError::Deserialization(_))));

        let mut outside = base.clone();
        outside.mine_locations.insert((5, 0));
        assert!(matches!(outside.restore(), Err(SweepError::Deserialization(_))));

        let mut small = base.clone();
        small.width = 2;
        assert!(small.validate().is_err());

        let mut huge = base.clone();
        huge.height = MAX_SIDE + 1;
        assert!(huge.validate().is_err());

        let mut won = base;
        won.flag_locations.clear();
        won.revealed_locations = (0..5)
            .flat_map(|y| (0..5).map(move |x| (x, y)))
            .filter(|p| !won.mine_locations.contains(p))
            .collect();
        assert!(won.validate().is_err());
    }

    #[test]
    fn save_and_load_round_trip() {
        let path = temp_path("round_trip.json");
        let state = GameState::capture(&played_board(), &stopped_timer(61_000));

        state.save_to(&path).unwrap();
        let loaded = GameState::load_from(&path).unwrap();

        assert_eq!(loaded, state);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn rejects_out_of_range_elapsed_time() {
        let mut state = GameState::capture(&played_board(), &stopped_timer(0));
        state.elapsed_millis = MAX_ELAPSED_MILLIS;
        assert!(state.validate().is_ok());

        for millis in [MAX_ELAPSED_MILLIS + 1, 1 << 63, u64::MAX] {
            state.elapsed_millis = millis;
            assert!(matches!(state.restore(), Err(SweepError::Deserialization(_))));
        }

        let path = temp_path("forever.json");
        state.save_to(&path).unwrap();
        let err = GameState::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("elapsed time"), "{err}");
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn encode_failure_is_reported_as_io() {
        // JSON object keys must be strings, so tuple keys cannot be encoded
        let path = temp_path("unencodable.json");
        let value: std::collections::BTreeMap<(usize, usize), u8> = [((1, 2), 3)].into();

        let err = write_json(&path, &value).unwrap_err();

        assert!(matches!(err, SweepError::PersistenceIo { .. }), "{err}");
        assert!(!path.exists());
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = GameState::load_from(&temp_path("does_not_exist.json")).unwrap_err();
        assert!(matches!(err, SweepError::PersistenceIo { .. }));
    }

    #[test]
    fn garbage_is_deserialization_error() {
        let path = temp_path("garbage.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{\"format\": \"swpr-save\", \"version\": 1}").unwrap();

        let err = GameState::load_from(&path).unwrap_err();
        assert!(matches!(err, SweepError::Deserialization(_)));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn other_version_is_refused() {
        let path = temp_path("future.json");
        let state = GameState::capture(&played_board(), &stopped_timer(0));
        state.save_to(&path).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        fs::write(&path, text.replace("\"version\": 1", "\"version\": 7")).unwrap();

        let err = GameState::load_from(&path).unwrap_err();
        assert!(err.to_string().contains("version 7"), "{err}");
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn save_path_adds_extension() {
        let dir = Path::new("saves");
        assert_eq!(save_path(dir, " monday "), dir.join("monday.json"));
        assert_eq!(save_path(dir, "old.bin"), dir.join("old.bin"));
    }
}
