// Minefield model: mine placement, adjacency, reveal/flood-fill, quick-reveal
// and win/lose evaluation. Coordinates are (x, y) = (column, row).

use log::{debug, info};
use rand::Rng;

use crate::swp_cell::{Cell, MINE_SENTINEL, RevealOutcome};
use crate::swp_error::{Result, SweepError};

/// Smallest accepted width and height
pub const MIN_SIDE: usize = 3;
/// Largest accepted width and height, for new boards and saves alike
pub const MAX_SIDE: usize = 999;

/// Game progress. Only moves forward; a new board starts over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    NotStarted,
    InProgress,
    Win,
    Lose,
}

impl Status {
    pub fn is_finished(self) -> bool {
        matches!(self, Status::Win | Status::Lose)
    }
}

/// What a click on a cell should do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickMode {
    Reveal,
    Flag,
}

/// How a cell should be drawn, given the board status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellView {
    Hidden,
    Flagged,
    Revealed(u8),
    Mine,       // Mine shown (revealed, or uncovered after a loss)
    Detonated,  // The mine that ended the game
    WrongFlag,  // Flag on a safe cell, shown after a loss
    MissedMine, // Unflagged mine, shown after a win
    Cleared(u8), // Revealed safe cell on a won board
}

/// Accepted mine count range for a board: ceil(cells / 20) ..= floor(cells / 2)
pub fn mine_bounds(width: usize, height: usize) -> (usize, usize) {
    let cells = width.saturating_mul(height);
    (cells.div_ceil(20), cells / 2)
}

/// Check dimensions and mine count before a board is built
pub fn validate(width: usize, height: usize, mines: usize) -> Result<()> {
    if width < MIN_SIDE || height < MIN_SIDE {
        return Err(SweepError::InvalidConfiguration(format!(
            "width and height must be at least {MIN_SIDE} (got {width}x{height})"
        )));
    }
    if width > MAX_SIDE || height > MAX_SIDE {
        return Err(SweepError::InvalidConfiguration(format!(
            "width and height must be at most {MAX_SIDE} (got {width}x{height})"
        )));
    }
    let (min, max) = mine_bounds(width, height);
    if mines < min {
        return Err(SweepError::InvalidConfiguration(format!(
            "too few mines for a {width}x{height} board: {mines} given, at least {min} needed (max {max})"
        )));
    }
    if mines > max {
        return Err(SweepError::InvalidConfiguration(format!(
            "too many mines for a {width}x{height} board: {mines} given, at most {max} allowed (min {min})"
        )));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    width: usize,
    height: usize,
    mine_count: usize,
    cells: Vec<Cell>, // Row-major, index = y * width + x
    status: Status,
    flagging: bool,                   // Primary clicks toggle flags instead of revealing
    detonated: Option<(usize, usize)>, // First mine revealed, if any
}

impl Board {
    /// Create an empty board. Mines are placed by `start`, so the first
    /// rendered grid carries no information.
    pub fn new(width: usize, height: usize, mine_count: usize) -> Result<Self> {
        validate(width, height, mine_count)?;
        Ok(Board {
            width,
            height,
            mine_count,
            cells: vec![Cell::default(); width * height],
            status: Status::NotStarted,
            flagging: false,
            detonated: None,
        })
    }

    /// Build an in-progress board from prepared cells (used when restoring a save).
    /// The mine count is taken from the cells and adjacency is recomputed.
    pub(crate) fn from_cells(width: usize, height: usize, cells: Vec<Cell>) -> Self {
        debug_assert_eq!(cells.len(), width * height);
        let mine_count = cells.iter().filter(|c| c.has_mine()).count();
        let mut board = Board {
            width,
            height,
            mine_count,
            cells,
            status: Status::InProgress,
            flagging: false,
            detonated: None,
        };
        board.compute_adjacency();
        board
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn mine_count(&self) -> usize {
        self.mine_count
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn is_flagging(&self) -> bool {
        self.flagging
    }

    pub fn detonated(&self) -> Option<(usize, usize)> {
        self.detonated
    }

    pub fn cell(&self, x: usize, y: usize) -> Option<&Cell> {
        if x < self.width && y < self.height {
            self.cells.get(self.index(x, y))
        } else {
            None
        }
    }

    /// All cells with their coordinates, row by row
    pub fn iter(&self) -> impl Iterator<Item = ((usize, usize), &Cell)> {
        let w = self.width;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, c)| ((i % w, i / w), c))
    }

    /// Mine counter for display (total mines - flags), negative when over-flagged
    pub fn remaining_mines(&self) -> isize {
        let flags = self.cells.iter().filter(|c| c.has_flag()).count();
        self.mine_count as isize - flags as isize
    }

    /// In-bounds 8-neighbourhood of (x, y), without wraparound
    pub fn neighbors(&self, x: usize, y: usize) -> impl Iterator<Item = (usize, usize)> + use<> {
        let (w, h) = (self.width, self.height);
        (y.saturating_sub(1)..=(y + 1).min(h - 1))
            .flat_map(move |ny| (x.saturating_sub(1)..=(x + 1).min(w - 1)).map(move |nx| (nx, ny)))
            .filter(move |&pos| pos != (x, y))
    }

    /// Place mines and compute adjacency, moving NotStarted -> InProgress.
    /// Does nothing once the game has started.
    pub fn start<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Status {
        if self.status != Status::NotStarted {
            return self.status;
        }
        self.place_mines(rng);
        self.compute_adjacency();
        self.status = Status::InProgress;
        info!(
            "game started: {}x{} with {} mines",
            self.width, self.height, self.mine_count
        );
        self.status
    }

    /// Switch the global flagging mode; only possible while playing.
    /// Returns the mode now in effect.
    pub fn toggle_flagging_mode(&mut self) -> bool {
        if self.status == Status::InProgress {
            self.flagging = !self.flagging;
        }
        self.flagging
    }

    /// Primary click: reveals, or toggles a flag while flagging mode is on
    pub fn primary_click(&mut self, x: usize, y: usize) -> Result<Status> {
        let mode = if self.flagging {
            ClickMode::Flag
        } else {
            ClickMode::Reveal
        };
        self.click(x, y, mode)
    }

    pub fn click(&mut self, x: usize, y: usize, mode: ClickMode) -> Result<Status> {
        match mode {
            ClickMode::Reveal => self.reveal_at(x, y),
            ClickMode::Flag => self.toggle_flag_at(x, y),
        }
    }

    /// Reveal (x, y). A revealed numbered cell is handed to quick-reveal,
    /// a zero spreads to its whole connected region.
    pub fn reveal_at(&mut self, x: usize, y: usize) -> Result<Status> {
        let idx = self.checked_index(x, y)?;
        if self.status != Status::InProgress {
            return Ok(self.status);
        }
        let cell = self.cells[idx];
        if cell.is_revealed() {
            if !cell.has_mine() && cell.adjacent_mine_count() > 0 {
                return self.try_quick_reveal(x, y);
            }
            return Ok(self.status);
        }
        match self.cells[idx].reveal() {
            RevealOutcome::NoOp => return Ok(self.status),
            RevealOutcome::Mine => self.detonated = Some((x, y)),
            RevealOutcome::Safe(0) => self.reveal_around(x, y),
            RevealOutcome::Safe(_) => {}
        }
        Ok(self.evaluate())
    }

    pub fn toggle_flag_at(&mut self, x: usize, y: usize) -> Result<Status> {
        let idx = self.checked_index(x, y)?;
        if self.status == Status::InProgress {
            self.cells[idx].toggle_flag();
        }
        Ok(self.status)
    }

    /// Open every unflagged neighbour of a revealed number whose flag count
    /// matches it. Any other flag count leaves the board as is.
    pub fn try_quick_reveal(&mut self, x: usize, y: usize) -> Result<Status> {
        let idx = self.checked_index(x, y)?;
        if self.status != Status::InProgress {
            return Ok(self.status);
        }
        let cell = self.cells[idx];
        if !cell.is_revealed() || cell.has_mine() || cell.adjacent_mine_count() <= 0 {
            return Ok(self.status);
        }
        let flags = self
            .neighbors(x, y)
            .filter(|&(nx, ny)| self.cells[self.index(nx, ny)].has_flag())
            .count();
        if flags != cell.adjacent_mine_count() as usize {
            debug!(
                "quick-reveal at ({x}, {y}) skipped: {flags} flags for {}",
                cell.adjacent_mine_count()
            );
            return Ok(self.status);
        }
        self.reveal_around(x, y);
        Ok(self.evaluate())
    }

    /// Re-check the board; Lose wins ties. Finished games stay finished.
    pub fn evaluate(&mut self) -> Status {
        if self.status != Status::InProgress {
            return self.status;
        }
        let mut won = true;
        for (i, cell) in self.cells.iter().enumerate() {
            if cell.has_mine() && cell.is_revealed() {
                if self.detonated.is_none() {
                    self.detonated = Some((i % self.width, i / self.width));
                }
                self.status = Status::Lose;
                info!("game lost at {:?}", self.detonated);
                return self.status;
            }
            if !cell.has_mine() && !cell.is_revealed() {
                won = false;
            }
        }
        if won {
            self.status = Status::Win;
            info!("game won");
        }
        self.status
    }

    /// Display state of a cell; game-over boards expose their mines
    pub fn view(&self, x: usize, y: usize) -> Result<CellView> {
        let cell = self.cells[self.checked_index(x, y)?];
        let shown = |c: &Cell| {
            if c.is_revealed() {
                CellView::Revealed(c.adjacent_mine_count().max(0) as u8)
            } else {
                CellView::Hidden
            }
        };
        let view = match self.status {
            Status::Lose if cell.has_mine() => {
                if self.detonated == Some((x, y)) {
                    CellView::Detonated
                } else if cell.has_flag() {
                    CellView::Flagged
                } else {
                    CellView::Mine
                }
            }
            Status::Lose if cell.has_flag() => CellView::WrongFlag,
            Status::Win if cell.has_mine() => {
                if cell.has_flag() {
                    CellView::Flagged
                } else {
                    CellView::MissedMine
                }
            }
            Status::Win if cell.is_revealed() => {
                CellView::Cleared(cell.adjacent_mine_count().max(0) as u8)
            }
            _ if cell.is_revealed() && cell.has_mine() => CellView::Mine,
            _ if cell.has_flag() => CellView::Flagged,
            _ => shown(&cell),
        };
        Ok(view)
    }

    fn index(&self, x: usize, y: usize) -> usize {
        y * self.width + x
    }

    fn checked_index(&self, x: usize, y: usize) -> Result<usize> {
        if x < self.width && y < self.height {
            Ok(self.index(x, y))
        } else {
            Err(SweepError::InvalidCoords { x, y })
        }
    }

    // Uniform sampling of distinct cells, resampling on collision
    fn place_mines<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let total = self.cells.len();
        let mut placed = 0;
        while placed < self.mine_count {
            let i = rng.gen_range(0..total);
            if !self.cells[i].has_mine() {
                self.cells[i].place_mine();
                placed += 1;
            }
        }
    }

    fn compute_adjacency(&mut self) {
        for y in 0..self.height {
            for x in 0..self.width {
                let idx = self.index(x, y);
                if self.cells[idx].has_mine() {
                    self.cells[idx].set_adjacent_mine_count(MINE_SENTINEL);
                    continue;
                }
                let n = self
                    .neighbors(x, y)
                    .filter(|&(nx, ny)| self.cells[self.index(nx, ny)].has_mine())
                    .count();
                self.cells[idx].set_adjacent_mine_count(n as i8);
            }
        }
    }

    // Worklist flood-fill; each cell is looked at once per pass
    fn reveal_around(&mut self, x: usize, y: usize) {
        let mut visited = vec![false; self.cells.len()];
        visited[self.index(x, y)] = true;
        let mut stack = vec![(x, y)];
        while let Some((cx, cy)) = stack.pop() {
            for (nx, ny) in self.neighbors(cx, cy) {
                let ni = self.index(nx, ny);
                if visited[ni] {
                    continue;
                }
                visited[ni] = true;
                let cell = &mut self.cells[ni];
                if cell.is_revealed() || cell.has_flag() {
                    continue;
                }
                match cell.reveal() {
                    RevealOutcome::Safe(0) => stack.push((nx, ny)),
                    RevealOutcome::Mine if self.detonated.is_none() => {
                        self.detonated = Some((nx, ny));
                    }
                    _ => {}
                }
            }
        }
    }
}
