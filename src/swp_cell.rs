// A single position on the minefield
// Pure data plus the transitions a cell allows; rendering lives in swp_ui

/// Adjacent count stored on mine cells, where the real count is irrelevant
pub const MINE_SENTINEL: i8 = -1;

/// What a reveal attempt uncovered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealOutcome {
    NoOp,     // Cell is flagged, nothing happened
    Mine,     // Cell holds a mine
    Safe(u8), // Cell is safe, with this many adjacent mines
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cell {
    mine: bool,
    flagged: bool,
    revealed: bool,
    adjacent: i8,
}

impl Cell {
    /// Rebuild a cell from saved flags; adjacency is recomputed by the board
    pub fn restored(mine: bool, flagged: bool, revealed: bool) -> Self {
        Cell {
            mine,
            flagged,
            revealed,
            adjacent: if mine { MINE_SENTINEL } else { 0 },
        }
    }

    pub fn place_mine(&mut self) {
        self.mine = true;
    }

    pub fn set_adjacent_mine_count(&mut self, n: i8) {
        self.adjacent = n;
    }

    /// Reveal this cell unless it carries a flag.
    /// Revealing an already revealed cell changes nothing and reports the same result.
    pub fn reveal(&mut self) -> RevealOutcome {
        if self.flagged {
            return RevealOutcome::NoOp;
        }
        self.revealed = true;
        self.classify()
    }

    /// Flip the flag; revealed cells keep their state.
    /// Returns whether anything changed.
    pub fn toggle_flag(&mut self) -> bool {
        if self.revealed {
            return false;
        }
        self.flagged = !self.flagged;
        true
    }

    pub fn has_mine(&self) -> bool {
        self.mine
    }

    pub fn has_flag(&self) -> bool {
        self.flagged
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    pub fn adjacent_mine_count(&self) -> i8 {
        self.adjacent
    }

    fn classify(&self) -> RevealOutcome {
        if self.mine {
            RevealOutcome::Mine
        } else {
            RevealOutcome::Safe(self.adjacent.max(0) as u8)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_blocks_reveal() {
        let mut cell = Cell::default();
        assert!(cell.toggle_flag());

        assert_eq!(cell.reveal(), RevealOutcome::NoOp);
        assert!(!cell.is_revealed());
        assert!(cell.has_flag());
    }

    #[test]
    fn revealed_cell_ignores_flag_toggle() {
        let mut cell = Cell::default();
        cell.set_adjacent_mine_count(3);
        assert_eq!(cell.reveal(), RevealOutcome::Safe(3));

        assert!(!cell.toggle_flag());
        assert!(!cell.has_flag());
        assert!(cell.is_revealed());
    }

    #[test]
    fn reveal_is_idempotent() {
        let mut cell = Cell::default();
        cell.place_mine();
        cell.place_mine();
        cell.set_adjacent_mine_count(MINE_SENTINEL);

        assert_eq!(cell.reveal(), RevealOutcome::Mine);
        let before = cell;
        assert_eq!(cell.reveal(), RevealOutcome::Mine);
        assert_eq!(cell, before);
    }

    #[test]
    fn restored_mine_gets_sentinel() {
        let cell = Cell::restored(true, true, false);
        assert!(cell.has_mine());
        assert!(cell.has_flag());
        assert_eq!(cell.adjacent_mine_count(), MINE_SENTINEL);
    }
}
