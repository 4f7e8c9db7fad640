// Glyphs and colors for drawing the minefield
// Colors are matched to the Windows Terminal (Campbell) palette when the
// terminal supports it, so the board looks the same everywhere.

use ratatui::style::{Color, Modifier, Style};
use term_color_support::ColorSupport;

use crate::swp_board::CellView;

/// Campbell RGB value and a stable 256-color index for each ANSI color
fn campbell(color: Color) -> Option<((u8, u8, u8), u8)> {
    match color {
        Color::Black => Some(((12, 12, 12), 232)),
        Color::Red => Some(((197, 15, 31), 160)),
        Color::Green => Some(((19, 161, 14), 28)),
        Color::Yellow => Some(((193, 156, 0), 178)),
        Color::Blue => Some(((0, 55, 218), 20)),
        Color::Magenta => Some(((136, 23, 152), 90)),
        Color::Cyan => Some(((58, 150, 221), 38)),
        Color::Gray => Some(((204, 204, 204), 250)),
        Color::DarkGray => Some(((118, 118, 118), 243)),
        Color::LightRed => Some(((231, 72, 86), 203)),
        Color::LightGreen => Some(((22, 198, 12), 46)),
        Color::White => Some(((242, 242, 242), 255)),
        _ => None,
    }
}

/// Board colors resolved once for the current terminal
pub struct Palette {
    pub board_bg: Color,
    pub cursor_bg: Color,
    pub armed_bg: Color,
    pub hidden: Color,
    pub flag: Color,
    pub mine: Color,
    pub detonated_bg: Color,
    pub cleared_bg: Color, // Revealed cells once the board is won
    pub numbers: [Color; 8],
    ascii: bool,
}

impl Palette {
    pub fn new(ascii: bool) -> Self {
        let support = ColorSupport::stdout();
        let pick = |c: Color| match campbell(c) {
            Some((rgb, _)) if support.has_16m => Color::Rgb(rgb.0, rgb.1, rgb.2),
            Some((_, idx)) if support.has_256 => Color::Indexed(idx),
            _ => c,
        };
        Palette {
            board_bg: pick(Color::DarkGray),
            cursor_bg: pick(Color::Cyan),
            armed_bg: pick(Color::Gray),
            hidden: pick(Color::Gray),
            flag: pick(Color::Red),
            mine: pick(Color::Black),
            detonated_bg: pick(Color::LightRed),
            cleared_bg: pick(Color::Green),
            numbers: [
                pick(Color::Blue),
                pick(Color::Green),
                pick(Color::Red),
                pick(Color::Magenta),
                pick(Color::Yellow),
                pick(Color::Cyan),
                pick(Color::Black),
                pick(Color::White),
            ],
            ascii,
        }
    }

    /// Text and style for one cell
    pub fn glyph(&self, view: CellView) -> (String, Style) {
        let base = Style::default().bg(self.board_bg);
        let (hidden, mine, flag) = if self.ascii {
            ("#", "*", "F")
        } else {
            ("■", "☼", "⚑")
        };
        match view {
            CellView::Hidden => (hidden.to_string(), base.fg(self.hidden)),
            CellView::Flagged => (flag.to_string(), base.fg(self.flag)),
            CellView::Revealed(0) => (" ".to_string(), base),
            CellView::Revealed(n) => self.number(n, base),
            CellView::Cleared(0) => (" ".to_string(), base.bg(self.cleared_bg)),
            CellView::Cleared(n) => self.number(n, base.bg(self.cleared_bg)),
            CellView::Mine => (mine.to_string(), base.fg(self.mine)),
            CellView::Detonated => (mine.to_string(), base.fg(self.mine).bg(self.detonated_bg)),
            CellView::WrongFlag => ("X".to_string(), base.fg(self.flag).add_modifier(Modifier::BOLD)),
            CellView::MissedMine => (mine.to_string(), base.fg(self.flag)),
        }
    }

    fn number(&self, n: u8, base: Style) -> (String, Style) {
        let color = self.numbers[(n as usize).clamp(1, 8) - 1];
        (n.to_string(), base.fg(color).add_modifier(Modifier::BOLD))
    }
}
