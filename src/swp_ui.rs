// Terminal UI: draws the session and turns keys/mouse into board commands
// All game rules live in swp_board/swp_game; this module only maps input and renders

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use crossterm::{execute, terminal};
use log::{info, warn};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Span, Spans, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use std::cell::RefCell;
use std::error::Error;
use std::fs;
use std::io;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;
use unicode_width::UnicodeWidthStr;

use crate::swp_board::{CellView, Status};
use crate::swp_color::Palette;
use crate::swp_config::{Config, Difficulty, save_config};
use crate::swp_error::SweepError;
use crate::swp_game::{Command, Session};
use crate::swp_lang::Lang;
use crate::swp_state::{SAVE_EXTENSION, save_path};

type Frame<'a> = ratatui::Frame<'a, CrosstermBackend<io::Stdout>>;

/// Longest redraw wait while the clock is stopped
const IDLE_POLL: Duration = Duration::from_millis(250);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Modal {
    Help,
    Records,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PromptKind {
    Save,
    Load,
}

/// Text prompt standing in for a file picker
#[derive(Debug)]
struct Prompt {
    kind: PromptKind,
    input: String,
}

enum Flow {
    Continue,
    Exit,
}

// Runtime UI variables, grouped so they can be passed around
struct UiState {
    cursor: (usize, usize),
    board_inner: Option<Rect>,      // Cell area of the board, for mouse mapping
    left_press: Option<(usize, usize)>,
    modal: Option<Modal>,
    prompt: Option<Prompt>,
    notice: Option<String>,
    time_label: Rc<RefCell<String>>, // Written by the timer listener
    outcome_seen: bool,
    new_record: bool,
}

impl UiState {
    fn new(time: String) -> Self {
        UiState {
            cursor: (0, 0),
            board_inner: None,
            left_press: None,
            modal: None,
            prompt: None,
            notice: None,
            time_label: Rc::new(RefCell::new(time)),
            outcome_seen: false,
            new_record: false,
        }
    }

    /// Clear per-game state after a new or loaded board
    fn reset_for_board(&mut self, session: &Session) {
        let b = session.board();
        self.cursor = (
            self.cursor.0.min(b.width() - 1),
            self.cursor.1.min(b.height() - 1),
        );
        self.left_press = None;
        self.modal = None;
        self.outcome_seen = session.status().is_finished();
        self.new_record = false;
    }

    /// Board cell under a screen position
    fn cell_at(&self, session: &Session, column: u16, row: u16) -> Option<(usize, usize)> {
        let inner = self.board_inner?;
        if column < inner.x || row < inner.y {
            return None;
        }
        let x = ((column - inner.x) / 2) as usize;
        let y = (row - inner.y) as usize;
        session.board().cell(x, y).map(|_| (x, y))
    }
}

pub fn run(cfg: &mut Config, lang: &mut Lang) -> Result<(), Box<dyn Error>> {
    let mut session = match Session::new(cfg.difficulty) {
        Ok(s) => s,
        Err(e) => {
            warn!("configured difficulty rejected ({e}), falling back to Easy");
            cfg.difficulty = Difficulty::Easy;
            Session::new(Difficulty::Easy)?
        }
    };
    let mut ui = UiState::new(session.timer().display());
    let label = Rc::clone(&ui.time_label);
    session
        .timer_mut()
        .set_listener(move |s| *label.borrow_mut() = s.to_string());

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnableMouseCapture, terminal::EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(&mut terminal, &mut session, &mut ui, cfg, lang);

    // Save current difficulty and language before exiting
    save_config(cfg);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableMouseCapture,
        terminal::LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;
    result
}

fn event_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    session: &mut Session,
    ui: &mut UiState,
    cfg: &mut Config,
    lang: &mut Lang,
) -> Result<(), Box<dyn Error>> {
    let palette = Palette::new(cfg.ascii_icons);
    loop {
        session.timer_mut().pump();
        if session.status().is_finished() && !ui.outcome_seen {
            finish_game(session, ui, cfg);
        }

        terminal.draw(|f| draw(f, session, ui, cfg, lang, &palette))?;

        let timeout = if session.timer().is_running() {
            session.timer().until_next_tick().min(IDLE_POLL)
        } else {
            IDLE_POLL
        };
        if !event::poll(timeout)? {
            continue;
        }
        let flow = match event::read()? {
            Event::Key(KeyEvent {
                code,
                kind: KeyEventKind::Press,
                ..
            }) => on_key(code, session, ui, cfg, lang),
            Event::Mouse(me) => {
                on_mouse(me, session, ui, lang);
                Flow::Continue
            }
            _ => Flow::Continue,
        };
        if let Flow::Exit = flow {
            return Ok(());
        }
    }
}

/// Record a win and open the game-over dialog
fn finish_game(session: &Session, ui: &mut UiState, cfg: &mut Config) {
    ui.outcome_seen = true;
    ui.modal = Some(Modal::GameOver);
    if let Some(pos) = session.board().detonated() {
        ui.cursor = pos;
    }
    if session.status() == Status::Win {
        let secs = session.timer().elapsed_secs();
        ui.new_record = cfg.set_record(&session.difficulty(), secs);
        if ui.new_record {
            info!("new record on {}: {secs}s", session.difficulty().name());
            save_config(cfg);
        }
    }
}

fn report(ui: &mut UiState, lang: &Lang, err: &SweepError) {
    warn!("{err}");
    ui.notice = Some(Lang::fill(lang.assets.notice_error_fmt, &[&err.to_string()]));
}

fn apply(cmd: Command, session: &mut Session, ui: &mut UiState, lang: &Lang) {
    if let Err(e) = session.handle(cmd) {
        report(ui, lang, &e);
    }
}

fn play_again(session: &mut Session, ui: &mut UiState, lang: &Lang) {
    match session.play_again() {
        Ok(()) => {
            ui.notice = None;
            ui.reset_for_board(session);
        }
        Err(e) => report(ui, lang, &e),
    }
}

fn new_game(difficulty: Difficulty, session: &mut Session, ui: &mut UiState, cfg: &mut Config, lang: &Lang) {
    match session.new_game(difficulty) {
        Ok(()) => {
            cfg.difficulty = difficulty;
            ui.notice = None;
            ui.reset_for_board(session);
        }
        Err(e) => report(ui, lang, &e),
    }
}

fn on_key(code: KeyCode, session: &mut Session, ui: &mut UiState, cfg: &mut Config, lang: &mut Lang) -> Flow {
    if let Some(prompt) = ui.prompt.as_mut() {
        match code {
            KeyCode::Char(c) if prompt.input.width() < 40 => prompt.input.push(c),
            KeyCode::Backspace => {
                prompt.input.pop();
            }
            KeyCode::Esc => {
                ui.prompt = None;
                ui.notice = Some(lang.assets.notice_cancelled.to_string());
            }
            KeyCode::Enter => {
                if let Some(prompt) = ui.prompt.take() {
                    confirm_prompt(prompt, session, ui, cfg, lang);
                }
            }
            _ => {}
        }
        return Flow::Continue;
    }

    if let Some(modal) = ui.modal {
        match code {
            KeyCode::F(2) if modal == Modal::GameOver => play_again(session, ui, lang),
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char(' ') => ui.modal = None,
            _ => {}
        }
        return Flow::Continue;
    }

    let (cx, cy) = ui.cursor;
    let (w, h) = (session.board().width(), session.board().height());
    match code {
        KeyCode::Esc => return Flow::Exit,
        KeyCode::F(1) => ui.modal = Some(Modal::Help),
        KeyCode::F(2) => play_again(session, ui, lang),
        KeyCode::F(3) => {
            if session.status() == Status::InProgress {
                ui.prompt = Some(Prompt {
                    kind: PromptKind::Save,
                    input: String::new(),
                });
            } else {
                report(ui, lang, &SweepError::NoGameInProgress);
            }
        }
        KeyCode::F(4) => {
            ui.prompt = Some(Prompt {
                kind: PromptKind::Load,
                input: String::new(),
            })
        }
        KeyCode::F(5) => {
            let next = (session.difficulty().to_index() + 1) % 4;
            new_game(Difficulty::from_index(next, cfg.custom_params()), session, ui, cfg, lang);
        }
        KeyCode::F(6) => ui.modal = Some(Modal::Records),
        KeyCode::F(7) => cfg.language = lang.toggle().to_string(),
        KeyCode::Left => ui.cursor.0 = cx.saturating_sub(1),
        KeyCode::Right => ui.cursor.0 = (cx + 1).min(w - 1),
        KeyCode::Up => ui.cursor.1 = cy.saturating_sub(1),
        KeyCode::Down => ui.cursor.1 = (cy + 1).min(h - 1),
        KeyCode::Char(' ') => apply(Command::Primary(cx, cy), session, ui, lang),
        KeyCode::Char('r') | KeyCode::Char('R') => apply(Command::Reveal(cx, cy), session, ui, lang),
        KeyCode::Char('f') | KeyCode::Char('F') => apply(Command::ToggleFlag(cx, cy), session, ui, lang),
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Enter => {
            apply(Command::QuickReveal(cx, cy), session, ui, lang)
        }
        KeyCode::Char('m') | KeyCode::Char('M') => apply(Command::ToggleFlaggingMode, session, ui, lang),
        _ => {}
    }
    Flow::Continue
}

fn confirm_prompt(prompt: Prompt, session: &mut Session, ui: &mut UiState, cfg: &Config, lang: &Lang) {
    if prompt.input.trim().is_empty() {
        ui.notice = Some(lang.assets.notice_cancelled.to_string());
        return;
    }
    let path = save_path(&cfg.save_dir(), &prompt.input);
    let shown = path.display().to_string();
    match prompt.kind {
        PromptKind::Save => match session.save(&path) {
            Ok(()) => ui.notice = Some(Lang::fill(lang.assets.notice_saved_fmt, &[&shown])),
            Err(e) => report(ui, lang, &e),
        },
        PromptKind::Load => match session.load(&path) {
            Ok(()) => {
                ui.reset_for_board(session);
                ui.notice = Some(Lang::fill(lang.assets.notice_loaded_fmt, &[&shown]));
            }
            Err(e) => report(ui, lang, &e),
        },
    }
}

fn on_mouse(me: MouseEvent, session: &mut Session, ui: &mut UiState, lang: &Lang) {
    if ui.prompt.is_some() {
        return;
    }
    if ui.modal.is_some() {
        if let MouseEventKind::Down(_) = me.kind {
            ui.modal = None;
        }
        return;
    }
    let cell = ui.cell_at(session, me.column, me.row);
    match me.kind {
        MouseEventKind::Moved => {
            if let Some(pos) = cell {
                ui.cursor = pos;
            }
        }
        MouseEventKind::Down(MouseButton::Left) => ui.left_press = cell,
        MouseEventKind::Up(MouseButton::Left) => {
            let pressed = ui.left_press.take();
            if let (Some(p), Some(c)) = (pressed, cell) {
                if p == c {
                    ui.cursor = c;
                    apply(Command::Primary(c.0, c.1), session, ui, lang);
                }
            }
        }
        MouseEventKind::Down(MouseButton::Right) => {
            if let Some((x, y)) = cell {
                ui.cursor = (x, y);
                session.secondary_press(x, y);
            }
        }
        MouseEventKind::Up(MouseButton::Right) => {
            if let Err(e) = session.secondary_release(cell) {
                report(ui, lang, &e);
            }
        }
        _ => {}
    }
}

fn draw(f: &mut Frame, session: &Session, ui: &mut UiState, cfg: &Config, lang: &Lang, palette: &Palette) {
    let size = f.size();
    let board = session.board();
    let min_w = ((board.width() * 2 + 4) as u16).max(72);
    let min_h = board.height() as u16 + 8;
    if size.width < min_w || size.height < min_h {
        let lines = vec![
            Spans::from(Span::raw(lang.assets.tsmsg_line1)),
            Spans::from(Span::raw(Lang::fill(
                lang.assets.tsmsg_line2,
                &[&min_w.to_string(), &min_h.to_string()],
            ))),
        ];
        let warn = Paragraph::new(Text::from(lines))
            .block(Block::default().borders(Borders::ALL).title(lang.assets.tsmsg_title))
            .alignment(Alignment::Center);
        f.render_widget(Clear, size);
        let area = center_rect(40.min(size.width), 4.min(size.height), size);
        f.render_widget(warn, area);
        ui.board_inner = None;
        return;
    }

    // layout: top menu row, center board, bottom status
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(6), Constraint::Length(3)].as_ref())
        .split(size);

    let a = &lang.assets;
    let key_style = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
    let menu_items = [
        ("F1", a.menu_help),
        ("F2", a.menu_new),
        ("F3", a.menu_save),
        ("F4", a.menu_load),
        ("F5", a.menu_difficulty),
        ("F6", a.menu_records),
        ("F7", a.menu_language),
    ];
    let mut spans = vec![Span::raw(" ")];
    for (i, (key, rest)) in menu_items.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("  "));
        }
        spans.push(Span::styled(key.to_string(), key_style));
        spans.push(Span::raw(format!(": {rest}")));
    }
    f.render_widget(
        Paragraph::new(Spans::from(spans)).block(Block::default().borders(Borders::ALL)),
        chunks[0],
    );

    // status row: counters, then notice or hint, Esc on the right
    let time = ui.time_label.borrow().clone();
    let mut left = Lang::fill(a.status_fmt, &[&board.remaining_mines().to_string(), &time]);
    if board.is_flagging() {
        left.push_str(a.status_flag_mode);
        left.push(' ');
    }
    let hint = match (&ui.notice, board.status()) {
        (Some(n), _) => n.clone(),
        (None, Status::NotStarted) => a.start_hint.to_string(),
        _ => String::new(),
    };
    let right = format!("Esc: {} ", a.menu_exit);
    let inner_w = chunks[2].width.saturating_sub(2) as usize;
    let used = left.width() + hint.width() + right.width();
    let gap = inner_w.saturating_sub(used).max(1);
    let status = Spans::from(vec![
        Span::raw(left),
        Span::styled(hint, Style::default().add_modifier(Modifier::ITALIC)),
        Span::raw(" ".repeat(gap)),
        Span::styled(right, key_style),
    ]);
    f.render_widget(
        Paragraph::new(status).block(Block::default().borders(Borders::ALL)),
        chunks[2],
    );

    // board
    let d = session.difficulty();
    let title = match d {
        Difficulty::Custom(w, h, n) => format!("{} {w}x{h}/{n}", lang.diff_name(d.to_index())),
        _ => lang.diff_name(d.to_index()).to_string(),
    };
    let area = center_rect((board.width() * 2 + 3) as u16, board.height() as u16 + 2, chunks[1]);
    ui.board_inner = Some(Rect::new(area.x + 1, area.y + 1, area.width - 2, area.height - 2));
    let armed = session.flag_intent().armed();
    let mut lines = Vec::with_capacity(board.height());
    for y in 0..board.height() {
        let mut row = Vec::with_capacity(board.width() + 1);
        for x in 0..board.width() {
            let view = board.view(x, y).unwrap_or(CellView::Hidden);
            let (glyph, mut style) = palette.glyph(view);
            if armed == Some((x, y)) {
                style = style.bg(palette.armed_bg);
            } else if ui.cursor == (x, y) && !board.status().is_finished() {
                style = style.bg(palette.cursor_bg);
            }
            row.push(Span::styled(format!(" {glyph}"), style));
        }
        row.push(Span::styled(" ", Style::default().bg(palette.board_bg)));
        lines.push(Spans::from(row));
    }
    let grid = Paragraph::new(Text::from(lines)).block(
        Block::default()
            .borders(Borders::ALL)
            .title(title)
            .title_alignment(Alignment::Center),
    );
    f.render_widget(grid, area);

    if let Some(prompt) = &ui.prompt {
        draw_prompt(f, prompt, cfg, lang, size);
    } else if let Some(modal) = ui.modal {
        draw_modal(f, modal, session, ui, cfg, lang, size);
    }
}

fn draw_modal(
    f: &mut Frame,
    modal: Modal,
    session: &Session,
    ui: &UiState,
    cfg: &Config,
    lang: &Lang,
    size: Rect,
) {
    let a = &lang.assets;
    let (title, lines): (String, Vec<String>) = match modal {
        Modal::Help => (
            a.help_title.to_string(),
            a.help_lines.iter().map(|s| s.to_string()).collect(),
        ),
        Modal::Records => {
            let mut lines = vec![a.rec_best_time.to_string()];
            for (i, d) in Difficulty::PRESETS.iter().enumerate() {
                let rec = match cfg.get_record(d) {
                    Some(r) => format!("{:>5}  {}", r.secs, lang.format_date(&r.date)),
                    None => a.rec_no_record.to_string(),
                };
                lines.push(format!("  {}: {rec}", lang.diff_name(i)));
            }
            (a.menu_records.to_string(), lines)
        }
        Modal::GameOver => {
            let secs = session.timer().elapsed_secs().to_string();
            let mut lines = Vec::new();
            if session.status() == Status::Win {
                lines.push(a.win_message.to_string());
                let fmt = if ui.new_record {
                    a.win_time_record_fmt
                } else {
                    a.win_time_fmt
                };
                lines.push(Lang::fill(fmt, &[&secs]));
            } else {
                lines.push(a.loss_message.to_string());
            }
            lines.push(a.again_hint.to_string());
            (String::new(), lines)
        }
    };
    let width = lines.iter().map(|l| l.width()).max().unwrap_or(0).max(title.width()) + 4;
    let rect = center_rect(
        (width as u16).min(size.width),
        (lines.len() as u16 + 4).min(size.height),
        size,
    );
    let align = if modal == Modal::GameOver {
        Alignment::Center
    } else {
        Alignment::Left
    };
    let mut text: Vec<Spans> = vec![Spans::from("")];
    text.extend(lines.into_iter().map(Spans::from));
    f.render_widget(Clear, rect);
    f.render_widget(
        Paragraph::new(Text::from(text))
            .block(Block::default().borders(Borders::ALL).title(title))
            .alignment(align),
        rect,
    );
}

fn draw_prompt(f: &mut Frame, prompt: &Prompt, cfg: &Config, lang: &Lang, size: Rect) {
    let a = &lang.assets;
    let dir = cfg.save_dir();
    let title = match prompt.kind {
        PromptKind::Save => a.prompt_save_title,
        PromptKind::Load => a.prompt_load_title,
    };
    let mut lines = vec![
        Spans::from(Span::styled(
            format!(" {}", dir.display()),
            Style::default().add_modifier(Modifier::DIM),
        )),
        Spans::from(vec![
            Span::raw(" > "),
            Span::styled(
                format!("{}_", prompt.input),
                Style::default().add_modifier(Modifier::BOLD),
            ),
        ]),
    ];
    if prompt.kind == PromptKind::Load {
        for name in list_saves(&dir).into_iter().take(5) {
            lines.push(Spans::from(format!("   {name}")));
        }
    }
    lines.push(Spans::from(""));
    lines.push(Spans::from(format!(" {}", a.prompt_hint)));
    let rect = center_rect(60.min(size.width), (lines.len() as u16 + 2).min(size.height), size);
    f.render_widget(Clear, rect);
    f.render_widget(
        Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL).title(title)),
        rect,
    );
}

/// Save files in `dir`, newest first
fn list_saves(dir: &Path) -> Vec<String> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files: Vec<_> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().is_some_and(|x| x == SAVE_EXTENSION))
        .filter_map(|e| {
            let modified = e.metadata().and_then(|m| m.modified()).ok()?;
            Some((modified, e.file_name().to_string_lossy().into_owned()))
        })
        .collect();
    files.sort_by(|a, b| b.0.cmp(&a.0));
    files.into_iter().map(|(_, name)| name).collect()
}

fn center_rect(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}
