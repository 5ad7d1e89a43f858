pub mod data;

use std::io::{stdout, Write};
use std::path::PathBuf;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    terminal::{self, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame, Terminal,
};

use modelsift_engine::Session;

use crate::{clipboard, util};
use data::{checkbox, filter_rows, FilterRow};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Focus {
    Filters,
    Results,
}

struct TuiApp {
    session: Session,
    rows: Vec<FilterRow>,
    focus: Focus,
    filter_cursor: usize,
    filter_scroll: usize,
    result_cursor: usize,
    result_scroll: usize,
    /// Directory to rescan on `r`; none when reading a path list.
    source: Option<PathBuf>,
    source_label: String,
    monitor_url: String,
    /// One-shot message for the status bar.
    flash: Option<String>,
    pending_copy: bool,
    pending_rescan: bool,
    should_quit: bool,
    show_help: bool,
}

impl TuiApp {
    fn new(session: Session, source: Option<PathBuf>, source_label: String, monitor_url: String) -> Self {
        let rows = filter_rows(&session);
        Self {
            session,
            rows,
            focus: Focus::Filters,
            filter_cursor: 0,
            filter_scroll: 0,
            result_cursor: 0,
            result_scroll: 0,
            source,
            source_label,
            monitor_url,
            flash: None,
            pending_copy: false,
            pending_rescan: false,
            should_quit: false,
            show_help: false,
        }
    }

    fn current_row(&self) -> Option<&FilterRow> {
        self.rows.get(self.filter_cursor)
    }

    fn handle_key(&mut self, key: KeyEvent) {
        if self.show_help {
            // Any key dismisses help
            self.show_help = false;
            return;
        }
        self.flash = None;

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('?') => self.show_help = true,
            KeyCode::Tab | KeyCode::BackTab => {
                self.focus = match self.focus {
                    Focus::Filters => Focus::Results,
                    Focus::Results => Focus::Filters,
                };
            }
            KeyCode::Up | KeyCode::Char('k') => self.move_cursor(-1),
            KeyCode::Down | KeyCode::Char('j') => self.move_cursor(1),
            KeyCode::PageUp => self.move_cursor(-20),
            KeyCode::PageDown => self.move_cursor(20),
            KeyCode::Home | KeyCode::Char('g') => self.move_cursor(isize::MIN / 2),
            KeyCode::End | KeyCode::Char('G') => self.move_cursor(isize::MAX / 2),
            KeyCode::Char(' ') | KeyCode::Enter if self.focus == Focus::Filters => self.toggle_current(),
            KeyCode::Char('a') => self.apply_to_group(Session::select_all),
            KeyCode::Char('n') => self.apply_to_group(Session::deselect_all),
            KeyCode::Char('i') => self.apply_to_group(Session::invert),
            KeyCode::Char('y') => self.pending_copy = true,
            KeyCode::Char('r') => self.pending_rescan = true,
            _ => {}
        }
        self.clamp_result_cursor();
    }

    fn move_cursor(&mut self, delta: isize) {
        let (cursor, len) = match self.focus {
            Focus::Filters => (&mut self.filter_cursor, self.rows.len()),
            Focus::Results => (&mut self.result_cursor, self.session.matching().len()),
        };
        if len == 0 {
            *cursor = 0;
            return;
        }
        let next = (*cursor as isize).saturating_add(delta).clamp(0, len as isize - 1);
        *cursor = next as usize;
    }

    /// Space on a value flips it; on a header it flips the whole key
    /// (all selected becomes none, anything else becomes all).
    fn toggle_current(&mut self) {
        let Some(row) = self.current_row().cloned() else {
            return;
        };
        let result = match &row {
            FilterRow::Value { key, value, .. } => self.session.toggle(key, value).map(|_| ()),
            FilterRow::Header { key } => {
                let full = self
                    .session
                    .selection()
                    .group(key)
                    .is_some_and(|g| g.is_fully_selected());
                if full {
                    self.session.deselect_all(key)
                } else {
                    self.session.select_all(key)
                }
            }
        };
        if let Err(e) = result {
            self.flash = Some(e.to_string());
        }
    }

    fn apply_to_group<F>(&mut self, op: F)
    where
        F: FnOnce(&mut Session, &str) -> Result<(), modelsift_engine::EngineError>,
    {
        if self.focus != Focus::Filters {
            return;
        }
        let Some(key) = self.current_row().map(|r| r.key().to_string()) else {
            return;
        };
        if let Err(e) = op(&mut self.session, &key) {
            self.flash = Some(e.to_string());
        }
    }

    fn clamp_result_cursor(&mut self) {
        let len = self.session.matching().len();
        if self.result_cursor >= len {
            self.result_cursor = len.saturating_sub(1);
        }
    }

    /// Replace the session with a fresh scan. Keeps the old one on failure.
    fn rescan(&mut self) {
        let Some(dir) = self.source.clone() else {
            self.flash = Some("rescan needs a directory input".to_string());
            return;
        };
        let files = match modelsift_io::scan_directory(&dir) {
            Ok(scan) => scan.files,
            Err(e) => {
                self.flash = Some(e.to_string());
                return;
            }
        };
        match self.session.reload(&files) {
            Ok(()) => {
                self.rows = filter_rows(&self.session);
                self.filter_cursor = self.filter_cursor.min(self.rows.len().saturating_sub(1));
                self.clamp_result_cursor();
                self.flash = Some(format!("rescanned: {} models", self.session.catalog().len()));
            }
            Err(e) => self.flash = Some(format!("rescan failed: {e}")),
        }
    }

    fn ensure_visible(&mut self, visible_rows: usize) {
        fn adjust(cursor: usize, scroll: &mut usize, visible: usize) {
            if cursor < *scroll {
                *scroll = cursor;
            }
            if visible > 0 && cursor >= *scroll + visible {
                *scroll = cursor - visible + 1;
            }
        }
        adjust(self.filter_cursor, &mut self.filter_scroll, visible_rows);
        adjust(self.result_cursor, &mut self.result_scroll, visible_rows);
    }

    fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let chunks = Layout::vertical([
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(4),
            Constraint::Length(1),
        ])
        .split(area);

        self.draw_title(frame, chunks[0]);

        let panes = Layout::horizontal([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(chunks[1]);
        self.draw_filters(frame, panes[0]);
        self.draw_results(frame, panes[1]);

        self.draw_command(frame, chunks[2]);
        self.draw_status(frame, chunks[3]);

        if self.show_help {
            self.draw_help(frame, area);
        }
    }

    fn draw_title(&self, frame: &mut Frame, area: Rect) {
        let matching = self.session.matching().len();
        let title = format!(
            " modelsift: {} | {} of {} models ",
            self.source_label,
            matching,
            self.session.catalog().len()
        );
        let para = Paragraph::new(Line::from(vec![Span::styled(
            title,
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )]))
        .style(Style::default().bg(Color::Cyan));
        frame.render_widget(para, area);
    }

    fn pane_block(&self, title: &'static str, focus: Focus) -> Block<'static> {
        let color = if self.focus == focus { Color::Cyan } else { Color::DarkGray };
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color))
            .title(title)
    }

    fn draw_filters(&self, frame: &mut Frame, area: Rect) {
        let block = self.pane_block(" Filters ", Focus::Filters);
        let inner = block.inner(area);
        let width = inner.width as usize;
        let visible = inner.height as usize;

        let lines: Vec<Line> = self
            .rows
            .iter()
            .enumerate()
            .skip(self.filter_scroll)
            .take(visible)
            .map(|(i, row)| {
                let is_cursor = self.focus == Focus::Filters && i == self.filter_cursor;
                let mark = checkbox(&self.session, row);
                let (text, style) = match row {
                    FilterRow::Header { key } => (
                        format!("{mark} {key}"),
                        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
                    ),
                    FilterRow::Value { value, count, .. } => {
                        let suffix = format!(" ({count})");
                        let room = width.saturating_sub(8 + suffix.len());
                        (
                            format!("    {mark} {}{suffix}", util::truncate_display(value, room)),
                            Style::default().fg(Color::Gray),
                        )
                    }
                };
                let style = if is_cursor {
                    Style::default().fg(Color::Black).bg(Color::White).add_modifier(Modifier::BOLD)
                } else {
                    style
                };
                Line::from(Span::styled(util::pad_right(&text, width), style))
            })
            .collect();

        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn draw_results(&self, frame: &mut Frame, area: Rect) {
        let block = self.pane_block(" Matching models ", Focus::Results);
        let inner = block.inner(area);
        let width = inner.width as usize;
        let visible = inner.height as usize;
        let matching = self.session.matching();

        if matching.is_empty() {
            let msg = Paragraph::new("(no model matches the current filters)")
                .style(Style::default().fg(Color::DarkGray))
                .block(block);
            frame.render_widget(msg, area);
            return;
        }

        let stamp_width = 14;
        let title_width = width.saturating_sub(stamp_width + 1);
        let lines: Vec<Line> = matching
            .iter()
            .enumerate()
            .skip(self.result_scroll)
            .take(visible)
            .map(|(i, record)| {
                let text = format!(
                    "{} {}",
                    util::pad_right(record.title(), title_width),
                    util::truncate_display(record.timestamp(), stamp_width)
                );
                let style = if self.focus == Focus::Results && i == self.result_cursor {
                    Style::default().fg(Color::Black).bg(Color::White).add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::White)
                };
                Line::from(Span::styled(text, style))
            })
            .collect();

        frame.render_widget(Paragraph::new(lines).block(block), area);
    }

    fn draw_command(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(format!(" Command  (monitor: {}) ", self.monitor_url));
        let para = Paragraph::new(self.session.command())
            .style(Style::default().fg(Color::Yellow))
            .wrap(Wrap { trim: false })
            .block(block);
        frame.render_widget(para, area);
    }

    fn draw_status(&self, frame: &mut Frame, area: Rect) {
        let left = match &self.flash {
            Some(msg) => format!(" {msg}"),
            None => {
                let narrowed = self
                    .session
                    .selection()
                    .groups()
                    .iter()
                    .filter(|g| !g.is_fully_selected())
                    .count();
                format!(" {} filter keys, {} narrowed", self.session.selection().groups().len(), narrowed)
            }
        };
        let right = "space: toggle  y: copy  r: rescan  ?: help ";

        let padding = (area.width as usize)
            .saturating_sub(util::display_width(&left) + util::display_width(right));
        let status = format!("{}{:pad$}{}", left, "", right, pad = padding);

        let para = Paragraph::new(Line::from(vec![Span::styled(
            status,
            Style::default().fg(Color::Black).bg(Color::DarkGray),
        )]))
        .style(Style::default().bg(Color::DarkGray));
        frame.render_widget(para, area);
    }

    fn draw_help(&self, frame: &mut Frame, area: Rect) {
        let help_lines = [
            "",
            "  Navigation",
            "  ----------",
            "  arrows / jk       Move cursor",
            "  PgUp / PgDn       Page up/down",
            "  Home / g          First row",
            "  End  / G          Last row",
            "  Tab               Switch pane",
            "",
            "  Filters",
            "  -------",
            "  Space / Enter     Toggle value (or key)",
            "  a                 Select all for key",
            "  n                 Select none for key",
            "  i                 Invert key",
            "",
            "  General",
            "  -------",
            "  y                 Copy command",
            "  r                 Rescan directory",
            "  q / Esc           Quit",
            "  ?                 Toggle this help",
            "",
        ];
        let help_width: u16 = 44;
        let help_height: u16 = help_lines.len() as u16 + 2;

        let x = area.width.saturating_sub(help_width) / 2;
        let y = area.height.saturating_sub(help_height) / 2;
        let popup = Rect::new(
            area.x + x,
            area.y + y,
            help_width.min(area.width),
            help_height.min(area.height),
        );

        let lines: Vec<Line> = help_lines
            .iter()
            .map(|s| Line::from(Span::styled(*s, Style::default().fg(Color::White))))
            .collect();

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Keybindings ")
            .title_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .style(Style::default().bg(Color::Black));

        frame.render_widget(Clear, popup);
        frame.render_widget(Paragraph::new(lines).block(block), popup);
    }
}

/// Run the interactive browser. Returns the last command shown.
pub fn run(
    session: Session,
    source: Option<PathBuf>,
    source_label: String,
    monitor_url: String,
) -> Result<String, String> {
    let app = TuiApp::new(session, source, source_label, monitor_url);
    run_app(app)
}

fn run_app(mut app: TuiApp) -> Result<String, String> {
    terminal::enable_raw_mode().map_err(|e| format!("failed to enable raw mode: {}", e))?;
    stdout()
        .execute(EnterAlternateScreen)
        .map_err(|e| format!("failed to enter alternate screen: {}", e))?;

    struct Cleanup;
    impl Drop for Cleanup {
        fn drop(&mut self) {
            let _ = stdout().execute(LeaveAlternateScreen);
            let _ = terminal::disable_raw_mode();
        }
    }
    let _cleanup = Cleanup;

    let backend = CrosstermBackend::new(stdout());
    let mut terminal =
        Terminal::new(backend).map_err(|e| format!("failed to create terminal: {}", e))?;

    loop {
        let height = terminal.size().map(|s| s.height).unwrap_or_default();
        // title + command box + status + pane borders
        let visible_rows = height.saturating_sub(8) as usize;
        app.ensure_visible(visible_rows);

        terminal
            .draw(|frame| app.draw(frame))
            .map_err(|e| format!("draw error: {}", e))?;

        if event::poll(Duration::from_millis(100)).map_err(|e| format!("event poll error: {}", e))? {
            if let Event::Key(key) = event::read().map_err(|e| format!("event read error: {}", e))? {
                if key.kind == KeyEventKind::Press {
                    app.handle_key(key);
                }
            }
        }

        if app.pending_copy {
            app.pending_copy = false;
            let mut out = stdout();
            app.flash = Some(match clipboard::copy_to(&mut out, &app.session.command()) {
                Ok(()) => "command copied to clipboard".to_string(),
                Err(e) => format!("copy failed: {e}"),
            });
            let _ = out.flush();
        }
        if app.pending_rescan {
            app.pending_rescan = false;
            app.rescan();
        }

        if app.should_quit {
            break;
        }
    }

    Ok(app.session.command())
}
