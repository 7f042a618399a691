use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;
use tracing::warn;
use worldcup::{FormField, IndexPath, ListPresenter, TableModel, TeamId};

pub struct App {
    pub presenter: ListPresenter<TableModel>,
    pub state: TableState,
    /// Selected team row (section headers are not selectable)
    pub cursor: Option<IndexPath>,
    /// Last action error, shown in the status bar
    pub message: Option<String>,
}

impl App {
    pub fn new(presenter: ListPresenter<TableModel>) -> Self {
        let cursor = presenter.widget().paths().first().copied();
        let mut app = Self {
            presenter,
            state: TableState::default(),
            cursor,
            message: None,
        };
        app.sync_selection();
        app
    }

    fn table(&self) -> &TableModel {
        self.presenter.widget()
    }

    /// Position of a team row among rendered lines (headers included)
    fn rendered_index(&self, path: IndexPath) -> usize {
        let before: usize = self.table().sections()[..path.section]
            .iter()
            .map(|s| s.rows.len() + 1)
            .sum();
        before + 1 + path.row
    }

    fn sync_selection(&mut self) {
        let index = self.cursor.map(|path| self.rendered_index(path));
        self.state.select(index);
    }

    fn selected_team(&self) -> Option<TeamId> {
        self.cursor
            .and_then(|path| self.table().row(path))
            .map(|row| row.team_id)
    }

    /// Keep the cursor on the same team after it moved
    fn follow(&mut self, team_id: TeamId) {
        let found = self
            .table()
            .paths()
            .into_iter()
            .find(|path| self.table().row(*path).map(|r| r.team_id) == Some(team_id));
        if found.is_some() {
            self.cursor = found;
        }
        self.sync_selection();
    }

    fn step(&mut self, forward: bool) {
        let paths = self.table().paths();
        if paths.is_empty() {
            return;
        }
        let len = paths.len();
        let i = match self.cursor.and_then(|c| paths.iter().position(|p| *p == c)) {
            Some(i) if forward => (i + 1) % len,
            Some(i) => (i + len - 1) % len,
            None => 0,
        };
        self.cursor = Some(paths[i]);
        self.sync_selection();
    }

    pub fn next(&mut self) {
        self.step(true);
    }

    pub fn previous(&mut self) {
        self.step(false);
    }

    pub fn tap_selected(&mut self) {
        let (Some(path), Some(team_id)) = (self.cursor, self.selected_team()) else {
            return;
        };
        match self.presenter.tap_row(path) {
            Ok(()) => {
                self.message = None;
                self.follow(team_id);
            }
            Err(err) => {
                warn!(error = %err, "tap failed");
                self.message = Some(err.to_string());
            }
        }
    }

    pub fn open_add_dialog(&mut self) {
        if let Err(err) = self.presenter.begin_add_team() {
            self.message = Some(err.to_string());
        }
    }

    fn confirm_add(&mut self) {
        match self.presenter.confirm_add_team() {
            Ok(()) => {
                self.message = None;
                if self.cursor.is_none() {
                    self.cursor = self.table().paths().first().copied();
                }
                // a new section above the cursor shifts its rendered line
                if let Some(team_id) = self.selected_team() {
                    self.follow(team_id);
                } else {
                    self.sync_selection();
                }
            }
            Err(err) => {
                warn!(error = %err, "add team failed");
                self.message = Some(err.to_string());
            }
        }
    }

    /// Returns false when the app should quit
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if self.presenter.form().is_some() {
            self.handle_form_key(key);
            return true;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return false,
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Up | KeyCode::Char('k') => self.previous(),
            KeyCode::Enter | KeyCode::Char(' ') => self.tap_selected(),
            KeyCode::Char('s') => self.presenter.device_shaken(),
            KeyCode::Char('a') => self.open_add_dialog(),
            _ => {}
        }
        true
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => self.presenter.cancel_add_team(),
            KeyCode::Enter => self.confirm_add(),
            other => {
                if let Some(form) = self.presenter.form_mut() {
                    match other {
                        KeyCode::Tab | KeyCode::BackTab => form.toggle_focus(),
                        KeyCode::Backspace => form.backspace(),
                        KeyCode::Char(c) => form.push_char(c),
                        _ => {}
                    }
                }
            }
        }
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Run the app
    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res.map_err(Into::into)
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind == KeyEventKind::Press && !app.handle_key(key) {
                return Ok(());
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Standings
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);
    render_table(f, chunks[1], app);
    render_status_bar(f, chunks[2], app);

    if app.presenter.form().is_some() {
        render_add_dialog(f, f.size(), app);
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let table = app.table();

    let add_style = if app.presenter.is_add_enabled() {
        Style::default().fg(Color::Green)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let spans = vec![
        Span::styled(
            "World Cup",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw("  |  "),
        Span::styled(
            format!("Teams: {}", table.total_rows()),
            Style::default().fg(Color::White),
        ),
        Span::raw("  |  "),
        Span::styled(
            format!("Zones: {}", table.sections().len()),
            Style::default().fg(Color::White),
        ),
        Span::raw("  |  "),
        Span::styled("+ Add", add_style),
    ];

    let header = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    f.render_widget(header, area);
}

fn render_table(f: &mut Frame, area: Rect, app: &mut App) {
    let mut rows = Vec::new();
    for section in app.table().sections() {
        rows.push(
            Row::new(vec![Cell::from(section.title.clone())]).style(
                Style::default()
                    .fg(Color::Yellow)
                    .bg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD),
            ),
        );
        for row in &section.rows {
            rows.push(Row::new(vec![
                Cell::from(truncate(&row.title, 28)),
                Cell::from(row.detail.clone()).style(Style::default().fg(Color::Green)),
                Cell::from(row.image_name.clone().unwrap_or_default())
                    .style(Style::default().fg(Color::DarkGray)),
            ]));
        }
    }

    let table = Table::new(
        rows,
        [
            Constraint::Length(30),
            Constraint::Length(12),
            Constraint::Min(10),
        ],
    )
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White))
            .title(" Standings "),
    )
    .highlight_style(
        Style::default()
            .bg(Color::Blue)
            .add_modifier(Modifier::BOLD),
    )
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Yellow));

    let mut spans = match &app.message {
        Some(message) => vec![
            Span::styled(format!(" {} ", message), Style::default().fg(Color::Red)),
            Span::raw(" | "),
        ],
        None => Vec::new(),
    };

    spans.extend([
        key("Enter"),
        Span::raw(" Win | "),
        key("↑/↓"),
        Span::raw(" Nav | "),
        key("s"),
        Span::raw(" Shake | "),
        key("a"),
        Span::raw(" Add | "),
        key("q"),
        Span::raw(" Quit"),
    ]);

    let status = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
    f.render_widget(status, area);
}

fn render_add_dialog(f: &mut Frame, area: Rect, app: &App) {
    let Some(form) = app.presenter.form() else {
        return;
    };

    let field = |label: &'static str, value: &str, focused: bool| {
        let style = if focused {
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };
        Line::from(vec![
            Span::styled(label, style),
            Span::raw(value.to_string()),
            Span::raw(if focused { "▏" } else { "" }),
        ])
    };

    let text = vec![
        Line::from("Add a new team"),
        Line::from(""),
        field("Team Name:       ", &form.name, form.focus == FormField::Name),
        field("Qualifying Zone: ", &form.zone, form.focus == FormField::Zone),
        Line::from(""),
        Line::from(Span::styled(
            "Tab switch | Enter save | Esc cancel",
            Style::default().fg(Color::DarkGray),
        )),
    ];

    let popup = centered_rect(50, 9, area);
    f.render_widget(Clear, popup);
    f.render_widget(
        Paragraph::new(text).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Secret Team "),
        ),
        popup,
    );
}

fn centered_rect(percent_x: u16, height: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(0),
            Constraint::Length(height),
            Constraint::Min(0),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use worldcup::{NewTeam, TeamStore};

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app_with(teams: &[(&str, &str, i32)]) -> App {
        let mut store = TeamStore::open_in_memory().unwrap();
        for (name, zone, wins) in teams {
            let mut team = NewTeam::from_form(name, zone);
            team.wins = *wins;
            store.insert(team);
        }
        store.commit().unwrap();
        App::new(ListPresenter::new(store, TableModel::new()))
    }

    #[test]
    fn test_selection_skips_section_headers() {
        let mut app = app_with(&[("A", "X", 0), ("B", "Y", 0)]);

        assert_eq!(app.state.selected(), Some(1));
        app.next();
        assert_eq!(app.cursor, Some(IndexPath::new(1, 0)));
        assert_eq!(app.state.selected(), Some(3));
        app.next();
        assert_eq!(app.cursor, Some(IndexPath::new(0, 0)));
    }

    #[test]
    fn test_cursor_follows_team_after_reorder() {
        let mut app = app_with(&[("A", "X", 4), ("B", "X", 5)]);
        app.next();
        assert_eq!(app.table().row(app.cursor.unwrap()).unwrap().title, "A");

        app.handle_key(press(KeyCode::Enter));

        assert_eq!(app.cursor, Some(IndexPath::new(0, 0)));
        assert_eq!(app.table().row(IndexPath::new(0, 0)).unwrap().detail, "Wins: 5");
    }

    #[test]
    fn test_add_dialog_flow() {
        let mut app = app_with(&[]);

        app.handle_key(press(KeyCode::Char('a')));
        assert!(app.presenter.form().is_none());
        assert!(app.message.is_some());

        app.handle_key(press(KeyCode::Char('s')));
        app.handle_key(press(KeyCode::Char('a')));
        for c in "Atlantis".chars() {
            app.handle_key(press(KeyCode::Char(c)));
        }
        app.handle_key(press(KeyCode::Tab));
        for c in "Mythic".chars() {
            app.handle_key(press(KeyCode::Char(c)));
        }
        // Enter saves the form instead of tapping a row
        assert!(app.handle_key(press(KeyCode::Enter)));

        assert_eq!(app.table().sections()[0].title, "Mythic");
        assert_eq!(app.table().sections()[0].rows[0].title, "Atlantis");
        assert_eq!(app.cursor, Some(IndexPath::new(0, 0)));
    }

    #[test]
    fn test_escape_closes_dialog_then_quits() {
        let mut app = app_with(&[("A", "X", 0)]);
        app.presenter.device_shaken();
        app.handle_key(press(KeyCode::Char('a')));

        assert!(app.handle_key(press(KeyCode::Esc)));
        assert!(app.presenter.form().is_none());
        assert!(!app.handle_key(press(KeyCode::Esc)));
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("Brazil", 10), "Brazil");
        assert_eq!(truncate("North, Central America", 10), "North, ...");
    }
}
