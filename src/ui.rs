use anyhow::Result;
use church_admin::entities::{
    ChurchEvent, EventStatus, EventType, FinanceRecord, FinanceType, Member, MemberStatus,
};
use church_admin::views::{
    filter_events, filter_finance, format_millions, format_rupiah, initials, search_members,
    DashboardSummary, FinanceSummary,
};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use std::io;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Dashboard,
    Members,
    Events,
    Finance,
}

impl Page {
    const ALL: [Page; 4] = [Page::Dashboard, Page::Members, Page::Events, Page::Finance];

    pub fn next(&self) -> Self {
        match self {
            Page::Dashboard => Page::Members,
            Page::Members => Page::Events,
            Page::Events => Page::Finance,
            Page::Finance => Page::Dashboard,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Dashboard => Page::Finance,
            Page::Members => Page::Dashboard,
            Page::Events => Page::Members,
            Page::Finance => Page::Events,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Dashboard => "Dashboard",
            Page::Members => "Jemaat",
            Page::Events => "Kegiatan",
            Page::Finance => "Keuangan",
        }
    }
}

pub struct App {
    pub members: Vec<Member>,
    pub events: Vec<ChurchEvent>,
    pub finance: Vec<FinanceRecord>,
    pub visible_members: Vec<Member>,
    pub visible_events: Vec<ChurchEvent>,
    pub visible_finance: Vec<FinanceRecord>,
    pub dashboard: DashboardSummary,
    pub state: TableState,
    pub current_page: Page,
    pub show_detail: bool,
    pub search: String,
    pub search_mode: bool,
    pub event_filter: Option<EventType>,
    pub finance_filter: Option<FinanceType>,
    pub user_name: String,
}

impl App {
    pub fn new(
        members: Vec<Member>,
        events: Vec<ChurchEvent>,
        finance: Vec<FinanceRecord>,
        user_name: impl Into<String>,
    ) -> Self {
        let dashboard = DashboardSummary::build(&members, &events, &finance);

        let mut app = Self {
            visible_members: members.clone(),
            visible_events: events.clone(),
            visible_finance: finance.clone(),
            members,
            events,
            finance,
            dashboard,
            state: TableState::default(),
            current_page: Page::Dashboard,
            show_detail: false,
            search: String::new(),
            search_mode: false,
            event_filter: None,
            finance_filter: None,
            user_name: user_name.into(),
        };
        app.reset_selection();
        app
    }

    /// Rows in the table of the current page.
    pub fn row_count(&self) -> usize {
        match self.current_page {
            Page::Dashboard => 0,
            Page::Members => self.visible_members.len(),
            Page::Events => self.visible_events.len(),
            Page::Finance => self.visible_finance.len(),
        }
    }

    fn reset_selection(&mut self) {
        if self.row_count() > 0 {
            self.state.select(Some(0));
        } else {
            self.state.select(None);
        }
    }

    pub fn toggle_detail(&mut self) {
        if self.current_page != Page::Dashboard {
            self.show_detail = !self.show_detail;
        }
    }

    pub fn selected_member(&self) -> Option<&Member> {
        self.state.selected().and_then(|i| self.visible_members.get(i))
    }

    pub fn selected_event(&self) -> Option<&ChurchEvent> {
        self.state.selected().and_then(|i| self.visible_events.get(i))
    }

    pub fn selected_finance(&self) -> Option<&FinanceRecord> {
        self.state.selected().and_then(|i| self.visible_finance.get(i))
    }

    pub fn set_page(&mut self, page: Page) {
        self.current_page = page;
        self.show_detail = false;
        self.search_mode = false;
        self.reset_selection();
    }

    pub fn next_page(&mut self) {
        self.set_page(self.current_page.next());
    }

    pub fn previous_page(&mut self) {
        self.set_page(self.current_page.previous());
    }

    // Search (Members page)

    pub fn push_search(&mut self, c: char) {
        self.search.push(c);
        self.apply_search();
    }

    pub fn pop_search(&mut self) {
        self.search.pop();
        self.apply_search();
    }

    fn apply_search(&mut self) {
        self.visible_members = search_members(&self.members, &self.search);
        self.reset_selection();
    }

    // Type filters (Events and Finance pages)

    pub fn set_event_filter(&mut self, filter: Option<EventType>) {
        self.event_filter = filter;
        self.visible_events = filter_events(&self.events, filter);
        self.reset_selection();
    }

    pub fn set_finance_filter(&mut self, filter: Option<FinanceType>) {
        self.finance_filter = filter;
        self.visible_finance = filter_finance(&self.finance, filter);
        self.reset_selection();
    }

    /// Select the filter bound to a number key; `0` clears it.
    pub fn filter_key(&mut self, digit: usize) {
        match self.current_page {
            Page::Events if digit == 0 => self.set_event_filter(None),
            Page::Events => {
                if let Some(t) = EventType::ALL.get(digit - 1) {
                    self.set_event_filter(Some(*t));
                }
            }
            Page::Finance if digit == 0 => self.set_finance_filter(None),
            Page::Finance => {
                if let Some(k) = FinanceType::ALL.get(digit - 1) {
                    self.set_finance_filter(Some(*k));
                }
            }
            Page::Dashboard | Page::Members => {}
        }
    }

    pub fn clear_filter(&mut self) {
        match self.current_page {
            Page::Members => {
                self.search.clear();
                self.apply_search();
            }
            Page::Events => self.set_event_filter(None),
            Page::Finance => self.set_finance_filter(None),
            Page::Dashboard => {}
        }
    }

    pub fn next(&mut self) {
        let len = self.row_count();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i >= len - 1 => 0,
            Some(i) => i + 1,
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.row_count();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) => len - 1,
            Some(i) => i - 1,
            None => 0,
        };
        self.state.select(Some(i));
    }

    pub fn finance_summary(&self) -> FinanceSummary {
        FinanceSummary::from_records(&self.finance)
    }

    /// Returns false when the app should quit.
    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        if self.search_mode {
            match key.code {
                KeyCode::Esc | KeyCode::Enter => self.search_mode = false,
                KeyCode::Backspace => self.pop_search(),
                KeyCode::Char(c) => self.push_search(c),
                _ => {}
            }
            return true;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return false,
            KeyCode::Enter => self.toggle_detail(),
            KeyCode::BackTab => self.previous_page(),
            KeyCode::Tab => {
                if key.modifiers.contains(KeyModifiers::SHIFT) {
                    self.previous_page();
                } else {
                    self.next_page();
                }
            }
            KeyCode::Char('/') if self.current_page == Page::Members => self.search_mode = true,
            KeyCode::Char('c') => self.clear_filter(),
            KeyCode::Char(c @ '0'..='9') => {
                self.filter_key(c as usize - '0' as usize);
            }
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Up | KeyCode::Char('k') => self.previous(),
            KeyCode::Home => self.reset_selection(),
            KeyCode::End => {
                let len = self.row_count();
                if len > 0 {
                    self.state.select(Some(len - 1));
                }
            }
            _ => {}
        }
        true
    }
}

pub fn run_ui(app: &mut App) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res?;
    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if !app.handle_key(key) {
                return Ok(());
            }
        }
    }
}

fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header with navigation
            Constraint::Min(0),    // Content area
            Constraint::Length(3), // Status bar
        ])
        .split(f.size());

    render_header(f, chunks[0], app);

    if app.show_detail {
        let content_chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(chunks[1]);

        render_page(f, content_chunks[0], app);
        render_detail_panel(f, content_chunks[1], app);
    } else {
        render_page(f, chunks[1], app);
    }

    render_status_bar(f, chunks[2], app);
}

fn render_page(f: &mut Frame, area: Rect, app: &mut App) {
    match app.current_page {
        Page::Dashboard => render_dashboard(f, area, app),
        Page::Members => render_members(f, area, app),
        Page::Events => render_events(f, area, app),
        Page::Finance => render_finance(f, area, app),
    }
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut tab_spans = vec![];
    for (i, page) in Page::ALL.iter().enumerate() {
        if i > 0 {
            tab_spans.push(Span::raw(" │ "));
        }
        let style = if *page == app.current_page {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        tab_spans.push(Span::styled(page.title().to_string(), style));
    }

    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        format!("Jemaat: {}", app.members.len()),
        Style::default().fg(Color::White),
    ));
    tab_spans.push(Span::raw("  |  "));
    tab_spans.push(Span::styled(
        app.user_name.clone(),
        Style::default().fg(Color::Green),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan))
            .title(" Church Admin "),
    );

    f.render_widget(header, area);
}

fn header_row(titles: &[&'static str]) -> Row<'static> {
    let cells = titles.iter().map(|h| {
        Cell::from(*h).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });
    Row::new(cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1)
}

fn table_block(title: String) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::White))
        .title(title)
}

fn highlight() -> Style {
    Style::default()
        .bg(Color::DarkGray)
        .add_modifier(Modifier::BOLD)
}

fn render_dashboard(f: &mut Frame, area: Rect, app: &App) {
    let d = &app.dashboard;
    let label = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);

    let mut content = vec![
        Line::from(""),
        Line::from(vec![
            Span::styled("  Total Jemaat:     ", label),
            Span::raw(format!("{} ({} aktif)", d.total_members, d.active_members)),
        ]),
        Line::from(vec![
            Span::styled("  Kegiatan:         ", label),
            Span::raw(format!("{} ({} mendatang)", d.total_events, d.upcoming_events)),
        ]),
        Line::from(vec![
            Span::styled("  Total Pemasukan:  ", label),
            Span::styled(format_millions(d.total_income), Style::default().fg(Color::Green)),
        ]),
        Line::from(vec![
            Span::styled("  Saldo:            ", label),
            Span::styled(
                format_rupiah(d.balance),
                Style::default().fg(if d.balance < 0 { Color::Red } else { Color::Green }),
            ),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            "  JEMAAT TERBARU",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        )),
    ];

    for m in &d.recent_members {
        content.push(Line::from(vec![
            Span::styled(format!("  [{:>2}] ", initials(&m.name)), Style::default().fg(Color::Cyan)),
            Span::raw(m.name.clone()),
            Span::styled(format!("  {}", m.status), status_style(m.status)),
        ]));
    }

    content.push(Line::from(""));
    content.push(Line::from(Span::styled(
        "  KEGIATAN MENDATANG",
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
    )));
    for e in &d.next_events {
        content.push(Line::from(vec![
            Span::styled(format!("  {} {}  ", e.date, e.time), Style::default().fg(Color::Cyan)),
            Span::raw(e.name.clone()),
            Span::styled(format!("  {}", e.location), Style::default().fg(Color::DarkGray)),
        ]));
    }

    let paragraph = Paragraph::new(content).block(table_block(" Dashboard ".to_string()));
    f.render_widget(paragraph, area);
}

fn status_style(status: MemberStatus) -> Style {
    Style::default().fg(match status {
        MemberStatus::Active => Color::Green,
        MemberStatus::Inactive => Color::Red,
        MemberStatus::Transferred => Color::Yellow,
    })
}

fn render_members(f: &mut Frame, area: Rect, app: &mut App) {
    let rows = app.visible_members.iter().map(|m| {
        Row::new(vec![
            Cell::from(truncate(&m.name, 24)),
            Cell::from(truncate(&m.email, 28)),
            Cell::from(m.phone.clone()),
            Cell::from(m.gender.to_string()),
            Cell::from(m.status.to_string()).style(status_style(m.status)),
        ])
    });

    let title = if app.search.is_empty() {
        format!(" Jemaat ({}) ", app.visible_members.len())
    } else {
        format!(" Jemaat ({}) - cari: {} ", app.visible_members.len(), app.search)
    };

    let table = Table::new(
        rows,
        [
            Constraint::Length(26),
            Constraint::Length(30),
            Constraint::Length(15),
            Constraint::Length(11),
            Constraint::Length(12),
        ],
    )
    .header(header_row(&["Nama", "Email", "Telepon", "Gender", "Status"]))
    .block(table_block(title))
    .highlight_style(highlight())
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn event_color(event_type: EventType) -> Color {
    match event_type {
        EventType::Worship => Color::Cyan,
        EventType::Activity => Color::Green,
        EventType::Service => Color::Yellow,
        EventType::Meeting => Color::Magenta,
    }
}

fn render_events(f: &mut Frame, area: Rect, app: &mut App) {
    let rows = app.visible_events.iter().map(|e| {
        let status_color = match e.status {
            EventStatus::Upcoming => Color::Green,
            EventStatus::Ongoing => Color::Yellow,
            EventStatus::Finished => Color::DarkGray,
        };
        Row::new(vec![
            Cell::from(e.date.clone()),
            Cell::from(e.time.clone()),
            Cell::from(truncate(&e.name, 26)),
            Cell::from(e.event_type.to_string()).style(Style::default().fg(event_color(e.event_type))),
            Cell::from(truncate(&e.location, 22)),
            Cell::from(e.status.to_string()).style(Style::default().fg(status_color)),
        ])
    });

    let filter = app
        .event_filter
        .map(|t| t.to_string())
        .unwrap_or_else(|| "Semua".to_string());

    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Length(7),
            Constraint::Length(28),
            Constraint::Length(11),
            Constraint::Length(24),
            Constraint::Length(12),
        ],
    )
    .header(header_row(&["Tanggal", "Jam", "Nama", "Jenis", "Lokasi", "Status"]))
    .block(table_block(format!(" Kegiatan - {} ", filter)))
    .highlight_style(highlight())
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_finance(f: &mut Frame, area: Rect, app: &mut App) {
    let summary = app.finance_summary();

    let rows = app.visible_finance.iter().map(|r| {
        let color = if r.is_income() { Color::Green } else { Color::Red };
        Row::new(vec![
            Cell::from(r.date.clone()),
            Cell::from(r.kind.to_string()).style(Style::default().fg(color)),
            Cell::from(truncate(&r.category, 22)),
            Cell::from(format_rupiah(r.signed_amount())).style(Style::default().fg(color)),
            Cell::from(truncate(&r.description, 30)),
        ])
    });

    let filter = app
        .finance_filter
        .map(|k| k.to_string())
        .unwrap_or_else(|| "Semua".to_string());

    let title = format!(
        " Keuangan - {} | Pemasukan {} | Pengeluaran {} | Saldo {} ",
        filter,
        format_rupiah(summary.total_income),
        format_rupiah(summary.total_expense),
        format_rupiah(summary.balance),
    );

    let table = Table::new(
        rows,
        [
            Constraint::Length(12),
            Constraint::Length(13),
            Constraint::Length(24),
            Constraint::Length(18),
            Constraint::Length(32),
        ],
    )
    .header(header_row(&["Tanggal", "Jenis", "Kategori", "Jumlah", "Keterangan"]))
    .block(table_block(title))
    .highlight_style(highlight())
    .highlight_symbol("→ ");

    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let key = Style::default().fg(Color::Yellow);
    let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);

    let mut status_spans = vec![Span::styled(
        format!(" Row: {}/{} ", selected, app.row_count()),
        Style::default().fg(Color::Cyan),
    )];

    if app.search_mode {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(
            format!("Cari: {}_", app.search),
            Style::default().fg(Color::Green),
        ));
        status_spans.push(Span::raw(" ("));
        status_spans.push(Span::styled("Enter", key));
        status_spans.push(Span::raw(" done)"));
    } else {
        match app.current_page {
            Page::Members => {
                status_spans.push(Span::raw(" | "));
                status_spans.push(Span::styled("/", key));
                status_spans.push(Span::raw(" Search"));
            }
            Page::Events => {
                status_spans.push(Span::raw(" | "));
                status_spans.push(Span::styled("0-4", key));
                status_spans.push(Span::raw(" Type"));
            }
            Page::Finance => {
                status_spans.push(Span::raw(" | "));
                status_spans.push(Span::styled("0-2", key));
                status_spans.push(Span::raw(" Type"));
            }
            Page::Dashboard => {}
        }
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled("c", key));
        status_spans.push(Span::raw(" Clear | "));
        status_spans.push(Span::styled("Enter", key));
        status_spans.push(Span::raw(" Details | "));
        status_spans.push(Span::styled("Tab", key));
        status_spans.push(Span::raw(" Page | "));
        status_spans.push(Span::styled("↑/↓", key));
        status_spans.push(Span::raw(" Nav | "));
        status_spans.push(Span::styled("q", Style::default().fg(Color::Red)));
        status_spans.push(Span::raw(" Quit"));
    }

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn field(name: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!("  {}: ", name),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::raw(value),
    ])
}

fn render_detail_panel(f: &mut Frame, area: Rect, app: &App) {
    let (title, lines) = match app.current_page {
        Page::Members => (
            " Detail Jemaat ",
            app.selected_member().map(|m| {
                vec![
                    field("Nama", m.name.clone()),
                    field("Email", m.email.clone()),
                    field("Telepon", m.phone.clone()),
                    field("Alamat", wrap_text(&m.address, 35)),
                    field("Tanggal Lahir", m.birth_date.clone()),
                    field("Bergabung", m.join_date.clone()),
                    field("Gender", m.gender.to_string()),
                    field("Status", m.status.to_string()),
                    field("Baptis", if m.baptized { "Ya" } else { "Belum" }.to_string()),
                ]
            }),
        ),
        Page::Events => (
            " Detail Kegiatan ",
            app.selected_event().map(|e| {
                vec![
                    field("Nama", e.name.clone()),
                    field("Tanggal", format!("{} {}", e.date, e.time)),
                    field("Lokasi", e.location.clone()),
                    field("Jenis", e.event_type.to_string()),
                    field("Status", e.status.to_string()),
                    field("Keterangan", wrap_text(&e.description, 35)),
                ]
            }),
        ),
        Page::Finance => (
            " Detail Transaksi ",
            app.selected_finance().map(|r| {
                vec![
                    field("Tanggal", r.date.clone()),
                    field("Jenis", r.kind.to_string()),
                    field("Kategori", r.category.clone()),
                    field("Jumlah", format_rupiah(r.amount)),
                    field("Dicatat oleh", r.recorded_by.clone()),
                    field("Keterangan", wrap_text(&r.description, 35)),
                ]
            }),
        ),
        Page::Dashboard => (" Detail ", None),
    };

    let mut content = vec![Line::from("")];
    match lines {
        Some(lines) => {
            for line in lines {
                content.push(line);
                content.push(Line::from(""));
            }
        }
        None => content.push(Line::from("  Nothing selected")),
    }
    content.push(Line::from(Span::styled(
        "  Press Enter to close",
        Style::default()
            .fg(Color::DarkGray)
            .add_modifier(Modifier::ITALIC),
    )));

    let detail_panel = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(title),
    );

    f.render_widget(detail_panel, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

fn wrap_text(text: &str, width: usize) -> String {
    if text.len() <= width {
        return text.to_string();
    }

    let mut result = String::new();
    let mut current_line = String::new();

    for word in text.split_whitespace() {
        if current_line.len() + word.len() < width {
            if !current_line.is_empty() {
                current_line.push(' ');
            }
            current_line.push_str(word);
        } else {
            if !result.is_empty() {
                result.push_str("\n  ");
            }
            result.push_str(&current_line);
            current_line = word.to_string();
        }
    }

    if !current_line.is_empty() {
        if !result.is_empty() {
            result.push_str("\n  ");
        }
        result.push_str(&current_line);
    }

    result
}
