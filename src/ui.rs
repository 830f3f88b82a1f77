use anyhow::Result;
use bin_checker::{
    export_to_path, pipeline, CheckOutcome, CheckReport, CheckRequest, FilterColumn, LookupResult,
    Table,
};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, List, ListItem, ListState, Paragraph, Row, Table as TableWidget, TableState},
    Frame, Terminal,
};
use std::io;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    Results,
    Filters,
    Lookup,
}

impl Page {
    pub fn next(&self) -> Self {
        match self {
            Page::Results => Page::Filters,
            Page::Filters => Page::Lookup,
            Page::Lookup => Page::Results,
        }
    }

    pub fn previous(&self) -> Self {
        match self {
            Page::Results => Page::Lookup,
            Page::Filters => Page::Results,
            Page::Lookup => Page::Filters,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Page::Results => "Filtered BIN Matches",
            Page::Filters => "Filters",
            Page::Lookup => "Lookup a BIN",
        }
    }
}

pub struct App {
    /// Uploads + filter selections + lookup text; re-run on every change
    pub request: CheckRequest,
    pub report: CheckReport,
    pub lookup_input: String,
    pub state: TableState,
    pub current_page: Page,
    pub focused_column: FilterColumn,
    pub option_state: ListState,
    pub export_path: PathBuf,
    pub status_message: Option<String>,
}

impl App {
    pub fn new(request: CheckRequest, report: CheckReport, export_path: PathBuf) -> Self {
        let mut state = TableState::default();
        if !report.filtered.is_empty() {
            state.select(Some(0));
        }

        let mut option_state = ListState::default();
        option_state.select(Some(0));

        Self {
            request,
            report,
            lookup_input: String::new(),
            state,
            current_page: Page::Results,
            focused_column: FilterColumn::Issuer,
            option_state,
            export_path,
            status_message: None,
        }
    }

    /// Re-run the whole pipeline with the current selections
    pub fn refresh(&mut self) {
        match pipeline::run(&self.request) {
            Ok(CheckOutcome::Ready(report)) => {
                self.report = *report;
                self.status_message = None;
            }
            Ok(CheckOutcome::AwaitingUploads) => {
                self.status_message = Some(pipeline::AWAITING_UPLOADS_MESSAGE.to_string());
            }
            Err(e) => self.status_message = Some(format!("Error: {}", e)),
        }

        if self.report.filtered.is_empty() {
            self.state.select(None);
        } else {
            self.state.select(Some(0));
        }
    }

    pub fn options(&self, column: FilterColumn) -> &[String] {
        self.report
            .options
            .get(&column)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    pub fn focus_next_column(&mut self) {
        self.focused_column = self.focused_column.next();
        self.option_state.select(Some(0));
    }

    pub fn focus_previous_column(&mut self) {
        self.focused_column = self.focused_column.previous();
        self.option_state.select(Some(0));
    }

    pub fn next_option(&mut self) {
        let len = self.options(self.focused_column).len();
        if len == 0 {
            return;
        }
        let i = match self.option_state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        self.option_state.select(Some(i));
    }

    pub fn previous_option(&mut self) {
        let len = self.options(self.focused_column).len();
        if len == 0 {
            return;
        }
        let i = match self.option_state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.option_state.select(Some(i));
    }

    /// Toggle the option under the cursor in the focused column
    pub fn toggle_selected_option(&mut self) {
        let column = self.focused_column;
        let value = match self
            .option_state
            .selected()
            .and_then(|i| self.options(column).get(i))
        {
            Some(v) => v.clone(),
            None => return,
        };

        self.request.filters.toggle(column, &value);
        self.refresh();
    }

    pub fn clear_filters(&mut self) {
        self.request.filters.clear();
        self.refresh();
    }

    pub fn push_lookup_char(&mut self, c: char) {
        self.lookup_input.push(c);
    }

    pub fn pop_lookup_char(&mut self) {
        self.lookup_input.pop();
    }

    pub fn submit_lookup(&mut self) {
        self.request.lookup = Some(self.lookup_input.clone());
        self.refresh();
    }

    pub fn export(&mut self) {
        self.status_message = Some(match export_to_path(&self.report.filtered, &self.export_path) {
            Ok(()) => format!(
                "Exported {} rows to {}",
                self.report.filtered_count,
                self.export_path.display()
            ),
            Err(e) => format!("Export failed: {}", e),
        });
    }

    pub fn next(&mut self) {
        let len = self.report.filtered.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(i) if i < len - 1 => i + 1,
            _ => 0,
        };
        self.state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.report.filtered.len();
        if len == 0 {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        self.state.select(Some(i));
    }

    pub fn page_down(&mut self) {
        let len = self.report.filtered.len();
        if len == 0 {
            return;
        }
        let i = self.state.selected().map(|i| (i + 20).min(len - 1)).unwrap_or(0);
        self.state.select(Some(i));
    }

    pub fn page_up(&mut self) {
        let i = self.state.selected().map(|i| i.saturating_sub(20)).unwrap_or(0);
        self.state.select(Some(i));
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

    if let Err(err) = res {
        println!("Error: {:?}", err);
    }

    Ok(())
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        let key = match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => key,
            _ => continue,
        };

        // Lookup page captures typing
        if app.current_page == Page::Lookup {
            match key.code {
                KeyCode::Esc => app.current_page = Page::Results,
                KeyCode::Tab => app.current_page = app.current_page.next(),
                KeyCode::BackTab => app.current_page = app.current_page.previous(),
                KeyCode::Enter => app.submit_lookup(),
                KeyCode::Backspace => app.pop_lookup_char(),
                KeyCode::Char(c) => app.push_lookup_char(c),
                _ => {}
            }
            continue;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
            KeyCode::Tab => app.current_page = app.current_page.next(),
            KeyCode::BackTab => app.current_page = app.current_page.previous(),
            KeyCode::Char('e') => app.export(),
            KeyCode::Char('c') => app.clear_filters(),
            _ if app.current_page == Page::Filters => match key.code {
                KeyCode::Right | KeyCode::Char('l') => app.focus_next_column(),
                KeyCode::Left | KeyCode::Char('h') => app.focus_previous_column(),
                KeyCode::Down | KeyCode::Char('j') => app.next_option(),
                KeyCode::Up | KeyCode::Char('k') => app.previous_option(),
                KeyCode::Char(' ') | KeyCode::Enter => app.toggle_selected_option(),
                _ => {}
            },
            KeyCode::Down | KeyCode::Char('j') => app.next(),
            KeyCode::Up | KeyCode::Char('k') => app.previous(),
            KeyCode::PageDown => app.page_down(),
            KeyCode::PageUp => app.page_up(),
            KeyCode::Home => app.state.select(Some(0)),
            KeyCode::End => {
                if !app.report.filtered.is_empty() {
                    app.state.select(Some(app.report.filtered.len() - 1));
                }
            }
            _ => {}
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

    match app.current_page {
        Page::Results => render_results(f, chunks[1], app),
        Page::Filters => render_filters(f, chunks[1], app),
        Page::Lookup => render_lookup(f, chunks[1], app),
    }

    render_status_bar(f, chunks[2], app);
}

fn render_header(f: &mut Frame, area: Rect, app: &App) {
    let mut tab_spans = vec![];
    for (i, page) in [Page::Results, Page::Filters, Page::Lookup].iter().enumerate() {
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
        app.report.summary.clone(),
        Style::default().fg(Color::White),
    ));

    let header = Paragraph::new(vec![Line::from(tab_spans)])
        .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(Color::Cyan)));

    f.render_widget(header, area);
}

fn table_widget<'a>(table: &'a Table, title: &'a str) -> TableWidget<'a> {
    let header_cells = table.headers.iter().map(|h| {
        Cell::from(h.as_str()).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    });

    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::DarkGray))
        .height(1);

    let rows = table.rows.iter().map(|row| {
        // Unmatched BINs have no issuer
        let matched = row.iter().skip(1).any(|c| c.is_some());
        let style = if matched {
            Style::default()
        } else {
            Style::default().fg(Color::DarkGray)
        };

        let cells = row
            .iter()
            .map(|c| Cell::from(truncate(c.as_deref().unwrap_or(""), 24)));
        Row::new(cells).style(style).height(1)
    });

    let widths: Vec<Constraint> = table.headers.iter().map(|_| Constraint::Min(8)).collect();

    TableWidget::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(title),
        )
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("→ ")
}

fn render_results(f: &mut Frame, area: Rect, app: &mut App) {
    let table = table_widget(&app.report.filtered, " Filtered BIN Matches ");
    f.render_stateful_widget(table, area, &mut app.state);
}

fn render_filters(f: &mut Frame, area: Rect, app: &mut App) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(area);

    for (i, column) in FilterColumn::ALL.into_iter().enumerate() {
        let items: Vec<ListItem> = app
            .options(column)
            .iter()
            .map(|value| {
                let selected = app.request.filters.is_selected(column, value);
                let mark = if selected { "[x] " } else { "[ ] " };
                let style = if selected {
                    Style::default().fg(Color::Green)
                } else {
                    Style::default()
                };
                ListItem::new(format!("{}{}", mark, truncate(value, 28))).style(style)
            })
            .collect();

        let focused = column == app.focused_column;
        let border = if focused { Color::Yellow } else { Color::White };

        let list = List::new(items)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(border))
                    .title(format!(" {} ", column.label())),
            )
            .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD));

        if focused {
            f.render_stateful_widget(list, columns[i], &mut app.option_state);
        } else {
            f.render_widget(list, columns[i]);
        }
    }
}

fn render_lookup(f: &mut Frame, area: Rect, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Input
            Constraint::Length(3), // Result message
            Constraint::Min(0),    // Matching rows
        ])
        .split(area);

    let input = Paragraph::new(app.lookup_input.as_str()).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow))
            .title(" Enter a BIN to search (first 6 digits) "),
    );
    f.render_widget(input, chunks[0]);

    let message = match &app.report.lookup {
        Some(result @ LookupResult::Found { .. }) => {
            Span::styled(result.message(), Style::default().fg(Color::Green))
        }
        Some(result @ LookupResult::NotFound { .. }) => {
            Span::styled(result.message(), Style::default().fg(Color::Yellow))
        }
        None => Span::styled(
            "Press Enter to search",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ),
    };
    f.render_widget(
        Paragraph::new(Line::from(message)).block(Block::default().borders(Borders::ALL)),
        chunks[1],
    );

    if let Some(rows) = app.report.lookup.as_ref().and_then(|l| l.rows()) {
        f.render_widget(table_widget(rows, " Matching Rows "), chunks[2]);
    }
}

fn render_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let selected = app.state.selected().map(|i| i + 1).unwrap_or(0);

    let mut status_spans = vec![Span::styled(
        format!(" Row: {}/{} ", selected, app.report.filtered_count),
        Style::default().fg(Color::Cyan),
    )];

    if let Some(message) = &app.status_message {
        status_spans.push(Span::raw(" | "));
        status_spans.push(Span::styled(message.clone(), Style::default().fg(Color::Green)));
    }

    let hints: &[(&str, &str)] = match app.current_page {
        Page::Lookup => &[("Enter", " Search | "), ("Esc", " Back")],
        Page::Filters => &[("←/→", " Column | "), ("Space", " Toggle | "), ("c", " Clear | "), ("q", " Quit")],
        Page::Results => &[("e", " Export | "), ("c", " Clear | "), ("↑/↓", " Nav | "), ("q", " Quit")],
    };

    status_spans.push(Span::raw(" | "));
    status_spans.push(Span::styled("Tab", Style::default().fg(Color::Yellow)));
    status_spans.push(Span::raw(" Page | "));
    for (key, text) in hints {
        status_spans.push(Span::styled(*key, Style::default().fg(Color::Yellow)));
        status_spans.push(Span::raw(*text));
    }

    let status_bar = Paragraph::new(vec![Line::from(status_spans)]).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::White)),
    );

    f.render_widget(status_bar, area);
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bin_checker::UploadSource;

    const REFERENCE: &str = "BIN,Issuer,Brand,Type,CountryName\n\
                             411111,BankA,Visa,Credit,US\n\
                             522222,BankB,Mastercard,Debit,CA\n";
    const CHECK_LIST: &str = "BIN\n41111199\n52222200\n";

    fn app() -> App {
        let request = CheckRequest::new(
            Some(UploadSource::Bytes(REFERENCE.as_bytes().to_vec())),
            Some(UploadSource::Bytes(CHECK_LIST.as_bytes().to_vec())),
        );
        let report = match pipeline::run(&request).unwrap() {
            CheckOutcome::Ready(report) => *report,
            CheckOutcome::AwaitingUploads => panic!("expected a report"),
        };
        App::new(request, report, PathBuf::from("filtered_bins.csv"))
    }

    #[test]
    fn test_toggle_option_reruns_pipeline() {
        let mut app = app();
        assert_eq!(app.report.summary, "Showing 2 out of 2 BINs");

        // Issuer options are [BankA, BankB]; cursor starts on BankA
        app.toggle_selected_option();
        assert_eq!(app.report.summary, "Showing 1 out of 2 BINs");
        assert!(app.request.filters.is_selected(FilterColumn::Issuer, "BankA"));

        app.toggle_selected_option();
        assert_eq!(app.report.filtered_count, 2);
    }

    #[test]
    fn test_option_cursor_wraps() {
        let mut app = app();
        app.previous_option();
        assert_eq!(app.option_state.selected(), Some(1));
        app.next_option();
        assert_eq!(app.option_state.selected(), Some(0));
    }

    #[test]
    fn test_lookup_input_flow() {
        let mut app = app();
        for c in " 5222229".chars() {
            app.push_lookup_char(c);
        }
        app.pop_lookup_char();
        app.submit_lookup();

        let lookup = app.report.lookup.as_ref().unwrap();
        assert!(lookup.is_found());
        assert_eq!(lookup.query(), "522222");
    }

    #[test]
    fn test_clear_filters_restores_full_table() {
        let mut app = app();
        app.focus_next_column();
        app.toggle_selected_option();
        assert_eq!(app.report.filtered_count, 1);

        app.clear_filters();
        assert_eq!(app.report.filtered_count, 2);
        assert_eq!(app.state.selected(), Some(0));
    }

    #[test]
    fn test_export_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut app = app();
        app.export_path = dir.path().join("filtered_bins.csv");

        app.export();
        assert!(app.status_message.as_ref().unwrap().starts_with("Exported 2 rows"));
        assert!(app.export_path.exists());
    }

    #[test]
    fn test_truncate_is_char_safe() {
        assert_eq!(truncate("Banco de Crédito", 10), "Banco d...");
        assert_eq!(truncate("Visa", 10), "Visa");
    }
}
