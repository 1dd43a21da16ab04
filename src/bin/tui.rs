use std::{fs::File, io::Stdout, sync::Mutex};

use anyhow::Result;
use crossterm::{event::{self, Event, KeyCode, KeyEventKind}, execute, terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen}};
use ratatui::{backend::CrosstermBackend, Terminal, Frame, widgets::{Block, Borders, Clear, List, ListItem, Paragraph, ListState, Wrap}, layout::{Layout, Constraint, Direction, Rect}, style::{Style, Modifier, Color}};
use tracing_subscriber::EnvFilter;

use todo_client::{application::todo_list::{ConfirmPrompt, TodoListClient}, config::{ApiConfig, LogConfig}, domain::todo::TodoId, infrastructure::http_repo::HttpTodoRepository};

type Term = Terminal<CrosstermBackend<Stdout>>;

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let log = LogConfig::from_env();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_ansi(false)
        .with_writer(Mutex::new(File::create(&log.file)?))
        .init();

    let config = ApiConfig::from_env();
    tracing::info!(endpoint = %config.collection_url(), "starting");
    let client = TodoListClient::new(HttpTodoRepository::new(config));

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, client).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

struct App {
    client: TodoListClient<HttpTodoRepository>,
    selected: usize,
    list_state: ListState,
    input_focused: bool,
}

impl App {
    fn clamp_selection(&mut self) {
        let len = self.client.state().items.len();
        if len == 0 { self.selected = 0; self.list_state.select(None); }
        else { if self.selected >= len { self.selected = len - 1; } self.list_state.select(Some(self.selected)); }
    }
}

/// Draws a y/n popup and blocks on the keyboard until it is answered.
struct TerminalPrompt<'a> {
    terminal: &'a mut Term,
    subject: String,
}

impl ConfirmPrompt for TerminalPrompt<'_> {
    fn confirm(&mut self, question: &str) -> bool {
        let text = format!("{question}\n\n{}\n\n(y) yes   (n) no", self.subject);
        let drawn = self.terminal.draw(|f| {
            let area = centered(f.size(), 50, 7);
            f.render_widget(Clear, area);
            f.render_widget(Paragraph::new(text.as_str()).wrap(Wrap { trim: true }).block(Block::default().borders(Borders::ALL).title("confirm")), area);
        });
        if drawn.is_err() { return false; }
        loop {
            match event::read() {
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => match key.code {
                    KeyCode::Char('y') | KeyCode::Char('Y') => return true,
                    KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => return false,
                    _ => {}
                },
                Ok(_) => {}
                Err(e) => { tracing::error!(error = %e, "failed to read confirmation key"); return false; }
            }
        }
    }
}

async fn run_app(terminal: &mut Term, client: TodoListClient<HttpTodoRepository>) -> Result<()> {
    let endpoint = client.repository().endpoint();
    let mut app = App { client, selected: 0, list_state: ListState::default(), input_focused: false };
    reload(terminal, &mut app, &endpoint).await?;

    loop {
        terminal.draw(|f| draw(f, &mut app, &endpoint))?;

        let Event::Key(key) = event::read()? else { continue };
        // Only act on key presses; ignore repeats and releases to prevent duplicate input
        if key.kind != KeyEventKind::Press { continue; }

        if app.client.state().editing.is_some() {
            match key.code {
                KeyCode::Esc => app.client.cancel_edit(),
                KeyCode::Enter => { let _ = app.client.save_edit().await; }
                KeyCode::Backspace => { if let Some(text) = app.client.edit_text_mut() { text.pop(); } }
                KeyCode::Char(c) => { if let Some(text) = app.client.edit_text_mut() { text.push(c); } }
                _ => {}
            }
        } else if app.input_focused {
            match key.code {
                KeyCode::Esc => app.input_focused = false,
                KeyCode::Enter => {
                    if app.client.submit_draft().await.is_ok() { app.input_focused = false; }
                }
                KeyCode::Backspace => { app.client.draft_mut().pop(); }
                KeyCode::Char(c) => app.client.draft_mut().push(c),
                _ => {}
            }
        } else {
            match key.code {
                KeyCode::Char('q') => break,
                KeyCode::Up => { if app.selected > 0 { app.selected -= 1; } }
                KeyCode::Down => { let len = app.client.state().items.len(); if app.selected + 1 < len { app.selected += 1; } }
                KeyCode::Enter | KeyCode::Char(' ') => { let _ = app.client.toggle_complete(app.selected).await; }
                KeyCode::Char('a') => app.input_focused = true,
                KeyCode::Char('e') => app.client.begin_edit(app.selected),
                KeyCode::Char('d') => {
                    let subject = app.client.state().items.get(app.selected).map(|item| item.title.clone()).unwrap_or_default();
                    let mut prompt = TerminalPrompt { terminal: &mut *terminal, subject };
                    let _ = app.client.remove_row(app.selected, &mut prompt).await;
                }
                KeyCode::Char('r') => reload(terminal, &mut app, &endpoint).await?,
                _ => {}
            }
        }
        app.clamp_selection();
    }
    Ok(())
}

/// Shows the loading frame, then re-reads the list. Failures are rendered
/// from the list state.
async fn reload(terminal: &mut Term, app: &mut App, endpoint: &str) -> Result<()> {
    let pending = app.client.start_fetch();
    terminal.draw(|f| draw(f, app, endpoint))?;
    let result = pending.await;
    let _ = app.client.finish_fetch(result);
    app.clamp_selection();
    Ok(())
}

fn draw(f: &mut Frame, app: &mut App, endpoint: &str) {
    let state = app.client.state();
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(3),
        ])
        .split(f.size());

    let header = match &state.error {
        Some(message) => Paragraph::new(format!("Error: {message}  (r: retry)")).style(Style::default().fg(Color::Red)),
        None => Paragraph::new("a: add, Enter/Space: toggle, e: edit, d: delete, r: reload, q: quit"),
    };
    f.render_widget(header.block(Block::default().borders(Borders::ALL).title("todo-tui")), chunks[0]);

    let input_style = if app.input_focused { Style::default().fg(Color::Yellow) } else { Style::default() };
    let cursor = if app.input_focused { "_" } else { "" };
    let input = Paragraph::new(format!("{}{}", state.draft, cursor))
        .style(input_style)
        .block(Block::default().borders(Borders::ALL).title("new todo (a to type, Enter to add, Esc to leave)"));
    f.render_widget(input, chunks[1]);

    let list_block = Block::default().borders(Borders::ALL).title(format!("todos [{}]", state.items.len()));
    if state.loading {
        f.render_widget(Paragraph::new("Loading...").block(list_block), chunks[2]);
    } else if state.is_empty_view() {
        f.render_widget(Paragraph::new("No todos yet.").block(list_block), chunks[2]);
    } else {
        let editing = state.editing.as_ref();
        let list_items: Vec<ListItem> = state.items.iter().enumerate().map(|(row, item)| {
            if state.is_editing(row) {
                let text = editing.map(|session| session.text.as_str()).unwrap_or_default();
                return ListItem::new(format!("[edit] {text}_")).style(Style::default().fg(Color::Yellow));
            }
            let mark = if item.completed { "[x]" } else { "[ ]" };
            let orphan = if item.id == TodoId::Unidentified { "  (no id)" } else { "" };
            let style = if item.completed { Style::default().add_modifier(Modifier::CROSSED_OUT) } else { Style::default() };
            ListItem::new(format!("{mark} {}{orphan}", item.title)).style(style)
        }).collect();
        let list = List::new(list_items)
            .block(list_block)
            .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD | Modifier::REVERSED))
            .highlight_symbol(">> ");
        f.render_stateful_widget(list, chunks[2], &mut app.list_state);
    }

    let footer_text = match (&state.editing, app.input_focused) {
        (Some(_), _) => "Edit: type, Enter to save, Esc to cancel".to_string(),
        (None, true) => "Add: type, Enter to submit, Esc to leave the input".to_string(),
        (None, false) => format!("endpoint={endpoint}"),
    };
    f.render_widget(Paragraph::new(footer_text).block(Block::default().borders(Borders::ALL).title("info")), chunks[3]);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect { x: area.x + (area.width - width) / 2, y: area.y + (area.height - height) / 2, width, height }
}
