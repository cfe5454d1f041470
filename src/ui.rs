use crate::client::AgentClient;
use crate::protocol::{AgentRequest, ModelProvider};
use crossterm::cursor::MoveTo;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, size};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Paragraph, Widget, Wrap};
use ratatui::{Frame, Terminal, TerminalOptions, Viewport};
use std::io;
use std::io::Write;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

type TuiTerminal = Terminal<CrosstermBackend<io::Stdout>>;

const SETTINGS_HEIGHT: u16 = 5;
const PROMPT_HEIGHT: u16 = 4;
const QUERY_HEIGHT: u16 = 6;
const VIEWPORT_HEIGHT: u16 = SETTINGS_HEIGHT + PROMPT_HEIGHT + QUERY_HEIGHT;

// Restores terminal settings even if the loop exits early.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Self {
        Self
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = io::stdout().flush();
    }
}

#[derive(Debug, Clone)]
enum LogEntry {
    Query { text: String, settings: String },
    Reply(String),
    Failure(String),
}

#[derive(Debug, Clone)]
struct LineSpec {
    text: String,
    style: Style,
}

impl LineSpec {
    fn new(text: impl Into<String>, style: Style) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

impl LogEntry {
    fn line_specs(&self) -> Vec<LineSpec> {
        match self {
            LogEntry::Query { text, settings } => {
                let header_style = Style::default()
                    .fg(Color::Blue)
                    .add_modifier(Modifier::BOLD);
                let body_style = Style::default().fg(Color::Blue);
                let mut lines = vec![LineSpec::new(format!("You ({}):", settings), header_style)];
                for line in text.lines() {
                    lines.push(LineSpec::new(format!("  {}", line), body_style));
                }
                lines
            }
            LogEntry::Reply(text) => {
                let header_style = Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD);
                let mut lines = vec![LineSpec::new("✅ Agent Response", header_style)];
                for line in text.lines() {
                    lines.push(LineSpec::new(format!("  {}", line), Style::default()));
                }
                lines
            }
            LogEntry::Failure(text) => {
                let style = Style::default().fg(Color::Red);
                text.lines()
                    .map(|line| LineSpec::new(line.to_string(), style))
                    .collect()
            }
        }
    }

    /// The entry followed by a blank spacer line, wrapped as it is drawn.
    fn paragraph(&self) -> Paragraph<'static> {
        let mut lines = self
            .line_specs()
            .into_iter()
            .map(|spec| Line::from(Span::styled(spec.text, spec.style)))
            .collect::<Vec<_>>();
        lines.push(Line::default());
        Paragraph::new(Text::from(lines)).wrap(Wrap { trim: false })
    }

    /// Rows needed to draw `paragraph()` at `width` terminal columns.
    fn rendered_height(&self, width: u16) -> u16 {
        let rows = self.paragraph().line_count(width.max(1));
        u16::try_from(rows).unwrap_or(u16::MAX)
    }
}

#[derive(Debug)]
enum UiEvent {
    Reply(String),
    Failure(String),
}

/// Multi-line text field; the cursor column counts chars, not bytes.
struct InputBuffer {
    lines: Vec<String>,
    cursor_x: usize,
    cursor_y: usize,
    placeholder: &'static str,
}

impl InputBuffer {
    fn new(placeholder: &'static str) -> Self {
        Self {
            lines: vec![String::new()],
            cursor_x: 0,
            cursor_y: 0,
            placeholder,
        }
    }

    fn clear(&mut self) {
        self.lines = vec![String::new()];
        self.cursor_x = 0;
        self.cursor_y = 0;
    }

    fn line_len(&self, y: usize) -> usize {
        self.lines[y].chars().count()
    }

    fn byte_index(line: &str, x: usize) -> usize {
        line.char_indices()
            .nth(x)
            .map(|(idx, _)| idx)
            .unwrap_or(line.len())
    }

    fn insert_char(&mut self, c: char) {
        let line = &mut self.lines[self.cursor_y];
        let idx = Self::byte_index(line, self.cursor_x);
        line.insert(idx, c);
        self.cursor_x += 1;
    }

    fn delete_char(&mut self) {
        if self.cursor_x > 0 {
            let line = &mut self.lines[self.cursor_y];
            let idx = Self::byte_index(line, self.cursor_x - 1);
            line.remove(idx);
            self.cursor_x -= 1;
        } else if self.cursor_y > 0 {
            let removed = self.lines.remove(self.cursor_y);
            self.cursor_y -= 1;
            self.cursor_x = self.line_len(self.cursor_y);
            self.lines[self.cursor_y].push_str(&removed);
        }
    }

    fn new_line(&mut self) {
        let line = &self.lines[self.cursor_y];
        let idx = Self::byte_index(line, self.cursor_x);
        let remaining = line[idx..].to_string();
        self.lines[self.cursor_y].truncate(idx);
        self.lines.insert(self.cursor_y + 1, remaining);
        self.cursor_y += 1;
        self.cursor_x = 0;
    }

    fn move_left(&mut self) {
        if self.cursor_x > 0 {
            self.cursor_x -= 1;
        } else if self.cursor_y > 0 {
            self.cursor_y -= 1;
            self.cursor_x = self.line_len(self.cursor_y);
        }
    }

    fn move_right(&mut self) {
        if self.cursor_x < self.line_len(self.cursor_y) {
            self.cursor_x += 1;
        } else if self.cursor_y < self.lines.len() - 1 {
            self.cursor_y += 1;
            self.cursor_x = 0;
        }
    }

    fn move_up(&mut self) {
        if self.cursor_y > 0 {
            self.cursor_y -= 1;
            self.cursor_x = self.cursor_x.min(self.line_len(self.cursor_y));
        }
    }

    fn move_down(&mut self) {
        if self.cursor_y < self.lines.len() - 1 {
            self.cursor_y += 1;
            self.cursor_x = self.cursor_x.min(self.line_len(self.cursor_y));
        }
    }

    fn text(&self) -> String {
        self.lines.join("\n")
    }

    fn is_empty(&self) -> bool {
        self.lines.iter().all(|l| l.is_empty())
    }

    fn edit(&mut self, key: &KeyEvent) {
        match key.code {
            KeyCode::Char(c) => self.insert_char(c),
            KeyCode::Backspace => self.delete_char(),
            KeyCode::Left => self.move_left(),
            KeyCode::Right => self.move_right(),
            KeyCode::Up => self.move_up(),
            KeyCode::Down => self.move_down(),
            KeyCode::Home => self.cursor_x = 0,
            KeyCode::End => self.cursor_x = self.line_len(self.cursor_y),
            _ => {}
        }
    }

    fn render(&self) -> Text<'static> {
        if self.is_empty() {
            return Text::from(Span::styled(
                self.placeholder,
                Style::default().fg(Color::DarkGray),
            ));
        }
        Text::from(
            self.lines
                .iter()
                .map(|l| Line::from(l.clone()))
                .collect::<Vec<_>>(),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    SystemPrompt,
    Provider,
    Model,
    Search,
    Query,
}

impl Field {
    const ORDER: [Field; 5] = [
        Field::SystemPrompt,
        Field::Provider,
        Field::Model,
        Field::Search,
        Field::Query,
    ];

    fn step(self, forward: bool) -> Field {
        let idx = Self::ORDER.iter().position(|f| *f == self).unwrap_or(0);
        let len = Self::ORDER.len();
        let next = if forward {
            (idx + 1) % len
        } else {
            (idx + len - 1) % len
        };
        Self::ORDER[next]
    }
}

#[derive(Debug, PartialEq, Eq)]
enum FormAction {
    None,
    Submit,
    Quit,
}

/// Agent settings and query, as edited in the form.
struct FormState {
    provider: ModelProvider,
    model_index: usize,
    allow_search: bool,
    system_prompt: InputBuffer,
    query: InputBuffer,
    focus: Field,
}

impl FormState {
    fn new() -> Self {
        Self {
            provider: ModelProvider::Groq,
            model_index: 0,
            allow_search: false,
            system_prompt: InputBuffer::new("Type your system prompt here..."),
            query: InputBuffer::new("Ask me anything!"),
            focus: Field::Query,
        }
    }

    fn selected_model(&self) -> &'static str {
        let models = self.provider.models();
        models[self.model_index.min(models.len() - 1)]
    }

    fn cycle_provider(&mut self) {
        self.provider = match self.provider {
            ModelProvider::Groq => ModelProvider::OpenAi,
            ModelProvider::OpenAi => ModelProvider::Groq,
        };
        self.model_index = 0;
    }

    fn cycle_model(&mut self, forward: bool) {
        let len = self.provider.models().len();
        self.model_index = if forward {
            (self.model_index + 1) % len
        } else {
            (self.model_index + len - 1) % len
        };
    }

    fn settings_summary(&self) -> String {
        let search = if self.allow_search {
            ", web search"
        } else {
            ""
        };
        format!("{} · {}{}", self.provider, self.selected_model(), search)
    }

    /// Builds the request for the current form, or `None` for a blank query.
    fn to_request(&self) -> Option<AgentRequest> {
        let query = self.query.text();
        if query.trim().is_empty() {
            return None;
        }

        Some(AgentRequest {
            model_name: self.selected_model().to_string(),
            model_provider: self.provider,
            system_prompt: self.system_prompt.text(),
            messages: vec![query],
            allow_search: self.allow_search,
        })
    }

    fn handle_key(&mut self, key: KeyEvent) -> FormAction {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            return FormAction::Quit;
        }

        match key.code {
            KeyCode::Esc => return FormAction::Quit,
            KeyCode::Tab => {
                self.focus = self.focus.step(true);
                return FormAction::None;
            }
            KeyCode::BackTab => {
                self.focus = self.focus.step(false);
                return FormAction::None;
            }
            _ => {}
        }

        match self.focus {
            Field::SystemPrompt => {
                if key.code == KeyCode::Enter {
                    self.system_prompt.new_line();
                } else {
                    self.system_prompt.edit(&key);
                }
            }
            Field::Query => {
                if key.code == KeyCode::Enter {
                    if key.modifiers.contains(KeyModifiers::SHIFT) {
                        self.query.new_line();
                    } else {
                        return FormAction::Submit;
                    }
                } else {
                    self.query.edit(&key);
                }
            }
            Field::Provider => {
                if matches!(
                    key.code,
                    KeyCode::Left | KeyCode::Right | KeyCode::Char(' ')
                ) {
                    self.cycle_provider();
                }
            }
            Field::Model => match key.code {
                KeyCode::Left => self.cycle_model(false),
                KeyCode::Right | KeyCode::Char(' ') => self.cycle_model(true),
                _ => {}
            },
            Field::Search => {
                if matches!(
                    key.code,
                    KeyCode::Left | KeyCode::Right | KeyCode::Char(' ') | KeyCode::Enter
                ) {
                    self.allow_search = !self.allow_search;
                }
            }
        }

        FormAction::None
    }

    fn setting_line(&self, field: Field, label: &str, value: String) -> Line<'static> {
        let focused = self.focus == field;
        let marker = if focused { "› " } else { "  " };
        let style = if focused {
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        Line::from(vec![
            Span::styled(format!("{}{:<12}", marker, label), style),
            Span::styled(value, style),
        ])
    }

    fn settings_text(&self) -> Text<'static> {
        let providers = ModelProvider::ALL
            .iter()
            .map(|p| {
                let mark = if *p == self.provider { "(•)" } else { "( )" };
                format!("{} {}", mark, p)
            })
            .collect::<Vec<_>>()
            .join("  ");
        let search = if self.allow_search { "[x]" } else { "[ ]" };

        Text::from(vec![
            self.setting_line(Field::Provider, "Provider:", providers),
            self.setting_line(
                Field::Model,
                "Model:",
                format!("‹ {} ›", self.selected_model()),
            ),
            self.setting_line(Field::Search, "Web search:", search.to_string()),
        ])
    }
}

struct App {
    form: FormState,
    should_quit: bool,
    sender: mpsc::Sender<UiEvent>,
    receiver: mpsc::Receiver<UiEvent>,
    is_loading: bool,
    in_flight: Option<JoinHandle<()>>,
    client: AgentClient,
}

impl App {
    fn new(client: AgentClient) -> Self {
        let (sender, receiver) = mpsc::channel(16);

        Self {
            form: FormState::new(),
            should_quit: false,
            sender,
            receiver,
            is_loading: false,
            in_flight: None,
            client,
        }
    }

    fn border_style(&self, field: Field) -> Style {
        if self.form.focus == field {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::DarkGray)
        }
    }

    fn draw(&mut self, f: &mut Frame) {
        let [settings_area, prompt_area, query_area] = Layout::vertical([
            Constraint::Length(SETTINGS_HEIGHT),
            Constraint::Length(PROMPT_HEIGHT),
            Constraint::Min(3),
        ])
        .areas(f.area());

        let settings = Paragraph::new(self.form.settings_text()).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" ⚙️ Agent Settings ({}) ", self.client.backend_url()))
                .border_style(Style::default().fg(Color::DarkGray)),
        );
        f.render_widget(settings, settings_area);

        let prompt = Paragraph::new(self.form.system_prompt.render())
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(" 📝 System Prompt ")
                    .border_style(self.border_style(Field::SystemPrompt)),
            )
            .wrap(Wrap { trim: false });
        f.render_widget(prompt, prompt_area);

        let title = if self.is_loading {
            " 💬 Ask Your AI Agent (Enter to send, Tab to switch, Esc to quit) [🤔 Thinking...] "
        } else {
            " 💬 Ask Your AI Agent (Enter to send, Tab to switch, Esc to quit) "
        };
        let query = Paragraph::new(self.form.query.render())
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(title)
                    .border_style(self.border_style(Field::Query)),
            )
            .wrap(Wrap { trim: false });
        f.render_widget(query, query_area);

        let focused = match self.form.focus {
            Field::SystemPrompt => Some((&self.form.system_prompt, prompt_area)),
            Field::Query => Some((&self.form.query, query_area)),
            _ => None,
        };
        if let Some((input, area)) = focused {
            f.set_cursor_position(cursor_position(input, area));
        }
    }

    fn append_entry(
        &mut self,
        terminal: &mut TuiTerminal,
        entry: LogEntry,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let width = terminal.size()?.width;
        let height = entry.rendered_height(width);
        let paragraph = entry.paragraph();
        // Insert above the inline viewport so the log stays in scrollback.
        terminal.insert_before(height, |buf| {
            paragraph.render(buf.area, buf);
        })?;
        Ok(())
    }

    /// Takes the form's request unless one is already in flight or the
    /// query is blank. Marks the form as loading and clears the query.
    fn begin_request(&mut self) -> Option<(AgentRequest, LogEntry)> {
        if self.is_loading {
            return None;
        }
        let request = self.form.to_request()?;
        let entry = LogEntry::Query {
            text: self.form.query.text(),
            settings: self.form.settings_summary(),
        };
        self.form.query.clear();
        self.is_loading = true;
        Some((request, entry))
    }

    fn submit(
        &mut self,
        terminal: &mut TuiTerminal,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let Some((request, entry)) = self.begin_request() else {
            return Ok(());
        };
        self.append_entry(terminal, entry)?;

        let client = self.client.clone();
        let sender = self.sender.clone();
        self.in_flight = Some(tokio::spawn(async move {
            let event = match client.ask(&request).await {
                Ok(text) => UiEvent::Reply(text),
                Err(err) => UiEvent::Failure(err.to_string()),
            };
            let _ = sender.send(event).await;
        }));

        Ok(())
    }

    /// Collects the outcome of the in-flight request, if it has one.
    ///
    /// A task that finished without sending (it panicked) is reported as a
    /// failure so the form does not stay busy.
    fn poll_request(&mut self) -> Option<LogEntry> {
        let finished = self
            .in_flight
            .as_ref()
            .is_some_and(|handle| handle.is_finished());

        let entry = match self.receiver.try_recv() {
            Ok(UiEvent::Reply(text)) => LogEntry::Reply(text),
            Ok(UiEvent::Failure(text)) => LogEntry::Failure(text),
            Err(_) if finished => {
                LogEntry::Failure("Request failed: request task ended without a reply".to_string())
            }
            Err(_) => return None,
        };

        self.in_flight = None;
        self.is_loading = false;
        Some(entry)
    }

    fn handle_events(
        &mut self,
        terminal: &mut TuiTerminal,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        if let Some(entry) = self.poll_request() {
            self.append_entry(terminal, entry)?;
        }

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if key.kind != KeyEventKind::Press {
                    return Ok(true);
                }
                match self.form.handle_key(key) {
                    FormAction::Quit => {
                        self.should_quit = true;
                        return Ok(false);
                    }
                    FormAction::Submit => self.submit(terminal)?,
                    FormAction::None => {}
                }
            }
        }

        Ok(true)
    }
}

fn cursor_position(input: &InputBuffer, area: Rect) -> (u16, u16) {
    let x = area.x + 1 + input.cursor_x as u16;
    let y = area.y + 1 + input.cursor_y as u16;
    (
        x.min(area.x + area.width.saturating_sub(2)),
        y.min(area.y + area.height.saturating_sub(2)),
    )
}

pub fn run_tui(client: AgentClient) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    let (_, rows) = size()?;
    if rows > 0 {
        // Push existing screen content into scrollback without clearing it.
        for _ in 0..rows {
            writeln!(stdout)?;
        }
        stdout.flush()?;
    }
    execute!(stdout, MoveTo(0, 0))?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::with_options(
        backend,
        TerminalOptions {
            viewport: Viewport::Inline(VIEWPORT_HEIGHT),
        },
    )?;

    let mut app = App::new(client);

    let _guard = TerminalGuard::new();

    terminal.draw(|f| app.draw(f))?;

    while !app.should_quit {
        if !app.handle_events(&mut terminal)? {
            break;
        }

        terminal.draw(|f| app.draw(f))?;

        std::thread::sleep(Duration::from_millis(10));
    }

    disable_raw_mode()?;
    let mut stdout = io::stdout();
    stdout.flush()?;

    Ok(())
}
