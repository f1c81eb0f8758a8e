use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState};

use ftc_forecast::config::{self, Settings};
use ftc_forecast::demo_feed::{DEMO_EVENT_CODE, SyntheticConfig};
use ftc_forecast::event_report::OprMode;
use ftc_forecast::feed::{FeedSource, spawn_provider};
use ftc_forecast::logging;
use ftc_forecast::season_rules::resolve_rules;
use ftc_forecast::state::{AppState, Delta, ProviderCommand, Screen, apply_delta};

#[derive(Parser)]
#[command(author, version, about = "Live OPR forecasts and projected standings for an FTC event")]
struct Cli {
    /// FTCScout event code, e.g. USCAFFFAQ
    event: Option<String>,
    /// Serve a synthetic event instead of FTCScout
    #[arg(long)]
    demo: bool,
    /// Rate teams by their best OPR this season instead of this event's regression
    #[arg(long)]
    season_best: bool,
}

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: mpsc::Sender<ProviderCommand>,
}

impl App {
    fn new(event_code: &str, mode: OprMode, cmd_tx: mpsc::Sender<ProviderCommand>) -> Self {
        let mut state = AppState::new(event_code);
        state.opr_mode = mode;
        Self {
            state,
            should_quit: false,
            cmd_tx,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if self.state.help_overlay {
            match key.code {
                KeyCode::Char('?') | KeyCode::Esc => self.state.help_overlay = false,
                KeyCode::Char('q') => self.should_quit = true,
                _ => {}
            }
            return;
        }
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('1') => self.state.set_screen(Screen::Standings),
            KeyCode::Char('2') => self.state.set_screen(Screen::Matches),
            KeyCode::Char('3') => self.state.set_screen(Screen::Opr),
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
            KeyCode::Char('r') | KeyCode::Char('R') => self.request_report(true),
            KeyCode::Char('m') | KeyCode::Char('M') => {
                self.state.opr_mode = self.state.opr_mode.toggle();
                self.request_report(true);
            }
            KeyCode::Char('?') => self.state.help_overlay = true,
            _ => {}
        }
    }

    fn request_report(&mut self, announce: bool) {
        let cmd = ProviderCommand::FetchEvent {
            event_code: self.state.event_code.clone(),
            mode: self.state.opr_mode,
        };
        if self.cmd_tx.send(cmd).is_err() {
            self.state.push_log("[WARN] Provider is not running");
            return;
        }
        self.state.loading = true;
        if announce {
            self.state.push_log(format!(
                "[INFO] Fetching {} ({} OPR)",
                self.state.event_code,
                self.state.opr_mode.label()
            ));
        }
    }
}

fn main() -> anyhow::Result<()> {
    config::load_dotenv();
    let cli = Cli::parse();
    let settings = Settings::from_env();
    if let Some(path) = settings.log_file.as_ref() {
        logging::init_file(path)?;
    }

    let rules = resolve_rules(settings.season, settings.rules_file.as_deref());
    let (feed, event_code) = if cli.demo {
        (FeedSource::Demo(SyntheticConfig::default()), DEMO_EVENT_CODE.to_string())
    } else {
        let Some(event) = cli.event.as_deref().map(str::trim).filter(|e| !e.is_empty()) else {
            anyhow::bail!("an event code is required (or pass --demo)");
        };
        (FeedSource::FtcScout, event.to_uppercase())
    };
    let mode = if cli.season_best {
        OprMode::SeasonBest
    } else {
        OprMode::Event
    };

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    spawn_provider(tx, cmd_rx, settings, rules, feed);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let mut app = App::new(&event_code, mode, cmd_tx);
    app.request_report(true);
    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            app.on_key(key);
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(6),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(&app.state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    if let Some(err) = app.state.last_error.as_ref()
        && app.state.report.is_none()
    {
        let msg = Paragraph::new(format!("Could not load event: {err}"))
            .style(Style::default().fg(Color::Red));
        frame.render_widget(msg, chunks[1]);
    } else {
        match app.state.screen {
            Screen::Standings => render_standings(frame, chunks[1], &app.state),
            Screen::Matches => render_matches(frame, chunks[1], &app.state),
            Screen::Opr => render_opr(frame, chunks[1], &app.state),
        }
    }

    render_console(frame, chunks[2], &app.state);

    let footer = Paragraph::new(
        "1 Standings | 2 Matches | 3 OPR | j/k/↑/↓ Move | r Refresh | m OPR mode | ? Help | q Quit",
    )
    .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[3]);

    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    let line1 = format!(
        "  FTC FORECAST | {} | {}",
        state.event_code,
        state.screen.label()
    );
    let line2 = format!("  {}", state.status_line());
    format!("{line1}\n{line2}")
}

fn selected_row_style() -> Style {
    Style::default().fg(Color::White).bg(Color::DarkGray)
}

fn header_row(cells: &[&'static str]) -> Row<'static> {
    Row::new(cells.iter().copied().map(Cell::from))
        .style(Style::default().add_modifier(Modifier::BOLD))
}

fn render_standings(frame: &mut Frame, area: Rect, state: &AppState) {
    let entries = state.standings();
    if entries.is_empty() {
        render_empty(frame, area, state);
        return;
    }

    let rows = entries.iter().map(|e| {
        let team_style = if e.includes_predictions {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default()
        };
        Row::new(vec![
            Cell::from(e.rank.to_string()),
            Cell::from(e.team.clone()).style(team_style),
            Cell::from(e.total_ranking_points.to_string()),
            Cell::from(e.matches.to_string()),
            Cell::from(format!("{:.2}", e.average_ranking_points)),
            Cell::from(format!("{:.0}%", e.win_rate)),
            Cell::from(e.median_ranking_points.to_string()),
            Cell::from(if e.includes_predictions { "proj" } else { "final" }),
        ])
    });
    let widths = [
        Constraint::Length(5),
        Constraint::Length(8),
        Constraint::Length(6),
        Constraint::Length(4),
        Constraint::Length(7),
        Constraint::Length(6),
        Constraint::Length(7),
        Constraint::Min(5),
    ];
    let table = Table::new(rows, widths)
        .header(header_row(&["#", "Team", "RP", "M", "Avg", "Win", "Median", "Basis"]))
        .highlight_style(selected_row_style());
    let mut table_state = TableState::default().with_selected(Some(state.selected));
    frame.render_stateful_widget(table, area, &mut table_state);
}

fn render_matches(frame: &mut Frame, area: Rect, state: &AppState) {
    let rows = state.match_rows();
    if rows.is_empty() {
        render_empty(frame, area, state);
        return;
    }

    let rows = rows.into_iter().map(|r| {
        let verdict = match r.correct {
            Some(true) => Cell::from("hit").style(Style::default().fg(Color::Green)),
            Some(false) => Cell::from("miss").style(Style::default().fg(Color::Red)),
            None if r.played => Cell::from("tie"),
            None => Cell::from("-").style(Style::default().fg(Color::DarkGray)),
        };
        let score_style = if r.played {
            Style::default()
        } else {
            Style::default().fg(Color::DarkGray)
        };
        Row::new(vec![
            Cell::from(r.label),
            Cell::from(r.red).style(Style::default().fg(Color::Red)),
            Cell::from(r.blue).style(Style::default().fg(Color::Blue)),
            Cell::from(r.score).style(score_style),
            Cell::from(r.pick),
            Cell::from(r.confidence),
            Cell::from(r.ranking_points),
            verdict,
        ])
    });
    let widths = [
        Constraint::Length(6),
        Constraint::Length(13),
        Constraint::Length(13),
        Constraint::Length(9),
        Constraint::Length(5),
        Constraint::Length(5),
        Constraint::Length(6),
        Constraint::Min(4),
    ];
    let table = Table::new(rows, widths)
        .header(header_row(&["Match", "Red", "Blue", "Score", "Pick", "Conf", "RP", "Call"]))
        .highlight_style(selected_row_style());
    let mut table_state = TableState::default().with_selected(Some(state.selected));
    frame.render_stateful_widget(table, area, &mut table_state);
}

fn render_opr(frame: &mut Frame, area: Rect, state: &AppState) {
    let rows = state.opr_rows();
    if rows.is_empty() {
        render_empty(frame, area, state);
        return;
    }

    let provenance = |team: &str| -> String {
        state
            .report
            .as_ref()
            .and_then(|r| r.season_best.iter().find(|b| b.team == team))
            .map(|b| b.provenance().to_string())
            .unwrap_or_default()
    };
    let table_rows = rows.iter().enumerate().map(|(i, (team, opr))| {
        Row::new(vec![
            Cell::from((i + 1).to_string()),
            Cell::from(team.clone()),
            Cell::from(format!("{opr:.1}")),
            Cell::from(provenance(team.as_str())),
        ])
    });
    let widths = [
        Constraint::Length(5),
        Constraint::Length(8),
        Constraint::Length(8),
        Constraint::Min(10),
    ];
    let table = Table::new(table_rows, widths)
        .header(header_row(&["#", "Team", "OPR", "From"]))
        .highlight_style(selected_row_style());
    let mut table_state = TableState::default().with_selected(Some(state.selected));
    frame.render_stateful_widget(table, area, &mut table_state);
}

fn render_empty(frame: &mut Frame, area: Rect, state: &AppState) {
    let text = if state.loading {
        "Loading event data..."
    } else {
        "Nothing to show for this event yet"
    };
    let empty = Paragraph::new(text).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(empty, area);
}

fn render_console(frame: &mut Frame, area: Rect, state: &AppState) {
    let visible = area.height.saturating_sub(2) as usize;
    let lines = state
        .logs
        .iter()
        .rev()
        .take(visible)
        .rev()
        .cloned()
        .collect::<Vec<_>>()
        .join("\n");
    let console = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Console"))
        .style(Style::default().fg(Color::Gray));
    frame.render_widget(console, area);
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "FTC Forecast - Help",
        "",
        "  1            Standings (projected where matches remain)",
        "  2            Matches (predictions and evaluated results)",
        "  3            OPR table",
        "  j/k or ↑/↓   Move",
        "  r            Refresh now",
        "  m            Toggle event / season-best OPR",
        "  ?            Toggle help",
        "  q            Quit",
        "",
        "Yellow teams include predicted results.",
    ]
    .join("\n");

    let help = Paragraph::new(text).block(Block::default().borders(Borders::ALL).title("Help"));
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
