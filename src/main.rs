use std::io;
use std::time::{Duration, Instant};

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
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, Borders, Clear, Paragraph};

use league_sim::config::LeagueConfig;
use league_sim::dashboard::{Action, Dashboard};
use league_sim::predict::MatchPrediction;
use league_sim::season::{Season, open_season};
use league_sim::store::SqliteStore;

struct App {
    season: Season<SqliteStore>,
    dash: Dashboard,
    should_quit: bool,
}

impl App {
    fn new(season: Season<SqliteStore>) -> Self {
        let mut dash = Dashboard::new(season.settings().season_weeks);
        dash.refresh(&season);
        dash.push_log("[INFO] league loaded");
        Self {
            season,
            dash,
            should_quit: false,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        let action = match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
                None
            }
            KeyCode::Char('n') | KeyCode::Char('N') => Some(Action::SimulateNext),
            KeyCode::Char('a') | KeyCode::Char('A') => {
                if self.dash.is_finished() {
                    self.dash.push_log("[INFO] season already complete");
                    None
                } else {
                    Some(Action::SimulateAll)
                }
            }
            KeyCode::Char('r') | KeyCode::Char('R') => Some(Action::Reset),
            KeyCode::Char('+') | KeyCode::Char('=') => Some(Action::AdjustHome(1)),
            KeyCode::Char('-') => Some(Action::AdjustHome(-1)),
            KeyCode::Char(']') => Some(Action::AdjustAway(1)),
            KeyCode::Char('[') => Some(Action::AdjustAway(-1)),
            KeyCode::Char('j') | KeyCode::Down => {
                self.dash.select_next();
                None
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.dash.select_prev();
                None
            }
            KeyCode::Char('?') => {
                self.dash.help_overlay = !self.dash.help_overlay;
                None
            }
            _ => None,
        };
        if let Some(action) = action {
            self.dash.apply(&mut self.season, action);
        }
    }
}

fn main() -> io::Result<()> {
    // Log output would draw over the alternate screen, so it stays off
    // unless RUST_LOG asks for it.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("off"))
        .format_timestamp(None)
        .init();

    let config = LeagueConfig::from_env();
    let season = match open_season(&config) {
        Ok(season) => season,
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    };

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let mut app = App::new(season);
    let res = run_app(&mut terminal, &mut app);

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

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        terminal.draw(|f| ui(f, &app.dash))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, dash: &Dashboard) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(5),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(dash))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);

    let left = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(8), Constraint::Length(8)])
        .split(columns[0]);
    let table = Paragraph::new(standings_text(dash))
        .block(Block::default().title("League Table").borders(Borders::ALL));
    frame.render_widget(table, left[0]);
    render_results(frame, left[1], dash);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(8), Constraint::Min(4)])
        .split(columns[1]);
    let champ = Paragraph::new(championship_text(dash))
        .block(Block::default().title("Championship Odds").borders(Borders::ALL));
    frame.render_widget(champ, right[0]);
    render_next_week(frame, right[1], dash);

    let console = Paragraph::new(console_text(dash))
        .block(Block::default().title("Console").borders(Borders::TOP));
    frame.render_widget(console, chunks[2]);

    let footer = Paragraph::new(footer_text(dash)).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[3]);

    if dash.help_overlay {
        let area = frame.size();
        render_help_overlay(frame, area);
    }
}

fn header_text(dash: &Dashboard) -> String {
    let status = match (&dash.champion, dash.is_finished()) {
        (Some(name), true) => format!("Champion: {name}"),
        _ => format!("Week {} of {}", dash.current_week, dash.season_weeks),
    };
    format!("  LEAGUE SIM | {status}\n")
}

fn footer_text(dash: &Dashboard) -> String {
    if dash.is_finished() {
        "r Reset | j/k Select | +/- Home | ]/[ Away | ? Help | q Quit".to_string()
    } else {
        "n Next week | a Play all | r Reset | j/k Select | +/- Home | ]/[ Away | ? Help | q Quit"
            .to_string()
    }
}

fn standings_text(dash: &Dashboard) -> String {
    if dash.standings.is_empty() {
        return "No teams".to_string();
    }
    let mut lines = vec![format!(
        "{:<3}{:<18}{:>3}{:>3}{:>3}{:>3}{:>5}{:>5}",
        "#", "Team", "P", "W", "D", "L", "GD", "Pts"
    )];
    for (idx, s) in dash.standings.iter().enumerate() {
        lines.push(format!(
            "{:<3}{:<18}{:>3}{:>3}{:>3}{:>3}{:>+5}{:>5}",
            idx + 1,
            truncate(&s.team_name, 17),
            s.played,
            s.wins,
            s.draws,
            s.losses,
            s.goal_difference,
            s.points
        ));
    }
    lines.join("\n")
}

fn render_results(frame: &mut Frame, area: Rect, dash: &Dashboard) {
    let title = match dash.results_week {
        Some(week) => format!("Week {week} Results"),
        None => "Results".to_string(),
    };
    let block = Block::default().title(title).borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    if dash.results.is_empty() {
        let empty = Paragraph::new("No matches played").style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, inner);
        return;
    }

    let visible = inner.height as usize;
    let (start, end) = visible_range(dash.selected, dash.results.len(), visible);
    for (i, idx) in (start..end).enumerate() {
        let r = &dash.results[idx];
        let row_area = Rect {
            x: inner.x,
            y: inner.y + i as u16,
            width: inner.width,
            height: 1,
        };
        let style = if idx == dash.selected {
            Style::default().fg(Color::White).bg(Color::DarkGray)
        } else {
            Style::default()
        };
        let line = format!(
            "{:>17} {:>2} - {:<2} {}",
            truncate(&r.home_team, 17),
            r.home_score,
            r.away_score,
            truncate(&r.away_team, 17)
        );
        frame.render_widget(Paragraph::new(line).style(style), row_area);
    }
}

fn championship_text(dash: &Dashboard) -> String {
    let Some(report) = dash.predictions.as_ref() else {
        return "No prediction data".to_string();
    };
    report
        .championship
        .iter()
        .map(|o| format!("{:<18}{:>7.2}%", truncate(&o.team_name, 17), o.chance))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_next_week(frame: &mut Frame, area: Rect, dash: &Dashboard) {
    let block = Block::default()
        .title("Next Week Odds")
        .borders(Borders::ALL);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = dash
        .predictions
        .as_ref()
        .map(|r| r.next_week.as_slice())
        .unwrap_or_default();
    if rows.is_empty() {
        let empty = Paragraph::new("No upcoming matches").style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, inner);
        return;
    }

    const ROW_HEIGHT: u16 = 3;
    for (i, p) in rows.iter().enumerate() {
        let y = inner.y + (i as u16) * ROW_HEIGHT;
        if y + ROW_HEIGHT > inner.y + inner.height {
            break;
        }
        let row_area = Rect {
            x: inner.x,
            y,
            width: inner.width,
            height: ROW_HEIGHT,
        };
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(24), Constraint::Length(22)])
            .split(row_area);

        let text = format!(
            "{} v {}\nH {:.2}% ({})  D {:.2}%\nA {:.2}% ({})",
            p.home_team,
            p.away_team,
            p.home_win_pct,
            odds_label(p.home_odds),
            p.draw_pct,
            p.away_win_pct,
            odds_label(p.away_odds)
        );
        frame.render_widget(Paragraph::new(text), cols[0]);
        frame.render_widget(odds_bar_chart(p), cols[1]);
    }
}

fn odds_bar_chart(p: &MatchPrediction) -> BarChart<'static> {
    let home = Bar::default()
        .value(p.home_win_pct.round() as u64)
        .text_value(String::new())
        .style(Style::default().fg(Color::Green));
    let draw = Bar::default()
        .value(p.draw_pct.round() as u64)
        .text_value(String::new())
        .style(Style::default().fg(Color::Yellow));
    let away = Bar::default()
        .value(p.away_win_pct.round() as u64)
        .text_value(String::new())
        .style(Style::default().fg(Color::Red));

    BarChart::default()
        .data(BarGroup::default().bars(&[home, draw, away]))
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(0)
        .group_gap(0)
        .max(100)
}

fn odds_label(odds: Option<f64>) -> String {
    odds.map(|o| format!("{o:.2}")).unwrap_or_else(|| "-".to_string())
}

fn console_text(dash: &Dashboard) -> String {
    if dash.logs.is_empty() {
        return "No alerts yet".to_string();
    }
    let skip = dash.logs.len().saturating_sub(3);
    dash.logs
        .iter()
        .skip(skip)
        .cloned()
        .collect::<Vec<_>>()
        .join("\n")
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    s.chars().take(max.saturating_sub(1)).chain(['…']).collect()
}

fn visible_range(selected: usize, total: usize, visible: usize) -> (usize, usize) {
    if total == 0 {
        return (0, 0);
    }
    if total <= visible {
        return (0, total);
    }

    let mut start = selected.saturating_sub(visible / 2);
    if start + visible > total {
        start = total - visible;
    }
    (start, start + visible)
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "League Sim - Help",
        "",
        "Season:",
        "  n            Simulate next week",
        "  a            Play all remaining weeks",
        "  r            Reset to week 4",
        "",
        "Results:",
        "  j/k or ↑/↓   Select match",
        "  + / -        Home score up/down",
        "  ] / [        Away score up/down",
        "",
        "  ?            Toggle help",
        "  q            Quit",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default().add_modifier(Modifier::BOLD));
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
