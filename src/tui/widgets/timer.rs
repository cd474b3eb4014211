use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};

use crate::quiz::percent_of;
use crate::timer::PracticeTimer;
use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Clock
            Constraint::Length(3), // Elapsed gauge
            Constraint::Min(0),
        ])
        .split(area);

    let timer = &app.timer;

    let (state_text, state_color) = timer_state(timer);
    let clock = vec![
        Line::from(Span::styled(
            timer.display(),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(state_text, Style::default().fg(state_color))),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Practice Timer ")
        .title_style(Style::default().fg(Color::Cyan));

    f.render_widget(
        Paragraph::new(clock)
            .block(block)
            .alignment(Alignment::Center),
        chunks[0],
    );

    let elapsed = timer.initial().saturating_sub(timer.remaining());
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" Elapsed "))
        .gauge_style(Style::default().fg(Color::Green))
        .percent(percent_of(elapsed, timer.initial()).min(100) as u16);

    f.render_widget(gauge, chunks[1]);
}

fn timer_state(timer: &PracticeTimer<'_>) -> (&'static str, Color) {
    if timer.is_finished() {
        ("Time is up", Color::Red)
    } else if timer.is_running() {
        ("Running", Color::Green)
    } else if timer.remaining() == timer.initial() {
        ("Ready", Color::White)
    } else {
        ("Paused", Color::Yellow)
    }
}
