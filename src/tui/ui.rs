use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};

use super::widgets::{modules, skills, timer};
use super::{App, View};

pub fn draw(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Tab bar
            Constraint::Min(0),    // Content
            Constraint::Length(1), // Status line
            Constraint::Length(1), // Help bar
        ])
        .split(f.area());

    draw_tabs(f, app, chunks[0]);
    draw_content(f, app, chunks[1]);
    draw_status(f, app, chunks[2]);
    draw_help_bar(f, app, chunks[3]);
}

fn draw_tabs(f: &mut Frame, app: &App, area: Rect) {
    let tab_titles = vec!["Modules", "Skills", "Timer"];
    let selected = match app.view {
        View::Modules => 0,
        View::Skills => 1,
        View::Timer => 2,
    };

    let title = match &app.session {
        Some(s) => format!(" Classroom | {} ", s.name),
        None => " Classroom ".to_string(),
    };

    let tabs = Tabs::new(tab_titles)
        .block(Block::default().borders(Borders::ALL).title(title))
        .select(selected)
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );

    f.render_widget(tabs, area);
}

fn draw_content(f: &mut Frame, app: &App, area: Rect) {
    match app.view {
        View::Modules => modules::draw(f, app, area),
        View::Skills => skills::draw(f, app, area),
        View::Timer => timer::draw(f, app, area),
    }
}

fn draw_status(f: &mut Frame, app: &App, area: Rect) {
    let text = app.status_message.as_deref().unwrap_or("");
    let status = Paragraph::new(Line::from(Span::styled(
        text,
        Style::default().fg(Color::Yellow),
    )));
    f.render_widget(status, area);
}

fn draw_help_bar(f: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![
        Span::styled("h/l", Style::default().fg(Color::Cyan)),
        Span::raw(" Views  "),
    ];

    match app.view {
        View::Modules => {
            spans.extend(vec![
                Span::styled("j/k", Style::default().fg(Color::Cyan)),
                Span::raw(" Nav  "),
                Span::styled("g/G", Style::default().fg(Color::Cyan)),
                Span::raw(" Top/Bot  "),
                Span::styled("o/<CR>", Style::default().fg(Color::Cyan)),
                Span::raw(" Open  "),
                Span::styled("c", Style::default().fg(Color::Cyan)),
                Span::raw(" Course  "),
            ]);
        }
        View::Skills => {}
        View::Timer => {
            spans.extend(vec![
                Span::styled("s", Style::default().fg(Color::Cyan)),
                Span::raw(" Start  "),
                Span::styled("p", Style::default().fg(Color::Cyan)),
                Span::raw(" Pause  "),
                Span::styled("r", Style::default().fg(Color::Cyan)),
                Span::raw(" Reset  "),
            ]);
        }
    }

    spans.extend(vec![
        Span::styled("^r", Style::default().fg(Color::Cyan)),
        Span::raw(" Refresh  "),
        Span::styled("q", Style::default().fg(Color::Cyan)),
        Span::raw(" Quit"),
    ]);

    let help = Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::DarkGray));

    f.render_widget(help, area);
}
