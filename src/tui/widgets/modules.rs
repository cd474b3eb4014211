use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use super::progress_bar;
use crate::models::{ModuleStatus, ModuleSummary};
use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(6), // Course overview
            Constraint::Min(0),    // Module list + detail
        ])
        .split(area);

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[1]);

    draw_overview(f, app, chunks[0]);
    draw_module_list(f, app, bottom[0]);
    draw_module_detail(f, app, bottom[1]);
}

fn draw_overview(f: &mut Frame, app: &App, area: Rect) {
    let summary = &app.summary;
    let lessons = app.lessons.iter().find(|l| l.course == app.course);

    let mut text = vec![
        Line::from(vec![
            Span::styled("Modules: ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("{}/{} ", summary.completed_count, summary.total),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(progress_bar(summary.percent), Style::default().fg(Color::Green)),
            Span::styled(
                format!(" {}%", summary.percent),
                Style::default().fg(Color::Cyan),
            ),
        ]),
        Line::from(vec![
            Span::styled("Resume: ", Style::default().fg(Color::Gray)),
            Span::styled(summary.resume_link.clone(), Style::default().fg(Color::Yellow)),
        ]),
    ];
    if let Some(l) = lessons {
        text.push(Line::from(vec![
            Span::styled("Lessons: ", Style::default().fg(Color::Gray)),
            Span::styled(l.label(), Style::default().fg(Color::White)),
        ]));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} Course ", app.course.label()))
        .title_style(Style::default().fg(Color::Cyan));

    f.render_widget(Paragraph::new(text).block(block), area);
}

fn status_color(status: ModuleStatus) -> Color {
    match status {
        ModuleStatus::Completed => Color::Green,
        ModuleStatus::Locked => Color::DarkGray,
        ModuleStatus::InProgress => Color::Yellow,
        ModuleStatus::NotStarted => Color::White,
    }
}

fn draw_module_list(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .modules
        .items
        .iter()
        .map(|m| {
            let color = status_color(m.status);
            ListItem::new(Line::from(vec![
                Span::raw(format!("{} ", m.status.icon())),
                Span::styled(
                    format!("Module {:<4}", m.state.module_id),
                    Style::default().fg(Color::White),
                ),
                Span::styled(m.status.label(), Style::default().fg(color)),
            ]))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Modules ")
        .title_style(Style::default().fg(Color::Cyan));

    let list = List::new(items)
        .block(block)
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    state.select(app.modules.selected);

    f.render_stateful_widget(list, area, &mut state);
}

fn draw_module_detail(f: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Detail ")
        .title_style(Style::default().fg(Color::Magenta));

    let Some(module) = app.modules.selected_item() else {
        f.render_widget(Paragraph::new("No module selected.").block(block), area);
        return;
    };

    let paragraph = Paragraph::new(detail_lines(app, module))
        .block(block)
        .wrap(Wrap { trim: true });
    f.render_widget(paragraph, area);
}

fn detail_lines(app: &App, module: &ModuleSummary) -> Vec<Line<'static>> {
    let state = &module.state;
    let label = |s: &'static str| Span::styled(s, Style::default().fg(Color::Gray));

    let mut lines = vec![
        Line::from(vec![
            label("Phase: "),
            Span::styled(
                state.phase().label(),
                Style::default().fg(status_color(module.status)),
            ),
        ]),
        Line::from(vec![
            label("Quiz: "),
            Span::raw(match (state.quiz_passed, state.quiz_percent) {
                (true, Some(p)) => format!("passed ({}%)", p),
                (true, None) => "passed".to_string(),
                (false, Some(p)) => format!("not passed ({}%)", p),
                (false, None) => "not taken".to_string(),
            }),
        ]),
    ];

    if let Some(estimate) = app.course.estimated_time(state.module_id) {
        lines.push(Line::from(vec![
            label("Estimated: "),
            Span::raw(estimate),
        ]));
    }

    lines.push(Line::from(vec![
        label("Page: "),
        Span::styled(
            app.course.module_page(state.module_id),
            Style::default().fg(Color::Cyan),
        ),
    ]));

    if !state.reflection.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(label("Reflection:")));
        lines.push(Line::from(state.reflection.clone()));
    }

    lines
}
