use chrono::DateTime;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use super::progress_bar;
use crate::account::Session;
use crate::activity::{Skill, SkillScore};
use crate::tui::App;

pub fn draw(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    draw_progress(f, app, chunks[0]);
    draw_metrics(f, app, chunks[1]);
}

fn draw_progress(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .skills
        .iter()
        .map(|p| {
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{:<11}", p.skill.label()),
                    Style::default().fg(Color::White),
                ),
                Span::styled(progress_bar(p.percent), Style::default().fg(Color::Green)),
                Span::styled(
                    format!(" {:>3}%", p.percent),
                    Style::default().fg(Color::Cyan),
                ),
            ]))
        })
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Skill Progress ")
        .title_style(Style::default().fg(Color::Cyan));

    f.render_widget(List::new(items).block(block), area);
}

fn draw_metrics(f: &mut Frame, app: &App, area: Rect) {
    let metrics = &app.metrics;

    let mut text = vec![
        score_line(Skill::Reading, metrics.reading.as_ref()),
        score_line(Skill::Listening, metrics.listening.as_ref()),
        Line::from(vec![
            Span::styled("Writing submissions: ", Style::default().fg(Color::Gray)),
            Span::styled(
                metrics.writing_submissions.to_string(),
                Style::default().fg(Color::White),
            ),
        ]),
        Line::from(vec![
            Span::styled("Speaking recordings: ", Style::default().fg(Color::Gray)),
            Span::styled(
                metrics.speaking_recordings.to_string(),
                Style::default().fg(Color::White),
            ),
        ]),
        Line::from(""),
    ];
    text.push(Line::from(Span::styled(
        Session::status_line(app.session.as_ref()),
        Style::default().fg(Color::DarkGray),
    )));

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Metrics ")
        .title_style(Style::default().fg(Color::Yellow));

    f.render_widget(Paragraph::new(text).block(block), area);
}

fn score_line(skill: Skill, score: Option<&SkillScore>) -> Line<'static> {
    let label = Span::styled(
        format!("{} score: ", skill.label()),
        Style::default().fg(Color::Gray),
    );
    match score {
        Some(s) => Line::from(vec![
            label,
            Span::styled(
                format!("{}/{} ({}%)", s.correct, s.total, s.percent),
                Style::default()
                    .fg(Color::White)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  {}", format_date(&s.at)),
                Style::default().fg(Color::DarkGray),
            ),
        ]),
        None => Line::from(vec![label, Span::raw("-")]),
    }
}

fn format_date(date_str: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(date_str) {
        dt.format("%b %d").to_string()
    } else {
        date_str.chars().take(10).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn format_date_rfc3339() {
        assert_eq!(format_date("2024-03-01T09:30:00+00:00"), "Mar 01");
    }

    #[test]
    fn format_date_falls_back_to_prefix() {
        assert_eq!(format_date("2024-03-01 whenever"), "2024-03-01");
        assert_eq!(format_date(""), "");
    }
}
