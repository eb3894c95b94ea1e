mod item_detail;
mod item_list;

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::Frame;

use crate::app::{App, Screen};
use crate::controller::Phase;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);

    match app.screen {
        Screen::List => item_list::render(frame, app, chunks[1]),
        Screen::Detail => item_detail::render(frame, app, chunks[1]),
    }

    render_status_bar(frame, app, chunks[2]);
}

/// Cut `s` to at most `max` characters, marking the cut with "...".
pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let title = match app.screen {
        Screen::List => format!(
            "pagewalk - {} ({} items, page {})",
            app.title,
            app.controller.items().len(),
            app.controller.cursor()
        ),
        Screen::Detail => match &app.current_item {
            Some(item) => format!("pagewalk - {}", item.name),
            None => "pagewalk - Item".to_string(),
        },
    };

    let header = Paragraph::new(Line::from(vec![Span::styled(
        truncate(&title, area.width as usize),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )]))
    .style(Style::default().bg(Color::DarkGray));

    frame.render_widget(header, area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let controller = &app.controller;

    let status = if let Some(notice) = &app.notice {
        Line::from(vec![Span::styled(
            notice.clone(),
            Style::default().fg(Color::Red),
        )])
    } else if let Some(error) = controller.error() {
        let hint = if controller.phase() == Phase::Error {
            " | r: retry"
        } else {
            ""
        };
        Line::from(vec![Span::styled(
            format!("Error: {}{}", error, hint),
            Style::default().fg(Color::Red),
        )])
    } else if controller.is_refreshing() {
        Line::from(vec![Span::styled(
            "Refreshing...",
            Style::default().fg(Color::Yellow),
        )])
    } else if controller.is_loading() {
        let text = if controller.phase() == Phase::LoadingMore {
            format!("Loading page {}...", controller.next_page())
        } else {
            "Loading...".to_string()
        };
        Line::from(vec![Span::styled(text, Style::default().fg(Color::Yellow))])
    } else {
        let help = match app.screen {
            Screen::List => {
                "j/k/g/G: nav | Ctrl+d/u: page | Enter: open | r: refresh | n: more | o: browser | q: quit"
            }
            Screen::Detail => "j/k/g: scroll | Ctrl+d/u: page | o: browser | q: back",
        };
        let mut spans = vec![Span::styled(help, Style::default().fg(Color::Gray))];
        if controller.is_exhausted() && app.screen == Screen::List {
            spans.push(Span::styled(
                " | end of list",
                Style::default().fg(Color::DarkGray),
            ));
        }
        Line::from(spans)
    };

    let status_bar = Paragraph::new(status).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(status_bar, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_short_unchanged() {
        assert_eq!(truncate("Goofy", 10), "Goofy");
    }

    #[test]
    fn truncate_long_adds_ellipsis() {
        assert_eq!(truncate("Mickey Mouse", 9), "Mickey...");
    }

    #[test]
    fn truncate_counts_chars_not_bytes() {
        assert_eq!(truncate("Pokémon Pokémon", 10), "Pokémon...");
    }
}
