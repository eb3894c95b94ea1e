use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::Frame;

use crate::app::App;
use crate::controller::Phase;
use crate::types::Item;

use super::truncate;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let controller = &app.controller;

    if controller.items().is_empty() {
        let message = match controller.phase() {
            Phase::InitialLoading | Phase::Refreshing => "Loading...",
            Phase::Error => "Could not load items",
            _ => "No items found",
        };
        let block = Block::default().borders(Borders::ALL).title("Items");
        let empty = Paragraph::new(message)
            .block(block)
            .style(Style::default().fg(Color::Gray));
        frame.render_widget(empty, area);
        return;
    }

    let w = area.width.saturating_sub(2) as usize;
    let name_width = 32;
    let flex = w.saturating_sub(name_width + 2).max(10);

    let mut items: Vec<ListItem> = controller
        .items()
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let style = if i == app.selected {
                Style::default()
                    .fg(Color::Yellow)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };

            let line = Line::from(vec![
                Span::styled(
                    format!("{:<name_width$}", truncate(&item.name, name_width)),
                    style,
                ),
                Span::raw("  "),
                Span::styled(
                    truncate(&subtitle(item), flex),
                    Style::default().fg(Color::Gray),
                ),
            ]);

            ListItem::new(line)
        })
        .collect();

    if controller.phase() == Phase::LoadingMore {
        items.push(ListItem::new(Span::styled(
            "Loading more...",
            Style::default().fg(Color::DarkGray),
        )));
    }

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Items ({})", controller.items().len())),
        )
        .highlight_style(Style::default().bg(Color::DarkGray));

    let mut state = ListState::default();
    state.select(Some(app.selected));

    frame.render_stateful_widget(list, area, &mut state);
}

/// Short secondary line: where the record first appears
fn subtitle(item: &Item) -> String {
    if let Some(show) = item.list_field("tvShows").first() {
        return format!("Appears in: {}", show);
    }
    if let Some(film) = item.list_field("films").first() {
        return format!("Films: {}", film);
    }
    String::new()
}
