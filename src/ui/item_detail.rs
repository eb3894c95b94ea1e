use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::Frame;
use serde_json::Value;

use crate::app::App;
use crate::types::Item;

// Shown in the header or not useful as text
const HIDDEN_FIELDS: &[&str] = &[
    "sourceUrl",
    "url",
    "imageUrl",
    "createdAt",
    "updatedAt",
    "__v",
];

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let Some(item) = &app.current_item else {
        let block = Block::default().borders(Borders::ALL).title("Item");
        let empty = Paragraph::new("No item selected")
            .block(block)
            .style(Style::default().fg(Color::Gray));
        frame.render_widget(empty, area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(0)])
        .split(area);

    render_header(frame, item, chunks[0]);
    render_body(frame, app, item, chunks[1]);
}

fn render_header(frame: &mut Frame, item: &Item, area: Rect) {
    let updated = item
        .updated_at()
        .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string());

    let lines = vec![
        Line::from(vec![
            Span::styled(
                format!("#{} ", item.id),
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(&item.name, Style::default().add_modifier(Modifier::BOLD)),
        ]),
        Line::from(vec![
            Span::styled("Updated: ", Style::default().fg(Color::Gray)),
            Span::raw(updated),
        ]),
        Line::from(vec![
            Span::styled("Link: ", Style::default().fg(Color::Gray)),
            Span::styled(
                item.link().unwrap_or("-").to_string(),
                Style::default().fg(Color::Blue),
            ),
        ]),
    ];

    let header =
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Details"));
    frame.render_widget(header, area);
}

fn render_body(frame: &mut Frame, app: &App, item: &Item, area: Rect) {
    let mut lines: Vec<Line> = Vec::new();
    for (label, values) in field_sections(item) {
        if values.len() == 1 && !is_list(item, &label) {
            lines.push(Line::from(vec![
                Span::styled(format!("{}: ", label), Style::default().fg(Color::Gray)),
                Span::raw(values[0].clone()),
            ]));
            continue;
        }
        lines.push(Line::from(Span::styled(
            format!("{}:", label),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )));
        lines.extend(values.into_iter().map(|v| Line::from(format!("  • {}", v))));
        lines.push(Line::from(""));
    }

    if lines.is_empty() {
        lines.push(Line::from(Span::styled(
            "No further details.",
            Style::default().fg(Color::Gray),
        )));
    }

    let inner_height = area.height.saturating_sub(2) as usize;
    let max_scroll = lines.len().saturating_sub(inner_height);
    let scroll_offset = app.scroll_offset.min(max_scroll);

    let visible_lines: Vec<Line> = lines
        .into_iter()
        .skip(scroll_offset)
        .take(inner_height)
        .collect();

    frame.render_widget(Clear, area);

    let body = Paragraph::new(Text::from(visible_lines))
        .block(Block::default().borders(Borders::ALL).title("Fields"));
    frame.render_widget(body, area);
}

fn is_list(item: &Item, label: &str) -> bool {
    item.fields
        .iter()
        .any(|(key, value)| humanize(key) == label && value.is_array())
}

/// Displayable fields as (label, values). Empty lists and hidden fields are
/// skipped.
fn field_sections(item: &Item) -> Vec<(String, Vec<String>)> {
    let mut sections: Vec<(String, Vec<String>)> = item
        .fields
        .iter()
        .filter(|(key, _)| !HIDDEN_FIELDS.contains(&key.as_str()))
        .filter_map(|(key, value)| {
            let values: Vec<String> = match value {
                Value::Array(entries) => entries.iter().filter_map(scalar_text).collect(),
                other => scalar_text(other).into_iter().collect(),
            };
            if values.is_empty() {
                None
            } else {
                Some((humanize(key), values))
            }
        })
        .collect();
    sections.sort_by(|a, b| a.0.cmp(&b.0));
    sections
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// "parkAttractions" -> "Park Attractions"
fn humanize(key: &str) -> String {
    let mut out = String::new();
    for (i, c) in key.chars().enumerate() {
        if i == 0 {
            out.extend(c.to_uppercase());
        } else if c.is_uppercase() {
            out.push(' ');
            out.push(c);
        } else if c == '_' {
            out.push(' ');
        } else {
            out.push(c);
        }
    }
    out
}
