//! Terminal rendering.

use market_core::format::{format_compact, format_percent, format_price, format_rank};
use market_core::{Asset, InsightOrigin, Trend};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, Wrap},
    Frame,
};

use crate::app::App;
use crate::credentials::KeySlot;
use crate::input::{Mode, Regions};

const HEADER_STYLE: Style = Style::new().fg(Color::Yellow).add_modifier(Modifier::BOLD);

/// Draw the whole dashboard and return the areas used for pointer hits.
pub fn draw(f: &mut Frame, app: &App) -> Regions {
    let dashboard = app.dashboard();
    let has_error = dashboard.error().is_some();
    let has_insight = dashboard.insight().is_some() || dashboard.insight_pending().is_some();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(3),
            Constraint::Length(if has_error { 3 } else { 0 }),
            Constraint::Min(5),
            Constraint::Length(if has_insight { 6 } else { 0 }),
            Constraint::Length(1),
        ])
        .split(f.area());

    render_header(f, app, chunks[0]);
    render_search(f, app, chunks[1]);
    if has_error {
        render_error(f, app, chunks[2]);
    }
    render_table(f, app, chunks[3]);
    if has_insight {
        render_insight(f, app, chunks[4]);
    }
    render_footer(f, app, chunks[5]);

    let suggestions = render_suggestions(f, app, chunks[1], chunks[3]);
    render_toast(f, app, f.area());

    Regions {
        search: chunks[1],
        suggestions,
    }
}

fn render_header(f: &mut Frame, app: &App, area: Rect) {
    let dashboard = app.dashboard();
    let updated = match dashboard.last_updated() {
        Some(ts) => ts.format("%H:%M:%S UTC").to_string(),
        None => "never".to_string(),
    };
    let status = if dashboard.is_loading() {
        Span::styled(" Refreshing… ", Style::default().fg(Color::Cyan))
    } else {
        Span::raw(format!(" Updated {} ", updated))
    };

    let key_flag = |slot: KeySlot| if app.has_key(slot) { "set" } else { "none" };
    let line = Line::from(vec![
        Span::styled(" Coinboard ", HEADER_STYLE),
        status,
        Span::styled(
            format!(
                "| {} of {} assets | market key: {} | insight key: {}",
                dashboard.filtered().len(),
                dashboard.assets().len(),
                key_flag(KeySlot::Market),
                key_flag(KeySlot::Insight),
            ),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

fn render_search(f: &mut Frame, app: &App, area: Rect) {
    let (title, text) = match app.mode() {
        Mode::Search => (" Search ".to_string(), app.dashboard().query().to_string()),
        Mode::EditKey(slot) => (
            format!(" {} (Enter to save) ", slot.label()),
            "•".repeat(app.key_buffer().chars().count()),
        ),
    };
    let border = match app.mode() {
        Mode::Search => Style::default(),
        Mode::EditKey(_) => Style::default().fg(Color::Magenta),
    };

    let widget = Paragraph::new(text.clone()).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border)
            .title(title),
    );
    f.render_widget(widget, area);

    let cursor_x = area
        .x
        .saturating_add(1)
        .saturating_add(text_width(&text));
    if cursor_x < area.x.saturating_add(area.width.saturating_sub(1)) {
        f.set_cursor_position((cursor_x, area.y + 1));
    }
}

fn render_error(f: &mut Frame, app: &App, area: Rect) {
    let Some(err) = app.dashboard().error() else {
        return;
    };
    let widget = Paragraph::new(Line::from(vec![
        Span::styled(err.to_string(), Style::default().fg(Color::Red)),
        Span::styled("  Ctrl+R retry · Esc dismiss", Style::default().fg(Color::DarkGray)),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Red))
            .title(" Failed to load prices "),
    );
    f.render_widget(widget, area);
}

fn change_style(asset: &Asset) -> Style {
    match asset.trend() {
        Some(Trend::Up) => Style::default().fg(Color::Green),
        Some(Trend::Down) => Style::default().fg(Color::Red),
        _ => Style::default(),
    }
}

fn asset_row(asset: &Asset) -> Row<'static> {
    Row::new(vec![
        Cell::from(format_rank(asset.rank)),
        Cell::from(asset.name.clone()),
        Cell::from(asset.symbol.to_uppercase()),
        Cell::from(format_price(asset.current_price)),
        Cell::from(format_percent(asset.price_change_24h)).style(change_style(asset)),
        Cell::from(format_compact(asset.market_cap)),
        Cell::from(format_compact(asset.total_volume)),
    ])
}

fn render_table(f: &mut Frame, app: &App, area: Rect) {
    let dashboard = app.dashboard();
    let filtered = dashboard.filtered();

    let block = Block::default().borders(Borders::ALL).title(" Markets ");
    if filtered.is_empty() {
        let message = if dashboard.assets().is_empty() {
            if dashboard.is_loading() {
                "Loading market data…".to_string()
            } else {
                "No market data yet".to_string()
            }
        } else {
            format!("No assets match \"{}\"", dashboard.query())
        };
        f.render_widget(
            Paragraph::new(message)
                .style(Style::default().fg(Color::DarkGray))
                .block(block),
            area,
        );
        return;
    }

    let header = Row::new(vec!["#", "Name", "Symbol", "Price", "24h", "Market Cap", "Volume"])
        .style(HEADER_STYLE)
        .height(1);
    let widths = [
        Constraint::Length(5),
        Constraint::Min(16),
        Constraint::Length(8),
        Constraint::Length(14),
        Constraint::Length(9),
        Constraint::Length(11),
        Constraint::Length(11),
    ];
    let table = Table::new(filtered.into_iter().map(asset_row), widths)
        .header(header)
        .block(block);
    f.render_widget(table, area);
}

/// Overlay under the search box. Returns one rect per suggestion row.
fn render_suggestions(f: &mut Frame, app: &App, search: Rect, body: Rect) -> Vec<Rect> {
    let dashboard = app.dashboard();
    if app.mode() != Mode::Search || !dashboard.suggestions_open() {
        return Vec::new();
    }
    let suggestions = dashboard.suggestions();

    let width = search.width.min(48);
    let height = (suggestions.len() as u16 + 2).min(body.height);
    let area = Rect::new(search.x, search.y + search.height, width, height);
    if area.height < 3 {
        return Vec::new();
    }

    let lines: Vec<Line> = suggestions
        .iter()
        .enumerate()
        .map(|(i, asset)| {
            let style = if dashboard.cursor() == Some(i) {
                Style::default().bg(Color::Blue).fg(Color::White)
            } else {
                Style::default()
            };
            Line::from(vec![
                Span::styled(format!(" {} ", asset.name), style.add_modifier(Modifier::BOLD)),
                Span::styled(format!("{} ", asset.symbol.to_uppercase()), style.fg(Color::DarkGray)),
            ])
            .style(style)
        })
        .collect();

    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL)),
        area,
    );

    let visible = (area.height - 2) as usize;
    (0..suggestions.len().min(visible))
        .map(|i| Rect::new(area.x + 1, area.y + 1 + i as u16, area.width.saturating_sub(2), 1))
        .collect()
}

fn render_insight(f: &mut Frame, app: &App, area: Rect) {
    let dashboard = app.dashboard();
    let (title, body) = match (dashboard.insight(), dashboard.insight_pending()) {
        (_, Some(pending)) if dashboard.insight().map_or(true, |i| i.asset_name != pending) => (
            format!(" Insight: {} ", pending),
            Line::from(Span::styled(
                "Generating insight…",
                Style::default().fg(Color::Cyan),
            )),
        ),
        (Some(insight), _) => {
            let origin = match insight.origin {
                InsightOrigin::Generated => "",
                InsightOrigin::Fallback => " (offline)",
            };
            (
                format!(" Insight: {}{} ", insight.asset_name, origin),
                Line::from(insight.text.clone()),
            )
        }
        _ => return,
    };

    let widget = Paragraph::new(body)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(title),
        );
    f.render_widget(widget, area);
}

fn render_footer(f: &mut Frame, app: &App, area: Rect) {
    let hints = match app.mode() {
        Mode::Search => "↑/↓ select · Enter insight · Esc close · Ctrl+R retry · Ctrl+K market key · Ctrl+G insight key · Ctrl+X clear keys · Ctrl+Q quit",
        Mode::EditKey(_) => "Type the key · Backspace delete · Enter/Esc done · Ctrl+X clear keys",
    };
    f.render_widget(
        Paragraph::new(hints).style(Style::default().fg(Color::DarkGray)),
        area,
    );
}

fn render_toast(f: &mut Frame, app: &App, screen: Rect) {
    let Some(toast) = app.dashboard().toast() else {
        return;
    };
    let width = text_width(&toast.message).saturating_add(4).min(screen.width);
    let area = Rect::new(
        screen.x + screen.width.saturating_sub(width),
        screen.y + screen.height.saturating_sub(4),
        width,
        3.min(screen.height),
    );
    f.render_widget(Clear, area);
    f.render_widget(
        Paragraph::new(toast.message.clone())
            .style(Style::default().fg(Color::Red))
            .block(Block::default().borders(Borders::ALL)),
        area,
    );
}

fn text_width(text: &str) -> u16 {
    u16::try_from(text.chars().count()).unwrap_or(u16::MAX)
}
