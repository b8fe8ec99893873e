// ============================================================================
// Vue détaillée - graphique historique + fiche société
// ============================================================================
// ┌ header : nom, prix, variation du jour ───────────────────────────────┐
// ├ graphique ligne (70%) ─────────────────────┬ fiche société (30%) ────┤
// └ footer : période active et raccourcis ─────┴─────────────────────────┘
//
// CONCEPTS RATATUI :
// 1. Chart + Dataset : ligne de prix, une abscisse par jour
// 2. Axis::bounds : marge de 5% autour du min/max
// ============================================================================

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use crate::app::App;
use crate::models::{format_percent, format_volume, market_cap_label, StockDetail, TimeRange};
use crate::ui::dashboard::change_color;

/// Dessine la vue détaillée du ticker ouvert
pub fn render_detail(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(3),
        ])
        .split(area);

    let symbol = app.detail_symbol.as_deref().unwrap_or("?");

    match app.detail.data() {
        Some(detail) => {
            render_detail_header(frame, detail, app.detail.is_loading(), chunks[0]);

            let body = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
                .split(chunks[1]);
            render_history_chart(frame, detail, body[0]);
            render_company_info(frame, detail, body[1]);
        }
        None => render_loading(frame, symbol, chunks[0].union(chunks[1])),
    }

    render_detail_footer(frame, app.range, chunks[2]);
}

fn render_detail_header(frame: &mut Frame, detail: &StockDetail, loading: bool, area: Rect) {
    let title = if loading {
        format!(" {} - {} ↻ ", detail.symbol, detail.info.name)
    } else {
        format!(" {} - {} ", detail.symbol, detail.info.name)
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(title);

    let color = change_color(detail.change);
    let mut spans = vec![
        Span::raw("Price: "),
        Span::styled(
            detail.currency.format_price(detail.current_price),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
        Span::raw("  "),
        Span::styled(
            format!(
                "{} ({})",
                detail.currency.format_change(detail.change),
                format_percent(detail.change_percent)
            ),
            Style::default().fg(color),
        ),
    ];
    if !detail.live {
        spans.push(Span::styled("  (simulated)", Style::default().fg(Color::DarkGray)));
    }

    frame.render_widget(
        Paragraph::new(Line::from(spans))
            .block(block)
            .alignment(Alignment::Center),
        area,
    );
}

/// Points (x, y) du graphique : x = index du jour
fn chart_points(detail: &StockDetail) -> Vec<(f64, f64)> {
    detail
        .history
        .iter()
        .enumerate()
        .map(|(i, point)| (i as f64, point.price))
        .collect()
}

/// Bornes de l'axe Y : min/max avec 5% de marge, jamais sous 0
fn y_bounds(detail: &StockDetail) -> Option<[f64; 2]> {
    let (min, max) = detail.price_bounds()?;
    // Série plate : marge arbitraire de 1 pour garder un axe non vide
    let margin = if max > min { (max - min) * 0.05 } else { 1.0 };
    Some([(min - margin).max(0.0), max + margin])
}

fn render_history_chart(frame: &mut Frame, detail: &StockDetail, area: Rect) {
    let points = chart_points(detail);
    let Some([y_min, y_max]) = y_bounds(detail) else {
        render_loading(frame, &detail.symbol, area);
        return;
    };

    let performance = detail.performance();
    let datasets = vec![Dataset::default()
        .name(detail.symbol.as_str())
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(change_color(performance.change)))
        .data(&points)];

    let first_date = detail.history.first().map(|p| p.date.format("%b %d").to_string());
    let last_date = detail.history.last().map(|p| p.date.format("%b %d").to_string());

    let x_axis = Axis::default()
        .style(Style::default().fg(Color::Gray))
        .bounds([0.0, points.len().saturating_sub(1).max(1) as f64])
        .labels(vec![
            Span::raw(first_date.unwrap_or_default()),
            Span::raw(last_date.unwrap_or_default()),
        ]);

    let currency = detail.currency;
    let y_axis = Axis::default()
        .style(Style::default().fg(Color::Gray))
        .bounds([y_min, y_max])
        .labels(vec![
            Span::raw(currency.format_price(y_min)),
            Span::raw(currency.format_price((y_min + y_max) / 2.0)),
            Span::raw(currency.format_price(y_max)),
        ]);

    let title = format!(
        " {} - {} ({}) ",
        detail.symbol,
        detail.range.label(),
        format_percent(performance.change_percent)
    );

    let chart = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::White))
                .title(title),
        )
        .x_axis(x_axis)
        .y_axis(y_axis);

    frame.render_widget(chart, area);
}

/// Lignes de la fiche société
fn info_lines(detail: &StockDetail) -> Vec<Line<'static>> {
    let field = |label: &str, value: String| {
        Line::from(vec![
            Span::styled(format!("{:<14}", label), Style::default().fg(Color::Gray)),
            Span::styled(value, Style::default().add_modifier(Modifier::BOLD)),
        ])
    };

    let last_volume = detail.history.last().map(|p| p.volume).unwrap_or(0);
    let pe = detail
        .info
        .pe_ratio
        .map(|pe| format!("{:.2}", pe))
        .unwrap_or_else(|| "N/A".to_string());

    vec![
        field("Country", detail.info.country.clone()),
        field("Listing", detail.info.listing_currency.clone()),
        field("Industry", detail.info.industry.clone()),
        field("Market cap", market_cap_label(detail.info.market_cap_millions)),
        field("P/E", pe),
        field("Prev. close", detail.currency.format_price(detail.previous_close)),
        field("Last volume", format_volume(last_volume)),
        field(
            "Period",
            format!(
                "{} ({})",
                detail.currency.format_change(detail.performance().change),
                format_percent(detail.performance().change_percent)
            ),
        ),
    ]
}

fn render_company_info(frame: &mut Frame, detail: &StockDetail, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Company ");

    frame.render_widget(Paragraph::new(info_lines(detail)).block(block), area);
}

fn render_loading(frame: &mut Frame, symbol: &str, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(format!(" {} ", symbol));

    let text = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("Loading {}...", symbol),
            Style::default().fg(Color::Gray),
        )),
    ];

    frame.render_widget(
        Paragraph::new(text).block(block).alignment(Alignment::Center),
        area,
    );
}

/// Footer : périodes disponibles, la période active en surbrillance
fn render_detail_footer(frame: &mut Frame, active: TimeRange, area: Rect) {
    let mut spans: Vec<Span> = TimeRange::ALL
        .iter()
        .flat_map(|range| {
            let style = if *range == active {
                Style::default().fg(Color::Black).bg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::Gray)
            };
            [Span::styled(format!(" {} ", range.label()), style), Span::raw(" ")]
        })
        .collect();

    let key = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
    spans.extend([
        Span::raw("   "),
        Span::styled("[h/l]", key),
        Span::raw(" Range  "),
        Span::styled("[c]", key),
        Span::raw(" Currency  "),
        Span::styled("[Esc]", key),
        Span::raw(" Back"),
    ]);

    frame.render_widget(
        Paragraph::new(Line::from(spans))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan)),
            )
            .alignment(Alignment::Center),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::SyntheticSource;
    use crate::models::Currency;

    #[test]
    fn test_chart_points_follow_history() {
        let detail =
            SyntheticSource::new().generate_detail("AAPL", TimeRange::OneWeek, Currency::USD);
        let points = chart_points(&detail);

        assert_eq!(points.len(), 7);
        assert_eq!(points[0].0, 0.0);
        assert_eq!(points[6].1, detail.history[6].price);
    }

    #[test]
    fn test_y_bounds_margin() {
        let detail =
            SyntheticSource::new().generate_detail("AAPL", TimeRange::OneMonth, Currency::USD);
        let (min, max) = detail.price_bounds().unwrap();
        let [lo, hi] = y_bounds(&detail).unwrap();

        assert!(lo <= min && lo >= 0.0);
        assert!(hi >= max);
    }

    #[test]
    fn test_info_lines() {
        let detail =
            SyntheticSource::new().generate_detail("MSFT", TimeRange::OneWeek, Currency::EUR);
        assert_eq!(info_lines(&detail).len(), 8);
    }
}
