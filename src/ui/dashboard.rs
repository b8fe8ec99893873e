// ============================================================================
// Dashboard - Rendu de l'interface principale
// ============================================================================
// Disposition verticale :
//   header | indices (4 colonnes) | cartes d'actions | actualités | footer
//
// Chaque panneau affiche ses dernières données même pendant un
// rafraîchissement (PanelState::Loading(Some(..))) ; un "↻" dans le titre
// signale le chargement en cours.
// ============================================================================

use chrono::{DateTime, Utc};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use crate::app::{App, PanelState, Screen, StockCard};
use crate::models::{format_percent, IndexQuote, NewsArticle};
use crate::ui::detail;

/// Dessine l'écran courant
pub fn render(frame: &mut Frame, app: &App) {
    match app.current_screen {
        Screen::Dashboard | Screen::InputMode => render_dashboard(frame, app),
        Screen::Detail => detail::render_detail(frame, app, frame.size()),
    }
}

fn render_dashboard(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(5), // Indices
            Constraint::Min(6),    // Cartes
            Constraint::Length(14), // Actualités (2 lignes par article)
            Constraint::Length(4), // Footer
        ])
        .split(frame.size());

    render_header(frame, app, chunks[0]);
    render_overview(frame, app, chunks[1]);
    render_stocks(frame, app, chunks[2]);
    render_news(frame, app, chunks[3]);

    if app.is_in_input_mode() {
        render_input_footer(frame, app, chunks[4]);
    } else {
        render_footer(frame, app, chunks[4]);
    }
}

/// Couleur d'une variation : vert si >= 0, rouge sinon
pub(crate) fn change_color(change: f64) -> Color {
    if change >= 0.0 {
        Color::Green
    } else {
        Color::Red
    }
}

/// Titre de panneau, avec indicateur de chargement
fn panel_title<T>(title: &str, state: &PanelState<T>) -> String {
    if state.is_loading() {
        format!(" {} ↻ ", title)
    } else {
        format!(" {} ", title)
    }
}

fn panel_block(title: String) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(title)
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" StockDash ")
        .title_alignment(Alignment::Center);

    let line = Line::from(vec![
        Span::styled(
            "Market dashboard",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ),
        Span::raw("   Currency: "),
        Span::styled(
            format!("{} ({})", app.currency.code(), app.currency.symbol()),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        ),
    ]);

    frame.render_widget(
        Paragraph::new(line).block(block).alignment(Alignment::Center),
        area,
    );
}

// ============================================================================
// Indices
// ============================================================================

fn render_overview(frame: &mut Frame, app: &App, area: Rect) {
    let block = panel_block(panel_title("Market Overview", &app.overview));
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(quotes) = app.overview.data() else {
        frame.render_widget(loading_paragraph(), inner);
        return;
    };

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(vec![Constraint::Ratio(1, quotes.len().max(1) as u32); quotes.len()])
        .split(inner);

    for (quote, column) in quotes.iter().zip(columns.iter()) {
        frame.render_widget(
            Paragraph::new(index_lines(quote)).alignment(Alignment::Center),
            *column,
        );
    }
}

fn index_lines(quote: &IndexQuote) -> Vec<Line<'static>> {
    let color = change_color(quote.change);
    vec![
        Line::from(Span::styled(
            quote.name.clone(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(quote.currency.format_price(quote.value)),
        Line::from(Span::styled(
            format!(
                "{} ({})",
                quote.currency.format_change(quote.change),
                format_percent(quote.change_percent)
            ),
            Style::default().fg(color),
        )),
    ]
}

// ============================================================================
// Cartes d'actions
// ============================================================================

fn render_stocks(frame: &mut Frame, app: &App, area: Rect) {
    let loading = app.stocks.iter().any(|card| card.state.is_loading());
    let title = if loading { " Stocks ↻ " } else { " Stocks " };
    let block = panel_block(title.to_string());

    if app.stocks.is_empty() {
        let text = vec![
            Line::from(""),
            Line::from(Span::styled(
                "No tickers, press [a] to add one",
                Style::default().fg(Color::Gray),
            )),
        ];
        frame.render_widget(
            Paragraph::new(text).block(block).alignment(Alignment::Center),
            area,
        );
        return;
    }

    let items: Vec<ListItem> = app
        .stocks
        .iter()
        .enumerate()
        .map(|(index, card)| {
            let style = match card.state.data() {
                Some(snapshot) => Style::default().fg(change_color(snapshot.change)),
                None => Style::default().fg(Color::Gray),
            };
            let style = if index == app.selected_index {
                style.add_modifier(Modifier::BOLD | Modifier::REVERSED)
            } else {
                style
            };
            ListItem::new(card_label(card)).style(style)
        })
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}

/// Ligne d'une carte : étoile, symbole, prix, variation, volume, capitalisation
pub(crate) fn card_label(card: &StockCard) -> String {
    let star = if card.favorite { '★' } else { ' ' };

    match card.state.data() {
        Some(snapshot) => {
            let source = if snapshot.live { "" } else { "  (simulated)" };
            format!(
                " {} {}   Vol {:>13}   Cap {:>8}{}",
                star,
                snapshot.display(),
                crate::models::format_volume(snapshot.volume),
                snapshot.market_cap,
                source
            )
        }
        None => format!(" {} {:<8} {:>12}", star, card.symbol, "Loading..."),
    }
}

// ============================================================================
// Actualités
// ============================================================================

fn render_news(frame: &mut Frame, app: &App, area: Rect) {
    let block = panel_block(panel_title("Market News", &app.news));

    let Some(articles) = app.news.data() else {
        frame.render_widget(loading_paragraph().block(block), area);
        return;
    };

    let now = Utc::now();
    let items: Vec<ListItem> = articles.iter().map(|article| news_item(article, now)).collect();

    frame.render_widget(List::new(items).block(block), area);
}

/// Un article : âge, titre et source, puis la description en grisé
fn news_item(article: &NewsArticle, now: DateTime<Utc>) -> ListItem<'static> {
    let dim = Style::default().fg(Color::DarkGray);

    ListItem::new(vec![
        Line::from(vec![
            Span::styled(format!("{:<16}", article.time_ago(now)), dim),
            Span::styled(
                article.title.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  {}", article.source),
                Style::default().fg(Color::Cyan),
            ),
        ]),
        Line::from(vec![
            Span::raw(" ".repeat(16)),
            Span::styled(article.description.clone(), dim),
        ]),
    ])
}

fn loading_paragraph() -> Paragraph<'static> {
    Paragraph::new(Span::styled("Loading...", Style::default().fg(Color::Gray)))
        .alignment(Alignment::Center)
}

// ============================================================================
// Footer
// ============================================================================

fn key_span(label: &'static str, color: Color) -> Span<'static> {
    Span::styled(label, Style::default().fg(color).add_modifier(Modifier::BOLD))
}

fn warning_line(key: &'static str, message: String) -> Line<'static> {
    let warning = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
    Line::from(vec![
        Span::styled("⚠  Press ", warning),
        Span::styled(
            key,
            Style::default()
                .fg(Color::Red)
                .add_modifier(Modifier::BOLD | Modifier::SLOW_BLINK),
        ),
        Span::styled(message, warning),
    ])
}

fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let shortcuts = if app.confirm_delete {
        let symbol = app.selected_symbol().unwrap_or("?");
        warning_line(
            "[d]",
            format!(" again to remove {}, any other key to cancel ⚠", symbol),
        )
    } else if app.confirm_quit {
        warning_line("[q]", " again to quit, any other key to cancel ⚠".to_string())
    } else {
        Line::from(vec![
            key_span("[q]", Color::Yellow),
            Span::raw(" Quit  "),
            key_span("[↑↓ / j k]", Color::Yellow),
            Span::raw(" Navigate  "),
            key_span("[Enter]", Color::Yellow),
            Span::raw(" Detail  "),
            key_span("[c]", Color::Yellow),
            Span::raw(" Currency  "),
            key_span("[f]", Color::Yellow),
            Span::raw(" Favorite  "),
            key_span("[a]", Color::Green),
            Span::raw(" Add  "),
            key_span("[d]", Color::Red),
            Span::raw(" Delete"),
        ])
    };

    let status = Line::from(Span::styled(
        app.status.clone().unwrap_or_default(),
        Style::default().fg(Color::Gray),
    ));

    frame.render_widget(
        Paragraph::new(vec![shortcuts, status])
            .block(block)
            .alignment(Alignment::Center),
        area,
    );
}

/// Footer du mode saisie : prompt + buffer + curseur
fn render_input_footer(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Green));

    let input_line = Line::from(vec![
        Span::styled(
            app.input_prompt.as_str(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(app.input_buffer.as_str(), Style::default().fg(Color::White)),
        Span::styled(
            "█",
            Style::default().fg(Color::White).add_modifier(Modifier::SLOW_BLINK),
        ),
    ]);

    let help_line = Line::from(vec![
        key_span("[Enter]", Color::Green),
        Span::raw(" Confirm  "),
        key_span("[Esc]", Color::Red),
        Span::raw(" Cancel"),
    ]);

    frame.render_widget(
        Paragraph::new(vec![input_line, help_line]).block(block),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::SyntheticSource;
    use crate::models::Currency;

    #[test]
    fn test_card_label_loading_and_ready() {
        let mut card = StockCard::new("AAPL", true);
        let label = card_label(&card);
        assert!(label.contains('★'));
        assert!(label.contains("Loading..."));

        card.state
            .finish(SyntheticSource::new().generate_stock("AAPL", Currency::JPY));
        let label = card_label(&card);
        assert!(label.contains("AAPL"));
        assert!(label.contains('¥'));
        assert!(label.contains("(simulated)"));
    }

    #[test]
    fn test_news_item_shows_description() {
        let now = Utc::now();
        let article = SyntheticSource::new().generate_news().remove(0);
        let item = news_item(&article, now);
        assert_eq!(item.height(), 2);
    }

    #[test]
    fn test_change_color() {
        assert_eq!(change_color(0.0), Color::Green);
        assert_eq!(change_color(-0.01), Color::Red);
    }
}
