// ============================================================================
// Structure : App
// ============================================================================
// État du dashboard, possédé par la boucle UI
//
// - Les pollers ne touchent jamais App : ils publient des PanelUpdate,
//   que la boucle UI applique avec apply_update()
// - Les actions utilisateur qui changent une dépendance (devise, période,
//   symbole) retournent des PollCommand à exécuter par le Scheduler
//
// CONCEPTS RUST :
// 1. State Management : tout l'état affiché dans une seule structure
// 2. Enum générique PanelState<T> : Loading / Ready pour chaque panneau
// 3. Générations : une mise à jour périmée est ignorée
// ============================================================================

use std::collections::HashMap;

use anyhow::Result;
use tracing::{debug, info};

use crate::favorites::FavoriteStore;
use crate::models::{Currency, IndexQuote, NewsArticle, StockDetail, StockSnapshot, TimeRange};
use crate::poller::{PanelEvent, PanelId, PanelUpdate, PollCommand};
use crate::refresh::{Payload, RefreshRequest};

/// Écrans de l'application
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Screen {
    /// Indices, cartes d'actions, actualités
    Dashboard,

    /// Vue détaillée de l'action sélectionnée
    Detail,

    /// Saisie d'un nouveau ticker
    InputMode,
}

// ============================================================================
// PanelState
// ============================================================================
// CONCEPT : Loading garde les dernières données
// - Loading(None) : premier chargement, rien à afficher
// - Loading(Some(t)) : rafraîchissement en cours, on affiche t en attendant
// - Ready(t) : données à jour
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub enum PanelState<T> {
    Loading(Option<T>),
    Ready(T),
}

impl<T> Default for PanelState<T> {
    fn default() -> Self {
        PanelState::Loading(None)
    }
}

impl<T> PanelState<T> {
    /// Ready -> Loading, en conservant les données
    pub fn start_loading(&mut self) {
        let previous = std::mem::take(self);
        *self = match previous {
            PanelState::Ready(data) => PanelState::Loading(Some(data)),
            loading => loading,
        };
    }

    pub fn finish(&mut self, data: T) {
        *self = PanelState::Ready(data);
    }

    pub fn reset(&mut self) {
        *self = PanelState::Loading(None);
    }

    pub fn data(&self) -> Option<&T> {
        match self {
            PanelState::Loading(data) => data.as_ref(),
            PanelState::Ready(data) => Some(data),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, PanelState::Loading(_))
    }
}

/// Une carte d'action du dashboard
#[derive(Debug, Clone, PartialEq)]
pub struct StockCard {
    pub symbol: String,
    pub favorite: bool,
    pub state: PanelState<StockSnapshot>,
}

impl StockCard {
    pub fn new(symbol: impl Into<String>, favorite: bool) -> Self {
        Self {
            symbol: symbol.into(),
            favorite,
            state: PanelState::default(),
        }
    }
}

/// État principal de l'application
pub struct App {
    pub running: bool,
    pub current_screen: Screen,

    /// Devise d'affichage (touche 'c')
    pub currency: Currency,

    /// Période de la vue détaillée (touches h / l)
    pub range: TimeRange,

    pub overview: PanelState<Vec<IndexQuote>>,
    pub stocks: Vec<StockCard>,
    pub selected_index: usize,

    /// Symbole affiché dans la vue détaillée (None si fermée)
    pub detail_symbol: Option<String>,
    pub detail: PanelState<StockDetail>,

    pub news: PanelState<Vec<NewsArticle>>,

    /// Two-step quit : première pression de 'q' arme, la seconde quitte
    pub confirm_quit: bool,

    /// Two-step delete, même principe avec 'd'
    pub confirm_delete: bool,

    pub input_buffer: String,
    pub input_prompt: String,

    /// Message affiché dans le footer (erreur de favoris, doublon...)
    pub status: Option<String>,

    /// Génération courante de chaque panneau actif
    generations: HashMap<PanelId, u64>,
}

impl App {
    /// Crée l'App avec les tickers de départ
    ///
    /// `favorites` : liste chargée depuis le FavoriteStore, pour les étoiles.
    pub fn new(symbols: &[String], currency: Currency, favorites: &[String]) -> Self {
        let stocks = symbols
            .iter()
            .map(|symbol| StockCard::new(symbol.clone(), favorites.contains(symbol)))
            .collect();

        Self {
            running: true,
            current_screen: Screen::Dashboard,
            currency,
            range: TimeRange::default(),
            overview: PanelState::default(),
            stocks,
            selected_index: 0,
            detail_symbol: None,
            detail: PanelState::default(),
            news: PanelState::default(),
            confirm_quit: false,
            confirm_delete: false,
            input_buffer: String::new(),
            input_prompt: String::new(),
            status: None,
            generations: HashMap::new(),
        }
    }

    /// Pollers à lancer au démarrage : indices, une carte par ticker, actualités
    pub fn startup_commands(&self) -> Vec<PollCommand> {
        let mut commands = vec![PollCommand::Start(self.overview_request())];
        commands.extend(
            self.stocks
                .iter()
                .map(|card| PollCommand::Start(self.stock_request(&card.symbol))),
        );
        commands.push(PollCommand::Start(RefreshRequest::News));
        commands
    }

    fn overview_request(&self) -> RefreshRequest {
        RefreshRequest::Overview {
            currency: self.currency,
        }
    }

    fn stock_request(&self, symbol: &str) -> RefreshRequest {
        RefreshRequest::Stock {
            symbol: symbol.to_string(),
            currency: self.currency,
        }
    }

    fn detail_request(&self) -> Option<RefreshRequest> {
        self.detail_symbol.as_ref().map(|symbol| RefreshRequest::Detail {
            symbol: symbol.clone(),
            range: self.range,
            currency: self.currency,
        })
    }

    // ========================================================================
    // Mises à jour des pollers
    // ========================================================================

    /// Enregistre la génération d'un poller qui vient de (re)démarrer
    pub fn begin_panel(&mut self, panel: PanelId, generation: u64) {
        self.generations.insert(panel, generation);
    }

    /// Oublie un panneau arrêté : ses mises à jour en vol seront ignorées
    pub fn end_panel(&mut self, panel: &PanelId) {
        self.generations.remove(panel);
    }

    pub fn generation_of(&self, panel: &PanelId) -> Option<u64> {
        self.generations.get(panel).copied()
    }

    /// Applique une mise à jour ; retourne false si elle est périmée
    pub fn apply_update(&mut self, update: PanelUpdate) -> bool {
        if self.generations.get(&update.panel) != Some(&update.generation) {
            debug!(
                panel = ?update.panel,
                generation = update.generation,
                "Ignoring stale update"
            );
            return false;
        }

        match (update.panel, update.event) {
            (PanelId::Overview, PanelEvent::Loading) => self.overview.start_loading(),
            (PanelId::Overview, PanelEvent::Ready(Payload::Overview(quotes))) => {
                self.overview.finish(quotes)
            }

            (PanelId::Stock(symbol), event) => {
                let Some(card) = self.stocks.iter_mut().find(|c| c.symbol == symbol) else {
                    return false;
                };
                match event {
                    PanelEvent::Loading => card.state.start_loading(),
                    PanelEvent::Ready(Payload::Stock(snapshot)) => card.state.finish(snapshot),
                    PanelEvent::Ready(_) => return false,
                }
            }

            (PanelId::Detail, PanelEvent::Loading) => self.detail.start_loading(),
            (PanelId::Detail, PanelEvent::Ready(Payload::Detail(detail))) => {
                self.detail.finish(detail)
            }

            (PanelId::News, PanelEvent::Loading) => self.news.start_loading(),
            (PanelId::News, PanelEvent::Ready(Payload::News(articles))) => {
                self.news.finish(articles)
            }

            (panel, PanelEvent::Ready(_)) => {
                debug!(panel = ?panel, "Payload does not match panel");
                return false;
            }
        }

        true
    }

    // ========================================================================
    // Changements de dépendances
    // ========================================================================

    /// Devise suivante : redémarre tous les panneaux qui en dépendent
    pub fn cycle_currency(&mut self) -> Vec<PollCommand> {
        self.currency = self.currency.next();
        info!(currency = %self.currency, "Currency changed");

        let mut commands = vec![PollCommand::Start(self.overview_request())];
        commands.extend(
            self.stocks
                .iter()
                .map(|card| PollCommand::Start(self.stock_request(&card.symbol))),
        );
        commands.extend(self.detail_request().map(PollCommand::Start));
        commands
    }

    /// Ouvre la vue détaillée du ticker sélectionné
    pub fn open_detail(&mut self) -> Vec<PollCommand> {
        let Some(symbol) = self.selected_symbol().map(str::to_string) else {
            return Vec::new();
        };

        info!(ticker = %symbol, "Opening detail view");
        self.detail_symbol = Some(symbol);
        self.detail.reset();
        self.current_screen = Screen::Detail;
        self.detail_request().map(PollCommand::Start).into_iter().collect()
    }

    pub fn close_detail(&mut self) -> Vec<PollCommand> {
        self.current_screen = Screen::Dashboard;
        if self.detail_symbol.take().is_none() {
            return Vec::new();
        }

        self.detail.reset();
        self.end_panel(&PanelId::Detail);
        vec![PollCommand::Stop(PanelId::Detail)]
    }

    pub fn next_range(&mut self) -> Vec<PollCommand> {
        self.change_range(self.range.next())
    }

    pub fn previous_range(&mut self) -> Vec<PollCommand> {
        self.change_range(self.range.previous())
    }

    fn change_range(&mut self, range: TimeRange) -> Vec<PollCommand> {
        self.range = range;
        info!(range = range.label(), "Time range changed");
        self.detail_request().map(PollCommand::Start).into_iter().collect()
    }

    /// Ajoute une carte ; ignore les symboles vides ou déjà présents
    pub fn add_stock(&mut self, raw: &str, favorites: &dyn FavoriteStore) -> Vec<PollCommand> {
        let symbol = raw.trim().to_uppercase();
        if symbol.is_empty() {
            debug!("Empty ticker symbol, ignoring");
            return Vec::new();
        }
        if self.stocks.iter().any(|card| card.symbol == symbol) {
            self.status = Some(format!("{} is already on the dashboard", symbol));
            return Vec::new();
        }

        // Favori inconnu si le fichier est illisible : pas d'étoile
        let favorite = favorites.contains(&symbol).unwrap_or(false);
        info!(ticker = %symbol, "Ticker added");
        self.stocks.push(StockCard::new(symbol.clone(), favorite));
        vec![PollCommand::Start(self.stock_request(&symbol))]
    }

    /// Supprime la carte sélectionnée et arrête son poller
    pub fn delete_selected(&mut self) -> Vec<PollCommand> {
        self.confirm_delete = false;
        if self.selected_index >= self.stocks.len() {
            return Vec::new();
        }

        let card = self.stocks.remove(self.selected_index);
        if self.selected_index >= self.stocks.len() && self.selected_index > 0 {
            self.selected_index -= 1;
        }

        info!(ticker = %card.symbol, "Ticker removed");
        let panel = PanelId::Stock(card.symbol);
        self.end_panel(&panel);
        vec![PollCommand::Stop(panel)]
    }

    /// Toggle du favori sélectionné, persisté immédiatement
    pub fn toggle_favorite(&mut self, favorites: &dyn FavoriteStore) -> Result<bool> {
        let Some(card) = self.stocks.get_mut(self.selected_index) else {
            return Ok(false);
        };

        let favorite = favorites.toggle(&card.symbol)?;
        card.favorite = favorite;
        Ok(favorite)
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    pub fn navigate_up(&mut self) {
        self.selected_index = self.selected_index.saturating_sub(1);
    }

    pub fn navigate_down(&mut self) {
        let max_index = self.stocks.len().saturating_sub(1);
        self.selected_index = (self.selected_index + 1).min(max_index);
    }

    pub fn selected_card(&self) -> Option<&StockCard> {
        self.stocks.get(self.selected_index)
    }

    pub fn selected_symbol(&self) -> Option<&str> {
        self.selected_card().map(|card| card.symbol.as_str())
    }

    pub fn is_on_dashboard(&self) -> bool {
        self.current_screen == Screen::Dashboard
    }

    pub fn is_on_detail(&self) -> bool {
        self.current_screen == Screen::Detail
    }

    pub fn is_in_input_mode(&self) -> bool {
        self.current_screen == Screen::InputMode
    }

    // ========================================================================
    // Quit / delete / saisie
    // ========================================================================

    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn request_quit(&mut self) {
        self.confirm_quit = true;
    }

    pub fn request_delete(&mut self) {
        self.confirm_delete = true;
    }

    /// Toute autre touche annule les confirmations en attente
    pub fn cancel_confirmations(&mut self) {
        self.confirm_quit = false;
        self.confirm_delete = false;
    }

    pub fn start_input(&mut self, prompt: &str) {
        self.current_screen = Screen::InputMode;
        self.input_buffer.clear();
        self.input_prompt = prompt.to_string();
    }

    pub fn cancel_input(&mut self) {
        self.current_screen = Screen::Dashboard;
        self.input_buffer.clear();
        self.input_prompt.clear();
    }

    /// Retourne la saisie et revient au dashboard
    pub fn submit_input(&mut self) -> String {
        let value = std::mem::take(&mut self.input_buffer);
        self.current_screen = Screen::Dashboard;
        self.input_prompt.clear();
        value
    }

    pub fn append_char(&mut self, c: char) {
        self.input_buffer.push(c);
    }

    pub fn backspace(&mut self) {
        self.input_buffer.pop();
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::SyntheticSource;
    use crate::favorites::MemoryFavorites;

    fn symbols(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn app() -> App {
        App::new(&symbols(&["AAPL", "TSLA", "MSFT"]), Currency::USD, &symbols(&["TSLA"]))
    }

    fn ready_stock(panel: &PanelId, generation: u64, symbol: &str) -> PanelUpdate {
        PanelUpdate {
            panel: panel.clone(),
            generation,
            event: PanelEvent::Ready(Payload::Stock(
                SyntheticSource::new().generate_stock(symbol, Currency::USD),
            )),
        }
    }

    #[test]
    fn test_app_creation() {
        let app = app();
        assert!(app.is_running());
        assert_eq!(app.stocks.len(), 3);
        assert!(!app.stocks[0].favorite);
        assert!(app.stocks[1].favorite);
        assert!(app.overview.is_loading());
        assert!(app.overview.data().is_none());
    }

    #[test]
    fn test_startup_commands() {
        let commands = app().startup_commands();
        // Indices + 3 cartes + actualités
        assert_eq!(commands.len(), 5);
        assert_eq!(
            commands[0],
            PollCommand::Start(RefreshRequest::Overview {
                currency: Currency::USD
            })
        );
        assert_eq!(commands[4], PollCommand::Start(RefreshRequest::News));
    }

    #[test]
    fn test_panel_state_keeps_data_while_loading() {
        let mut state: PanelState<u32> = PanelState::default();
        assert_eq!(state.data(), None);

        state.finish(7);
        assert!(!state.is_loading());

        state.start_loading();
        assert!(state.is_loading());
        assert_eq!(state.data(), Some(&7));
    }

    #[test]
    fn test_apply_update_ignores_stale_generation() {
        let mut app = app();
        let panel = PanelId::Stock("AAPL".to_string());

        app.begin_panel(panel.clone(), 1);
        app.begin_panel(panel.clone(), 2);

        // Réponse de l'ancien poller : ignorée
        assert!(!app.apply_update(ready_stock(&panel, 1, "AAPL")));
        assert!(app.stocks[0].state.data().is_none());

        assert!(app.apply_update(ready_stock(&panel, 2, "AAPL")));
        assert_eq!(app.stocks[0].state.data().unwrap().symbol, "AAPL");
    }

    #[test]
    fn test_apply_update_for_unknown_panel() {
        let mut app = app();
        assert!(!app.apply_update(ready_stock(&PanelId::Stock("AAPL".to_string()), 1, "AAPL")));
    }

    #[test]
    fn test_loading_then_ready_cycle() {
        let mut app = app();
        app.begin_panel(PanelId::News, 3);

        let loading = PanelUpdate {
            panel: PanelId::News,
            generation: 3,
            event: PanelEvent::Loading,
        };
        let ready = PanelUpdate {
            panel: PanelId::News,
            generation: 3,
            event: PanelEvent::Ready(Payload::News(SyntheticSource::new().generate_news())),
        };

        assert!(app.apply_update(loading.clone()));
        assert!(app.news.is_loading());
        assert!(app.apply_update(ready));
        assert_eq!(app.news.data().unwrap().len(), 3);
        assert!(app.apply_update(loading));
        assert!(app.news.is_loading());
        assert_eq!(app.news.data().unwrap().len(), 3);
    }

    #[test]
    fn test_cycle_currency_restarts_dependents() {
        let mut app = app();
        let commands = app.cycle_currency();

        assert_eq!(app.currency, Currency::EUR);
        // Indices + 3 cartes, pas de détail (fermé), pas d'actualités
        assert_eq!(commands.len(), 4);
        assert!(commands.iter().all(|c| matches!(
            c,
            PollCommand::Start(RefreshRequest::Overview { currency: Currency::EUR })
                | PollCommand::Start(RefreshRequest::Stock { currency: Currency::EUR, .. })
        )));

        app.open_detail();
        let commands = app.cycle_currency();
        assert_eq!(commands.len(), 5);
        assert!(commands.iter().any(|c| matches!(
            c,
            PollCommand::Start(RefreshRequest::Detail { currency: Currency::GBP, .. })
        )));
    }

    #[test]
    fn test_detail_open_range_close() {
        let mut app = app();
        app.navigate_down();

        let commands = app.open_detail();
        assert!(app.is_on_detail());
        assert_eq!(
            commands,
            vec![PollCommand::Start(RefreshRequest::Detail {
                symbol: "TSLA".to_string(),
                range: TimeRange::OneMonth,
                currency: Currency::USD,
            })]
        );

        let commands = app.next_range();
        assert_eq!(app.range, TimeRange::ThreeMonths);
        assert!(matches!(
            &commands[0],
            PollCommand::Start(RefreshRequest::Detail { range: TimeRange::ThreeMonths, .. })
        ));

        app.begin_panel(PanelId::Detail, 9);
        let commands = app.close_detail();
        assert!(app.is_on_dashboard());
        assert_eq!(commands, vec![PollCommand::Stop(PanelId::Detail)]);
        assert_eq!(app.generation_of(&PanelId::Detail), None);

        // Range change sans vue ouverte : rien à relancer
        assert!(app.previous_range().is_empty());
    }

    #[test]
    fn test_add_and_delete_stock() {
        let mut app = app();
        let favorites = MemoryFavorites::with_symbols(&["NVDA"]);

        let commands = app.add_stock(" nvda ", &favorites);
        assert_eq!(commands.len(), 1);
        assert_eq!(app.stocks.len(), 4);
        assert!(app.stocks[3].favorite);

        // Doublon : refusé
        assert!(app.add_stock("AAPL", &favorites).is_empty());
        assert!(app.status.is_some());
        assert!(app.add_stock("   ", &favorites).is_empty());

        app.selected_index = 3;
        app.begin_panel(PanelId::Stock("NVDA".to_string()), 4);
        let commands = app.delete_selected();
        assert_eq!(commands, vec![PollCommand::Stop(PanelId::Stock("NVDA".to_string()))]);
        assert_eq!(app.stocks.len(), 3);
        assert_eq!(app.selected_index, 2);
    }

    #[test]
    fn test_toggle_favorite_persists() {
        let mut app = app();
        let favorites = MemoryFavorites::new();

        assert!(app.toggle_favorite(&favorites).unwrap());
        assert!(app.stocks[0].favorite);
        assert!(favorites.contains("AAPL").unwrap());

        assert!(!app.toggle_favorite(&favorites).unwrap());
        assert!(!app.stocks[0].favorite);
    }

    #[test]
    fn test_navigation() {
        let mut app = app();

        app.navigate_up();
        assert_eq!(app.selected_index, 0);

        app.navigate_down();
        app.navigate_down();
        app.navigate_down();
        assert_eq!(app.selected_index, 2);
        assert_eq!(app.selected_symbol(), Some("MSFT"));
    }

    #[test]
    fn test_input_mode() {
        let mut app = app();
        app.start_input("Add ticker: ");
        assert!(app.is_in_input_mode());

        app.append_char('g');
        app.append_char('e');
        app.backspace();
        assert_eq!(app.submit_input(), "g");
        assert!(app.is_on_dashboard());
        assert!(app.input_buffer.is_empty());
    }
}
