// ============================================================================
// RefreshCycle : une actualisation qui ne retourne jamais d'erreur
// ============================================================================
// Essaie la source principale, et en cas d'échec (réseau, statut HTTP,
// réponse invalide, clé absente) bascule sur SyntheticSource.
// L'échec est journalisé avec warn! puis masqué : l'appelant reçoit
// toujours un enregistrement complet.
//
// CONCEPTS RUST :
// 1. Arc<dyn MarketSource> : stratégie choisie au démarrage (live ou offline)
// 2. join_all : les quatre indices sont récupérés en parallèle
// 3. Enum de requêtes : un seul point d'entrée run() pour le poller
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, warn};

use crate::api::{MarketSource, NewsQuery, SyntheticSource};
use crate::config::Intervals;
use crate::models::{
    Currency, IndexQuote, NewsArticle, StockDetail, StockSnapshot, TimeRange, MARKET_INDICES,
};
use crate::poller::PanelId;

/// Actualisation avec repli synthétique
pub struct RefreshCycle {
    primary: Arc<dyn MarketSource>,
    fallback: SyntheticSource,
    news_query: NewsQuery,
}

impl RefreshCycle {
    pub fn new(primary: Arc<dyn MarketSource>) -> Self {
        Self {
            primary,
            fallback: SyntheticSource::new(),
            news_query: NewsQuery::default(),
        }
    }

    /// Mode hors-ligne : la source principale est elle-même synthétique
    pub fn offline() -> Self {
        Self::new(Arc::new(SyntheticSource::new()))
    }

    pub fn source_name(&self) -> &'static str {
        self.primary.name()
    }

    /// Les quatre indices, récupérés en parallèle
    ///
    /// Le repli est décidé indice par indice : un indice en échec n'entraîne
    /// pas les trois autres.
    pub async fn market_overview(&self, currency: Currency) -> Vec<IndexQuote> {
        join_all(MARKET_INDICES.iter().map(|spec| async move {
            match self.primary.index_quote(spec, currency).await {
                Ok(quote) => quote,
                Err(e) => {
                    warn!(index = spec.symbol, error = %e, "Index fetch failed, using synthetic data");
                    self.fallback.generate_index(spec, currency)
                }
            }
        }))
        .await
    }

    pub async fn stock(&self, symbol: &str, currency: Currency) -> StockSnapshot {
        match self.primary.stock(symbol, currency).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!(ticker = %symbol, error = %e, "Stock fetch failed, using synthetic data");
                self.fallback.generate_stock(symbol, currency)
            }
        }
    }

    pub async fn detail(&self, symbol: &str, range: TimeRange, currency: Currency) -> StockDetail {
        match self.primary.detail(symbol, range, currency).await {
            Ok(detail) => detail,
            Err(e) => {
                warn!(
                    ticker = %symbol,
                    range = range.label(),
                    error = %e,
                    "Detail fetch failed, using synthetic data"
                );
                self.fallback.generate_detail(symbol, range, currency)
            }
        }
    }

    pub async fn news(&self) -> Vec<NewsArticle> {
        match self.primary.news(&self.news_query).await {
            Ok(articles) => articles,
            Err(e) => {
                warn!(error = %e, "News fetch failed, using synthetic headlines");
                self.fallback.generate_news()
            }
        }
    }

    /// Exécute une requête du poller
    pub async fn run(&self, request: &RefreshRequest) -> Payload {
        debug!(source = self.source_name(), ?request, "Refreshing");

        match request {
            RefreshRequest::Overview { currency } => {
                Payload::Overview(self.market_overview(*currency).await)
            }
            RefreshRequest::Stock { symbol, currency } => {
                Payload::Stock(self.stock(symbol, *currency).await)
            }
            RefreshRequest::Detail {
                symbol,
                range,
                currency,
            } => Payload::Detail(self.detail(symbol, *range, *currency).await),
            RefreshRequest::News => Payload::News(self.news().await),
        }
    }
}

// ============================================================================
// Requêtes et résultats
// ============================================================================

/// Ce qu'un poller doit rafraîchir (ses "dépendances")
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshRequest {
    Overview {
        currency: Currency,
    },
    Stock {
        symbol: String,
        currency: Currency,
    },
    Detail {
        symbol: String,
        range: TimeRange,
        currency: Currency,
    },
    News,
}

impl RefreshRequest {
    /// Panneau alimenté par cette requête
    pub fn panel(&self) -> PanelId {
        match self {
            RefreshRequest::Overview { .. } => PanelId::Overview,
            RefreshRequest::Stock { symbol, .. } => PanelId::Stock(symbol.clone()),
            RefreshRequest::Detail { .. } => PanelId::Detail,
            RefreshRequest::News => PanelId::News,
        }
    }

    /// Période de rafraîchissement, None pour un rafraîchissement unique
    pub fn period(&self, intervals: &Intervals) -> Option<Duration> {
        match self {
            RefreshRequest::Overview { .. } => Some(intervals.indices),
            RefreshRequest::Stock { .. } => Some(intervals.stocks),
            RefreshRequest::Detail { .. } => None,
            RefreshRequest::News => Some(intervals.news),
        }
    }
}

/// Résultat d'une actualisation, toujours peuplé
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Overview(Vec<IndexQuote>),
    Stock(StockSnapshot),
    Detail(StockDetail),
    News(Vec<NewsArticle>),
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::live::tests::FakeUpstream;
    use crate::api::upstream::{ArticleWire, CandleResponse, NewsResponse};
    use crate::api::LiveSource;

    fn cycle(upstream: FakeUpstream) -> RefreshCycle {
        RefreshCycle::new(Arc::new(LiveSource::new(upstream)))
    }

    #[tokio::test]
    async fn test_stock_falls_back_when_quote_api_down() {
        let cycle = cycle(FakeUpstream::default());

        let snapshot = cycle.stock("AAPL", Currency::USD).await;

        assert_eq!(snapshot.symbol, "AAPL");
        assert!(!snapshot.live);
        assert!((50.0..=550.0).contains(&snapshot.price));
        assert!(snapshot.change_percent.is_finite());
    }

    #[tokio::test]
    async fn test_stock_uses_live_data_when_valid() {
        let cycle = cycle(FakeUpstream::with_quote(150.0, 3.0, 147.0));

        let snapshot = cycle.stock("AAPL", Currency::USD).await;

        assert!(snapshot.live);
        assert_eq!(snapshot.price, 150.0);
        assert!((snapshot.change_percent - 3.0 / 147.0 * 100.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_live_fx_failure_is_not_a_fallback() {
        // Quote valide, Fixer en panne : reste live, non converti
        let cycle = cycle(FakeUpstream::with_quote(100.0, 0.0, 100.0));

        let snapshot = cycle.stock("AAPL", Currency::EUR).await;

        assert!(snapshot.live);
        assert_eq!(snapshot.price, 100.0);
        assert_eq!(snapshot.currency.format_price(snapshot.price), "€100.00");
    }

    #[tokio::test]
    async fn test_overview_falls_back_per_index() {
        let cycle = cycle(FakeUpstream::default());

        let overview = cycle.market_overview(Currency::USD).await;

        assert_eq!(overview.len(), 4);
        for (quote, spec) in overview.iter().zip(MARKET_INDICES.iter()) {
            assert_eq!(quote.symbol, spec.symbol);
            assert!(!quote.live);
            assert!((quote.value - spec.base_value).abs() <= 1.0);
        }
    }

    #[tokio::test]
    async fn test_detail_falls_back_on_no_data() {
        let mut upstream = FakeUpstream::with_quote(150.0, 3.0, 147.0);
        upstream.candles = Some(CandleResponse {
            s: "no_data".to_string(),
            ..Default::default()
        });
        let cycle = cycle(upstream);

        let detail = cycle.detail("MSFT", TimeRange::OneWeek, Currency::USD).await;

        assert!(!detail.live);
        assert_eq!(detail.history.len(), 7);
        assert_eq!(detail.info.name, "MSFT Corporation");
    }

    #[tokio::test]
    async fn test_news_fallback_on_empty_list() {
        let mut upstream = FakeUpstream::default();
        upstream.news = Some(NewsResponse {
            articles: Some(Vec::<ArticleWire>::new()),
        });
        let cycle = cycle(upstream);

        let news = cycle.news().await;

        assert_eq!(news.len(), 3);
        assert_eq!(news[0].source, "Financial Times");
    }

    #[tokio::test]
    async fn test_run_dispatches_on_request() {
        let cycle = RefreshCycle::offline();
        assert_eq!(cycle.source_name(), "synthetic");

        let request = RefreshRequest::Stock {
            symbol: "TSLA".to_string(),
            currency: Currency::GBP,
        };
        match cycle.run(&request).await {
            Payload::Stock(snapshot) => {
                assert_eq!(snapshot.symbol, "TSLA");
                assert_eq!(snapshot.currency, Currency::GBP);
            }
            other => panic!("unexpected payload: {:?}", other),
        }

        assert!(matches!(cycle.run(&RefreshRequest::News).await, Payload::News(n) if n.len() == 3));
    }

    #[test]
    fn test_request_panel_and_period() {
        let intervals = Intervals::default();

        let stock = RefreshRequest::Stock {
            symbol: "AAPL".to_string(),
            currency: Currency::USD,
        };
        assert_eq!(stock.panel(), PanelId::Stock("AAPL".to_string()));
        assert_eq!(stock.period(&intervals), Some(Duration::from_secs(15)));

        let detail = RefreshRequest::Detail {
            symbol: "AAPL".to_string(),
            range: TimeRange::OneMonth,
            currency: Currency::USD,
        };
        assert_eq!(detail.panel(), PanelId::Detail);
        assert_eq!(detail.period(&intervals), None);

        assert_eq!(RefreshRequest::News.period(&intervals), Some(Duration::from_secs(300)));
    }
}
