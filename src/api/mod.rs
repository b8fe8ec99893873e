// ============================================================================
// Module : api
// ============================================================================
// Sources de données du dashboard :
// - upstream  : transport HTTP brut (Finnhub, Fixer, NewsAPI)
// - live      : validation + conversion live au-dessus d'un Upstream
// - synthetic : données aléatoires de secours (jamais en erreur)
//
// CONCEPT RUST : Trait objet async
// - async_trait permet `Arc<dyn MarketSource>` malgré les méthodes async
// - Send + Sync : la source est partagée entre les tâches tokio
// ============================================================================

pub mod live;      // Source live
pub mod synthetic; // Source de secours
pub mod upstream;  // Client HTTP

use async_trait::async_trait;

use crate::error::FetchResult;
use crate::models::{Currency, IndexQuote, IndexSpec, NewsArticle, StockDetail, StockSnapshot, TimeRange};

pub use live::LiveSource;
pub use synthetic::SyntheticSource;
pub use upstream::{HttpUpstream, NewsQuery, Upstream};

/// Stratégie de récupération des données affichées
///
/// Une seule tentative par appel : pas de retry ici, le prochain tick du
/// poller fait office de nouvelle tentative.
#[async_trait]
pub trait MarketSource: Send + Sync {
    /// Nom court pour les logs ("live", "synthetic")
    fn name(&self) -> &'static str;

    async fn index_quote(&self, spec: &IndexSpec, currency: Currency) -> FetchResult<IndexQuote>;

    async fn stock(&self, symbol: &str, currency: Currency) -> FetchResult<StockSnapshot>;

    async fn detail(
        &self,
        symbol: &str,
        range: TimeRange,
        currency: Currency,
    ) -> FetchResult<StockDetail>;

    async fn news(&self, query: &NewsQuery) -> FetchResult<Vec<NewsArticle>>;
}
