// ============================================================================
// Module : models
// ============================================================================
// Ce module contient toutes les structures de données du dashboard
//
// CONCEPT RUST : Modules et visibilité
// - "pub mod" : déclare un sous-module publique (accessible depuis l'extérieur)
// - Sans "pub", le module serait privé au crate
// ============================================================================

pub mod currency; // Devises, symboles et formatage
pub mod history;  // Historique de prix et vue détaillée
pub mod news;     // Articles de presse
pub mod quote;    // Cotations d'indices et d'actions

// Re-export des structures principales pour simplifier les imports
// Au lieu de : use stockdash::models::quote::IndexQuote;
// On peut faire : use stockdash::models::IndexQuote;
pub use currency::{format_percent, format_volume, Currency};
pub use history::{CompanyInfo, HistoricalPoint, Performance, StockDetail, TimeRange};
pub use news::{format_time_ago, NewsArticle};
pub use quote::{change_percent, market_cap_label, IndexQuote, IndexSpec, StockSnapshot, MARKET_INDICES};
