// ============================================================================
// SyntheticSource : données de secours générées aléatoirement
// ============================================================================
// Utilisée quand un appel live échoue : le dashboard affiche toujours
// quelque chose de plausible, jamais un état d'erreur.
//
// POLITIQUE DE CONVERSION (chemin fallback) :
// - Toujours la table statique Currency::fallback_rate(), jamais Fixer
//
// CONCEPTS RUST :
// 1. Génériques sur R: Rng : les tests peuvent injecter un RNG seedé
// 2. gen_range : tirage uniforme dans un intervalle
// ============================================================================

use async_trait::async_trait;
use chrono::{Duration, Utc};
use rand::Rng;

use crate::api::upstream::NewsQuery;
use crate::api::MarketSource;
use crate::error::FetchResult;
use crate::models::{
    change_percent, CompanyInfo, Currency, HistoricalPoint, IndexQuote, IndexSpec, NewsArticle,
    StockDetail, StockSnapshot, TimeRange,
};

/// Prix plancher de la marche aléatoire de l'historique (USD)
const MIN_HISTORY_PRICE: f64 = 10.0;

/// Générateur de données synthétiques (sans état)
#[derive(Debug, Clone, Copy, Default)]
pub struct SyntheticSource;

impl SyntheticSource {
    pub fn new() -> Self {
        Self
    }

    /// Indice : valeur de base ± 1, variation de base ± la même perturbation
    pub fn generate_index(&self, spec: &IndexSpec, currency: Currency) -> IndexQuote {
        generate_index_with(&mut rand::thread_rng(), spec, currency)
    }

    /// Action : prix dans [50, 550) USD, variation dans [-10, 10) USD
    pub fn generate_stock(&self, symbol: &str, currency: Currency) -> StockSnapshot {
        generate_stock_with(&mut rand::thread_rng(), symbol, currency)
    }

    /// Vue détaillée : marche aléatoire d'un point par jour
    pub fn generate_detail(&self, symbol: &str, range: TimeRange, currency: Currency) -> StockDetail {
        generate_detail_with(&mut rand::thread_rng(), symbol, range, currency)
    }

    /// Trois titres fixes, publiés maintenant, il y a 1 h et il y a 2 h
    pub fn generate_news(&self) -> Vec<NewsArticle> {
        let now = Utc::now();
        let article = |title: &str, description: &str, source: &str, hours_ago: i64| NewsArticle {
            title: title.to_string(),
            description: description.to_string(),
            source: source.to_string(),
            published_at: now - Duration::hours(hours_ago),
            url: "#".to_string(),
        };

        vec![
            article(
                "Federal Reserve Signals Potential Rate Changes",
                "The Federal Reserve indicated possible adjustments to interest rates following recent economic indicators.",
                "Financial Times",
                0,
            ),
            article(
                "Tech Stocks Rally on AI Developments",
                "Major technology companies see significant gains as artificial intelligence innovations continue.",
                "MarketWatch",
                1,
            ),
            article(
                "Energy Sector Shows Resilience",
                "Oil and gas companies demonstrate strong quarterly performance despite global uncertainties.",
                "Reuters",
                2,
            ),
        ]
    }
}

fn generate_index_with<R: Rng>(rng: &mut R, spec: &IndexSpec, currency: Currency) -> IndexQuote {
    let variation = rng.gen_range(-1.0..1.0);
    let value = spec.base_value + variation;
    let change = spec.base_change + variation;

    let rate = currency.fallback_rate();
    IndexQuote::new(spec, value * rate, change * rate, currency, false)
}

fn generate_stock_with<R: Rng>(rng: &mut R, symbol: &str, currency: Currency) -> StockSnapshot {
    let base_price: f64 = rng.gen_range(50.0..550.0);
    let change: f64 = rng.gen_range(-10.0..10.0);

    let rate = currency.fallback_rate();
    let (price, change_converted) = (base_price * rate, change * rate);

    StockSnapshot {
        symbol: symbol.to_string(),
        price,
        change: change_converted,
        change_percent: change_percent(price, change_converted),
        volume: rng.gen_range(1_000_000..11_000_000),
        market_cap: format!("{:.1}B", rng.gen_range(100.0..2100.0)),
        previous_close: (base_price - change) * rate,
        currency,
        live: false,
    }
}

fn generate_detail_with<R: Rng>(
    rng: &mut R,
    symbol: &str,
    range: TimeRange,
    currency: Currency,
) -> StockDetail {
    let rate = currency.fallback_rate();
    let days = range.to_days() as i64;
    let today = Utc::now().date_naive();

    // Marche aléatoire : le dernier point est hier
    let mut walk: f64 = rng.gen_range(50.0..250.0);
    let history: Vec<HistoricalPoint> = (0..days)
        .map(|i| {
            walk += rng.gen_range(-5.0..5.0);
            let price = walk.max(MIN_HISTORY_PRICE) * rate;
            let volume = rng.gen_range(1_000_000..11_000_000);
            HistoricalPoint::new(today - Duration::days(days - i), price, volume)
        })
        .collect();

    let current_price = history.last().map(|p| p.price).unwrap_or(0.0);
    let previous_close = match history.len() {
        n if n >= 2 => history[n - 2].price,
        _ => current_price,
    };
    let change = current_price - previous_close;

    StockDetail {
        symbol: symbol.to_string(),
        range,
        currency,
        history,
        info: CompanyInfo {
            name: format!("{} Corporation", symbol),
            country: "US".to_string(),
            listing_currency: "USD".to_string(),
            industry: "Technology".to_string(),
            market_cap_millions: Some(rng.gen_range(1_000.0..2_000_000.0)),
            pe_ratio: Some(rng.gen_range(5.0..35.0)),
        },
        current_price,
        change,
        change_percent: change_percent(current_price, change),
        previous_close,
        live: false,
    }
}

/// SyntheticSource comme stratégie à part entière (mode hors-ligne)
///
/// Ne retourne jamais d'erreur.
#[async_trait]
impl MarketSource for SyntheticSource {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    async fn index_quote(&self, spec: &IndexSpec, currency: Currency) -> FetchResult<IndexQuote> {
        Ok(self.generate_index(spec, currency))
    }

    async fn stock(&self, symbol: &str, currency: Currency) -> FetchResult<StockSnapshot> {
        Ok(self.generate_stock(symbol, currency))
    }

    async fn detail(
        &self,
        symbol: &str,
        range: TimeRange,
        currency: Currency,
    ) -> FetchResult<StockDetail> {
        Ok(self.generate_detail(symbol, range, currency))
    }

    async fn news(&self, _query: &NewsQuery) -> FetchResult<Vec<NewsArticle>> {
        Ok(self.generate_news())
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MARKET_INDICES;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_synthetic_stock_usd_range() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..1000 {
            let snap = generate_stock_with(&mut rng, "AAPL", Currency::USD);
            assert!((50.0..=550.0).contains(&snap.price), "price {}", snap.price);
            assert!(snap.change_percent.is_finite());
            assert!((1_000_000..11_000_000).contains(&snap.volume));
            assert!(snap.market_cap.ends_with('B'));
            assert!(!snap.live);
        }
    }

    #[test]
    fn test_synthetic_stock_uses_static_rate() {
        let mut usd_rng = StdRng::seed_from_u64(7);
        let mut jpy_rng = StdRng::seed_from_u64(7);

        let usd = generate_stock_with(&mut usd_rng, "AAPL", Currency::USD);
        let jpy = generate_stock_with(&mut jpy_rng, "AAPL", Currency::JPY);

        assert!((jpy.price - usd.price * 110.0).abs() < 1e-6);
        assert!((jpy.change - usd.change * 110.0).abs() < 1e-6);
        assert!((jpy.previous_close - usd.previous_close * 110.0).abs() < 1e-6);
        // Le % ne dépend pas de la devise
        assert!((jpy.change_percent - usd.change_percent).abs() < 1e-9);
    }

    #[test]
    fn test_synthetic_percent_formula() {
        let mut rng = StdRng::seed_from_u64(1);
        let snap = generate_stock_with(&mut rng, "TSLA", Currency::EUR);
        let expected = snap.change / (snap.price - snap.change) * 100.0;
        assert!((snap.change_percent - expected).abs() < 1e-9);
    }

    #[test]
    fn test_synthetic_index_anchored_on_base() {
        let mut rng = StdRng::seed_from_u64(3);
        for spec in MARKET_INDICES.iter() {
            let quote = generate_index_with(&mut rng, spec, Currency::USD);
            assert!((quote.value - spec.base_value).abs() <= 1.0);
            assert!((quote.change - spec.base_change).abs() <= 1.0);
            // value - change reste égal à base_value - base_change
            let base = spec.base_value - spec.base_change;
            let expected = quote.change / base * 100.0;
            assert!((quote.change_percent - expected).abs() < 1e-6);
        }
    }

    #[test]
    fn test_synthetic_detail_points() {
        let mut rng = StdRng::seed_from_u64(9);
        for range in TimeRange::ALL {
            let detail = generate_detail_with(&mut rng, "MSFT", range, Currency::GBP);
            assert_eq!(detail.history.len(), range.to_days() as usize);
            assert_eq!(detail.info.name, "MSFT Corporation");

            // Ordonné du plus ancien au plus récent, dernier point = hier
            assert!(detail.history.windows(2).all(|w| w[0].date < w[1].date));
            let yesterday = Utc::now().date_naive() - Duration::days(1);
            assert_eq!(detail.history.last().unwrap().date, yesterday);

            // Plancher à 10 $ converti en GBP
            assert!(detail.history.iter().all(|p| p.price >= MIN_HISTORY_PRICE * 0.73 - 1e-9));
            assert!(detail.change_percent.is_finite());
        }
    }

    #[test]
    fn test_synthetic_news() {
        let news = SyntheticSource::new().generate_news();
        assert_eq!(news.len(), 3);
        assert!(news[0].published_at > news[1].published_at);
        assert!(news[1].published_at > news[2].published_at);
    }
}
