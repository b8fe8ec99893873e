// ============================================================================
// LiveSource : données réelles via Finnhub / Fixer / NewsAPI
// ============================================================================
// Valide les réponses brutes de l'Upstream, applique le taux de change live
// et construit les view models.
//
// POLITIQUE DE CONVERSION (chemin live) :
// - USD : aucun appel Fixer
// - Autre devise : un appel Fixer ; en cas d'échec, les valeurs restent
//   en USD (non converties) mais s'affichent avec le symbole demandé
// - La table statique n'est JAMAIS appliquée ici (voir SyntheticSource)
// ============================================================================

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, warn};

use crate::api::upstream::{CandleResponse, NewsQuery, ProfileResponse, QuoteResponse, Upstream};
use crate::api::MarketSource;
use crate::error::{FetchError, FetchResult};
use crate::models::{
    change_percent, market_cap_label, CompanyInfo, Currency, HistoricalPoint, IndexQuote,
    IndexSpec, NewsArticle, StockDetail, StockSnapshot, TimeRange,
};

/// Résolution des bougies pour la vue détaillée (journalière)
const CANDLE_RESOLUTION: &str = "D";

const SECONDS_PER_DAY: i64 = 24 * 60 * 60;

/// Source live au-dessus d'un transport `Upstream`
pub struct LiveSource<U> {
    upstream: U,
}

impl<U: Upstream> LiveSource<U> {
    pub fn new(upstream: U) -> Self {
        Self { upstream }
    }

    /// Taux USD -> devise, ou 1.0 si la conversion échoue
    ///
    /// CONCEPT : Best-effort
    /// - L'échec est journalisé puis avalé
    /// - L'appelant ne sait pas si la conversion a eu lieu : c'est voulu,
    ///   rien n'est montré à l'utilisateur
    async fn live_rate(&self, currency: Currency) -> f64 {
        if currency.is_usd() {
            return 1.0;
        }

        match self.fetch_rate(currency).await {
            Ok(rate) => {
                debug!(currency = %currency, rate, "Live exchange rate");
                rate
            }
            Err(e) => {
                warn!(currency = %currency, error = %e, "Currency conversion failed, keeping USD values");
                1.0
            }
        }
    }

    async fn fetch_rate(&self, currency: Currency) -> FetchResult<f64> {
        let fx = self.upstream.fx_rates(currency).await.map_err(|e| FetchError::Conversion {
            currency: currency.code(),
            reason: e.to_string(),
        })?;

        if !fx.success {
            return Err(FetchError::Conversion {
                currency: currency.code(),
                reason: "fixer reported success=false".to_string(),
            });
        }

        match fx.rates.get(currency.code()) {
            Some(&rate) if rate > 0.0 && rate.is_finite() => Ok(rate),
            _ => Err(FetchError::Conversion {
                currency: currency.code(),
                reason: "rate missing from response".to_string(),
            }),
        }
    }
}

/// Prix courant d'une cotation : présent et > 0
fn valid_price(quote: &QuoteResponse) -> FetchResult<f64> {
    match quote.c {
        Some(price) if price > 0.0 && price.is_finite() => Ok(price),
        Some(price) => Err(FetchError::invalid("finnhub", format!("invalid price {}", price))),
        None => Err(FetchError::invalid("finnhub", "missing price")),
    }
}

/// Convertit les tableaux parallèles t/c/v en points ordonnés
///
/// CONCEPT RUST : Iterators et zip
/// - zip s'arrête au plus court des deux tableaux
/// - Les volumes manquants valent 0
/// - Les timestamps invalides sont ignorés
fn candles_to_points(candles: &CandleResponse, rate: f64) -> Vec<HistoricalPoint> {
    let mut points: Vec<HistoricalPoint> = candles
        .t
        .iter()
        .zip(candles.c.iter())
        .enumerate()
        .filter_map(|(i, (&ts, &close))| {
            let date = DateTime::from_timestamp(ts, 0)?.date_naive();
            let volume = candles.v.get(i).copied().unwrap_or(0.0).max(0.0) as u64;
            Some(HistoricalPoint::new(date, close * rate, volume))
        })
        .collect();

    // Du plus ancien au plus récent, quel que soit l'ordre reçu
    points.sort_by_key(|p| p.date);
    points
}

/// Fiche société ; un champ absent ou vide (ETF, ticker inconnu) prend
/// la même valeur que la fiche synthétique
fn company_info(symbol: &str, profile: ProfileResponse) -> CompanyInfo {
    let field = |value: Option<String>, default: &str| {
        value
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| default.to_string())
    };

    CompanyInfo {
        name: field(profile.name, &format!("{} Corporation", symbol)),
        country: field(profile.country, "US"),
        listing_currency: field(profile.currency, "USD"),
        industry: field(profile.finnhub_industry, "Technology"),
        market_cap_millions: profile.market_capitalization.filter(|cap| *cap > 0.0),
        pe_ratio: None,
    }
}

#[async_trait]
impl<U: Upstream> MarketSource for LiveSource<U> {
    fn name(&self) -> &'static str {
        "live"
    }

    #[instrument(skip(self, spec, currency), fields(index = spec.symbol, currency = %currency))]
    async fn index_quote(&self, spec: &IndexSpec, currency: Currency) -> FetchResult<IndexQuote> {
        let quote = self.upstream.quote(spec.symbol).await?;
        let price = valid_price(&quote)?;
        let change = quote.d.unwrap_or(0.0);

        let rate = self.live_rate(currency).await;
        Ok(IndexQuote::new(spec, price * rate, change * rate, currency, true))
    }

    #[instrument(skip(self, currency), fields(currency = %currency))]
    async fn stock(&self, symbol: &str, currency: Currency) -> FetchResult<StockSnapshot> {
        let (quote, profile) =
            tokio::try_join!(self.upstream.quote(symbol), self.upstream.profile(symbol))?;

        let price = valid_price(&quote)?;
        let change = quote.d.unwrap_or(0.0);
        let previous_close = quote.pc.filter(|pc| *pc > 0.0).unwrap_or(price - change);

        let rate = self.live_rate(currency).await;
        let (price, change) = (price * rate, change * rate);

        info!(ticker = %symbol, price, "Live stock quote");
        Ok(StockSnapshot {
            symbol: symbol.to_string(),
            price,
            change,
            change_percent: change_percent(price, change),
            volume: quote.v.unwrap_or(0.0).max(0.0) as u64,
            market_cap: market_cap_label(profile.market_capitalization),
            previous_close: previous_close * rate,
            currency,
            live: true,
        })
    }

    #[instrument(skip(self, range, currency), fields(range = range.label(), currency = %currency))]
    async fn detail(
        &self,
        symbol: &str,
        range: TimeRange,
        currency: Currency,
    ) -> FetchResult<StockDetail> {
        let to = Utc::now().timestamp();
        let from = to - i64::from(range.to_days()) * SECONDS_PER_DAY;

        let (candles, profile, quote) = tokio::try_join!(
            self.upstream.candles(symbol, CANDLE_RESOLUTION, from, to),
            self.upstream.profile(symbol),
            self.upstream.quote(symbol),
        )?;

        if candles.s != "ok" || candles.c.is_empty() {
            return Err(FetchError::invalid(
                "finnhub",
                format!("no candle data (status {:?})", candles.s),
            ));
        }

        let rate = self.live_rate(currency).await;
        let history = candles_to_points(&candles, rate);
        if history.is_empty() {
            return Err(FetchError::invalid("finnhub", "no valid candle timestamps"));
        }

        // Prix courant : la cotation si elle est valide, sinon la dernière clôture
        let current_price = match valid_price(&quote) {
            Ok(price) => price * rate,
            Err(_) => history.last().map(|p| p.price).unwrap_or(0.0),
        };
        let change = quote.d.unwrap_or(0.0) * rate;
        let previous_close = match quote.pc {
            Some(pc) if pc > 0.0 => pc * rate,
            _ => current_price - change,
        };

        info!(ticker = %symbol, points = history.len(), "Live stock detail");
        Ok(StockDetail {
            symbol: symbol.to_string(),
            range,
            currency,
            history,
            info: company_info(symbol, profile),
            current_price,
            change,
            change_percent: change_percent(current_price, change),
            previous_close,
            live: true,
        })
    }

    #[instrument(skip(self, query))]
    async fn news(&self, query: &NewsQuery) -> FetchResult<Vec<NewsArticle>> {
        let response = self.upstream.news(query).await?;
        let articles = response
            .articles
            .ok_or_else(|| FetchError::invalid("newsapi", "no articles field"))?;

        let now = Utc::now();
        let articles: Vec<NewsArticle> = articles
            .into_iter()
            .filter_map(|wire| {
                let title = wire.title.filter(|t| !t.trim().is_empty())?;
                Some(NewsArticle {
                    title,
                    description: wire
                        .description
                        .filter(|d| !d.trim().is_empty())
                        .unwrap_or_else(|| "No description available".to_string()),
                    source: wire
                        .source
                        .and_then(|s| s.name)
                        .unwrap_or_else(|| "Unknown".to_string()),
                    published_at: wire.published_at.unwrap_or(now),
                    url: wire.url.unwrap_or_else(|| "#".to_string()),
                })
            })
            .collect();

        if articles.is_empty() {
            return Err(FetchError::invalid("newsapi", "empty article list"));
        }

        info!(count = articles.len(), "Live news articles");
        Ok(articles)
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
// Un Upstream factice remplace le réseau : chaque test décide quelles
// réponses réussissent.
// ============================================================================
