// ============================================================================
// Upstream : transport HTTP vers Finnhub, Fixer et NewsAPI
// ============================================================================
// Ce module ne fait que parler HTTP et désérialiser le JSON brut.
// La validation et la conversion de devise sont faites par LiveSource.
//
// CONCEPTS RUST :
// 1. Trait async (async-trait) : le transport est remplaçable en test
// 2. Serde : structures qui matchent exactement le JSON des APIs
// 3. #[serde(default)] : un champ absent ne fait pas échouer le parsing
// ============================================================================

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, error, instrument};

use crate::config::ApiConfig;
use crate::error::{FetchError, FetchResult};
use crate::models::Currency;

// ============================================================================
// Structures pour parser les réponses JSON
// ============================================================================
// Finnhub utilise des noms d'une lettre (c, d, dp, pc, v) : on les garde
// tels quels, ce sont des structures de transport.
// ============================================================================

/// Réponse de /quote
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct QuoteResponse {
    /// Prix courant
    #[serde(default)]
    pub c: Option<f64>,
    /// Variation absolue
    #[serde(default)]
    pub d: Option<f64>,
    /// Variation en %
    #[serde(default)]
    pub dp: Option<f64>,
    /// Clôture précédente
    #[serde(default)]
    pub pc: Option<f64>,
    /// Volume
    #[serde(default)]
    pub v: Option<f64>,
}

/// Réponse de /stock/profile2
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    /// En millions USD
    #[serde(default)]
    pub market_capitalization: Option<f64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub finnhub_industry: Option<String>,
}

/// Réponse de /stock/candle : tableaux parallèles
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CandleResponse {
    /// Statut : "ok" ou "no_data"
    #[serde(default)]
    pub s: String,
    /// Timestamps Unix
    #[serde(default)]
    pub t: Vec<i64>,
    /// Clôtures
    #[serde(default)]
    pub c: Vec<f64>,
    /// Volumes
    #[serde(default)]
    pub v: Vec<f64>,
}

/// Réponse de Fixer /latest
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct FxResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub rates: HashMap<String, f64>,
}

/// Réponse de NewsAPI /everything
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NewsResponse {
    /// None : réponse d'erreur NewsAPI (status "error")
    #[serde(default)]
    pub articles: Option<Vec<ArticleWire>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleWire {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub source: Option<SourceWire>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SourceWire {
    #[serde(default)]
    pub name: Option<String>,
}

/// Paramètres de la recherche d'articles
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsQuery {
    pub query: String,
    pub sort_by: String,
    pub page_size: u32,
}

impl Default for NewsQuery {
    fn default() -> Self {
        Self {
            query: "stock market finance trading".to_string(),
            sort_by: "publishedAt".to_string(),
            page_size: 6,
        }
    }
}

// ============================================================================
// Trait Upstream
// ============================================================================

/// Accès brut aux trois services
///
/// CONCEPT RUST : #[async_trait]
/// - Permet des méthodes async dans un trait utilisable en générique
/// - Les futures retournées sont Send (exécutables par tokio::spawn)
#[async_trait]
pub trait Upstream: Send + Sync {
    async fn quote(&self, symbol: &str) -> FetchResult<QuoteResponse>;

    async fn profile(&self, symbol: &str) -> FetchResult<ProfileResponse>;

    async fn candles(
        &self,
        symbol: &str,
        resolution: &str,
        from: i64,
        to: i64,
    ) -> FetchResult<CandleResponse>;

    /// Taux USD -> `currency`
    async fn fx_rates(&self, currency: Currency) -> FetchResult<FxResponse>;

    async fn news(&self, query: &NewsQuery) -> FetchResult<NewsResponse>;
}

// ============================================================================
// Implémentation HTTP (reqwest)
// ============================================================================

/// Transport HTTP réel
///
/// Un seul reqwest::Client partagé : réutilise les connexions entre les
/// rafraîchissements de tous les composants.
#[derive(Clone)]
pub struct HttpUpstream {
    client: reqwest::Client,
    api: ApiConfig,
}

impl HttpUpstream {
    /// Crée le client HTTP (timeout 10 s)
    pub fn new(api: ApiConfig) -> anyhow::Result<Self> {
        use anyhow::Context;

        let client = reqwest::Client::builder()
            .user_agent(concat!("stockdash/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(10))
            .build()
            .context("Échec de la création du client HTTP")?;

        Ok(Self { client, api })
    }

    /// GET + contrôle du statut + parsing JSON
    ///
    /// CONCEPT RUST : Génériques avec trait bound
    /// - T: DeserializeOwned : n'importe quelle structure désérialisable
    /// - Le type est choisi par l'appelant (inférence)
    async fn get_json<T: DeserializeOwned>(
        &self,
        service: &'static str,
        url: &str,
        query: &[(&str, &str)],
    ) -> FetchResult<T> {
        debug!(service, url = %url, "Sending HTTP request");
        let response = self.client.get(url).query(query).send().await?;

        let status = response.status();
        if !status.is_success() {
            error!(service, status = %status, "Upstream returned error status");
            return Err(FetchError::Status { service, status });
        }

        Ok(response.json::<T>().await?)
    }

    fn finnhub_key(&self) -> FetchResult<&str> {
        require_key("finnhub", &self.api.finnhub_key)
    }
}

fn require_key<'a>(service: &'static str, key: &'a str) -> FetchResult<&'a str> {
    if key.is_empty() {
        Err(FetchError::MissingKey(service))
    } else {
        Ok(key)
    }
}

#[async_trait]
impl Upstream for HttpUpstream {
    #[instrument(skip(self))]
    async fn quote(&self, symbol: &str) -> FetchResult<QuoteResponse> {
        let token = self.finnhub_key()?;
        let url = format!("{}/quote", self.api.finnhub_url);
        self.get_json("finnhub", &url, &[("symbol", symbol), ("token", token)])
            .await
    }

    #[instrument(skip(self))]
    async fn profile(&self, symbol: &str) -> FetchResult<ProfileResponse> {
        let token = self.finnhub_key()?;
        let url = format!("{}/stock/profile2", self.api.finnhub_url);
        self.get_json("finnhub", &url, &[("symbol", symbol), ("token", token)])
            .await
    }

    #[instrument(skip(self))]
    async fn candles(
        &self,
        symbol: &str,
        resolution: &str,
        from: i64,
        to: i64,
    ) -> FetchResult<CandleResponse> {
        let token = self.finnhub_key()?;
        let url = format!("{}/stock/candle", self.api.finnhub_url);
        let (from, to) = (from.to_string(), to.to_string());
        self.get_json(
            "finnhub",
            &url,
            &[
                ("symbol", symbol),
                ("resolution", resolution),
                ("from", from.as_str()),
                ("to", to.as_str()),
                ("token", token),
            ],
        )
        .await
    }

    #[instrument(skip(self, currency), fields(currency = %currency))]
    async fn fx_rates(&self, currency: Currency) -> FetchResult<FxResponse> {
        let key = require_key("fixer", &self.api.fixer_key)?;
        let url = format!("{}/latest", self.api.fixer_url);
        self.get_json(
            "fixer",
            &url,
            &[("access_key", key), ("base", "USD"), ("symbols", currency.code())],
        )
        .await
    }

    #[instrument(skip(self, query), fields(q = %query.query))]
    async fn news(&self, query: &NewsQuery) -> FetchResult<NewsResponse> {
        let key = require_key("newsapi", &self.api.newsapi_key)?;
        let url = format!("{}/everything", self.api.newsapi_url);
        let page_size = query.page_size.to_string();
        self.get_json(
            "newsapi",
            &url,
            &[
                ("q", query.query.as_str()),
                ("sortBy", query.sort_by.as_str()),
                ("pageSize", page_size.as_str()),
                ("apiKey", key),
            ],
        )
        .await
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
