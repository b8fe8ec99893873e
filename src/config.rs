// ============================================================================
// Configuration
// ============================================================================
// Clés API, URLs des services, devise et tickers par défaut, emplacement
// des favoris. Tout est lu depuis l'environnement (et un .env optionnel).
//
// CONCEPTS RUST :
// 1. dotenv : charge .env dans les variables d'environnement
// 2. std::env::var : lecture avec valeur par défaut
// 3. Duration : intervalles de rafraîchissement typés
// ============================================================================

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::favorites::FAVORITES_KEY;
use crate::models::Currency;

pub const DEFAULT_FINNHUB_URL: &str = "https://finnhub.io/api/v1";
pub const DEFAULT_FIXER_URL: &str = "https://api.fixer.io";
pub const DEFAULT_NEWSAPI_URL: &str = "https://newsapi.org/v2";

/// Tickers affichés si STOCKDASH_SYMBOLS n'est pas défini
pub const DEFAULT_SYMBOLS: [&str; 4] = ["AAPL", "GOOGL", "MSFT", "TSLA"];

/// Périodes de rafraîchissement par composant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Intervals {
    /// Vue d'ensemble des indices
    pub indices: Duration,
    /// Cartes d'actions
    pub stocks: Duration,
    /// Section actualités
    pub news: Duration,
}

impl Default for Intervals {
    fn default() -> Self {
        Self {
            indices: Duration::from_secs(10),
            stocks: Duration::from_secs(15),
            news: Duration::from_secs(300),
        }
    }
}

/// Clés et points d'entrée des trois services
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub finnhub_key: String,
    pub fixer_key: String,
    pub newsapi_key: String,
    pub finnhub_url: String,
    pub fixer_url: String,
    pub newsapi_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            finnhub_key: String::new(),
            fixer_key: String::new(),
            newsapi_key: String::new(),
            finnhub_url: DEFAULT_FINNHUB_URL.to_string(),
            fixer_url: DEFAULT_FIXER_URL.to_string(),
            newsapi_url: DEFAULT_NEWSAPI_URL.to_string(),
        }
    }
}

/// Configuration complète de l'application
#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub currency: Currency,
    pub symbols: Vec<String>,

    /// true : n'utilise que la source synthétique (aucun appel réseau)
    pub offline: bool,
    pub favorites_path: PathBuf,
    pub intervals: Intervals,
}

impl Config {
    /// Construit la configuration depuis l'environnement
    ///
    /// CONCEPT : Variables optionnelles
    /// - Clé absente : chaîne vide, les appels live basculent en fallback
    /// - Devise invalide : erreur (faute de frappe probable dans la config)
    pub fn from_env() -> Result<Self> {
        // .env est optionnel : ignore l'erreur s'il n'existe pas
        dotenv::dotenv().ok();

        let defaults = ApiConfig::default();
        let api = ApiConfig {
            finnhub_key: var_or("FINNHUB_API_KEY", ""),
            fixer_key: var_or("FIXER_API_KEY", ""),
            newsapi_key: var_or("NEWSAPI_KEY", ""),
            finnhub_url: var_or("FINNHUB_BASE_URL", &defaults.finnhub_url),
            fixer_url: var_or("FIXER_BASE_URL", &defaults.fixer_url),
            newsapi_url: var_or("NEWSAPI_BASE_URL", &defaults.newsapi_url),
        };

        let currency = var_or("STOCKDASH_CURRENCY", "USD")
            .parse::<Currency>()
            .context("STOCKDASH_CURRENCY invalide")?;

        let symbols = match env::var("STOCKDASH_SYMBOLS") {
            Ok(raw) => parse_symbols(&raw),
            Err(_) => DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect(),
        };

        let offline = parse_flag(&var_or("STOCKDASH_OFFLINE", ""));

        let favorites_path = match env::var("STOCKDASH_FAVORITES") {
            Ok(path) => PathBuf::from(path),
            Err(_) => default_favorites_path(),
        };

        let config = Self {
            api,
            currency,
            symbols,
            offline,
            favorites_path,
            intervals: Intervals::default(),
        };

        config.warn_missing_keys();
        debug!(
            currency = %config.currency,
            symbols = ?config.symbols,
            offline = config.offline,
            favorites = ?config.favorites_path,
            "Configuration loaded"
        );

        Ok(config)
    }

    /// Signale les clés absentes (le dashboard fonctionne quand même)
    fn warn_missing_keys(&self) {
        if self.offline {
            return;
        }

        for (name, key) in [
            ("FINNHUB_API_KEY", &self.api.finnhub_key),
            ("FIXER_API_KEY", &self.api.fixer_key),
            ("NEWSAPI_KEY", &self.api.newsapi_key),
        ] {
            if key.is_empty() {
                warn!(variable = name, "API key not set, synthetic data will be shown");
            }
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api: ApiConfig::default(),
            currency: Currency::default(),
            symbols: DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect(),
            offline: false,
            favorites_path: default_favorites_path(),
            intervals: Intervals::default(),
        }
    }
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

/// "aapl, tsla,,MSFT" -> ["AAPL", "TSLA", "MSFT"]
///
/// Les doublons sont retirés, l'ordre est conservé.
pub fn parse_symbols(raw: &str) -> Vec<String> {
    let mut symbols: Vec<String> = Vec::new();
    for symbol in raw.split(',').map(|s| s.trim().to_uppercase()) {
        if !symbol.is_empty() && !symbols.contains(&symbol) {
            symbols.push(symbol);
        }
    }
    symbols
}

fn parse_flag(raw: &str) -> bool {
    matches!(raw.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

/// ~/.local/share/stockdash/favoriteStocks.json (Linux)
///
/// Repli sur le répertoire courant si le système ne fournit pas de data dir.
fn default_favorites_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("stockdash")
        .join(format!("{}.json", FAVORITES_KEY))
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_symbols() {
        assert_eq!(parse_symbols("aapl, tsla,,MSFT"), vec!["AAPL", "TSLA", "MSFT"]);
        assert_eq!(parse_symbols("AAPL,aapl"), vec!["AAPL"]);
        assert!(parse_symbols(" , ").is_empty());
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("1"));
        assert!(parse_flag("TRUE"));
        assert!(!parse_flag(""));
        assert!(!parse_flag("0"));
    }

    #[test]
    fn test_default_intervals() {
        let intervals = Intervals::default();
        assert_eq!(intervals.indices, Duration::from_secs(10));
        assert_eq!(intervals.stocks, Duration::from_secs(15));
        assert_eq!(intervals.news, Duration::from_secs(300));
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.currency, Currency::USD);
        assert_eq!(config.symbols, vec!["AAPL", "GOOGL", "MSFT", "TSLA"]);
        assert!(config.favorites_path.ends_with("favoriteStocks.json"));
        assert_eq!(config.api.finnhub_url, DEFAULT_FINNHUB_URL);
    }
}
