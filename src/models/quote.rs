// ============================================================================
// Structures : IndexQuote et StockSnapshot
// ============================================================================
// Instantanés de prix affichés par le dashboard :
// - IndexQuote : une carte de la vue d'ensemble du marché (S&P 500, ...)
// - StockSnapshot : une carte d'action (AAPL, TSLA, ...)
//
// Les deux sont des "view models" : recréés à chaque rafraîchissement,
// jamais modifiés ensuite.
// ============================================================================

use serde::{Deserialize, Serialize};

use crate::models::Currency;

/// Dénominateur en dessous duquel la variation en % vaut 0
const MIN_PERCENT_BASE: f64 = 1e-9;

/// Variation en pourcentage : change / (value - change) × 100
///
/// CONCEPT : Formule de référence du dashboard
/// - `value - change` est la clôture précédente implicite
/// - Même formule pour les données live et synthétiques
/// - Base quasi nulle : retourne 0.0 (jamais NaN ni infini)
pub fn change_percent(value: f64, change: f64) -> f64 {
    let base = value - change;
    if base.abs() < MIN_PERCENT_BASE {
        return 0.0;
    }

    let percent = change / base * 100.0;
    // NaN, infini et -0.0 deviennent 0.0
    if percent.is_finite() && percent != 0.0 {
        percent
    } else {
        0.0
    }
}

// ============================================================================
// Indices de marché
// ============================================================================

/// Description d'un indice suivi par la vue d'ensemble
///
/// `base_value` / `base_change` ancrent les données synthétiques.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexSpec {
    pub name: &'static str,
    pub symbol: &'static str,
    pub base_value: f64,
    pub base_change: f64,
}

/// Les quatre indices affichés en haut du dashboard
pub const MARKET_INDICES: [IndexSpec; 4] = [
    IndexSpec { name: "S&P 500", symbol: "^GSPC", base_value: 4567.83, base_change: 67.83 },
    IndexSpec { name: "NASDAQ", symbol: "^IXIC", base_value: 14042.19, base_change: 42.19 },
    IndexSpec { name: "DOW JONES", symbol: "^DJI", base_value: 35000.0, base_change: 67.83 },
    IndexSpec { name: "RUSSELL 2000", symbol: "^RUT", base_value: 2000.0, base_change: 67.83 },
];

/// Cotation d'un indice, déjà convertie dans la devise d'affichage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexQuote {
    pub name: String,
    pub symbol: String,
    pub value: f64,
    pub change: f64,
    pub change_percent: f64,
    pub currency: Currency,

    /// false si la carte vient du générateur synthétique
    pub live: bool,
}

impl IndexQuote {
    /// Construit la cotation et calcule la variation en % sur les valeurs converties
    pub fn new(spec: &IndexSpec, value: f64, change: f64, currency: Currency, live: bool) -> Self {
        Self {
            name: spec.name.to_string(),
            symbol: spec.symbol.to_string(),
            value,
            change,
            change_percent: change_percent(value, change),
            currency,
            live,
        }
    }

    pub fn is_positive(&self) -> bool {
        self.change >= 0.0
    }
}

// ============================================================================
// Cartes d'actions
// ============================================================================

/// Instantané d'une action pour une carte du dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockSnapshot {
    pub symbol: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub volume: u64,

    /// Capitalisation formatée ("2870.1B") ou "N/A"
    pub market_cap: String,
    pub previous_close: f64,
    pub currency: Currency,
    pub live: bool,
}

impl StockSnapshot {
    pub fn is_positive(&self) -> bool {
        self.change >= 0.0
    }

    /// Ligne affichée dans la liste des cartes
    ///
    /// Format : "AAPL     $185.23   +$1.23 (+0.67%)"
    pub fn display(&self) -> String {
        format!(
            "{:<8} {:>12}  {} ({})",
            self.symbol,
            self.currency.format_price(self.price),
            self.currency.format_change(self.change),
            crate::models::format_percent(self.change_percent),
        )
    }
}

/// Label de capitalisation à partir de la valeur Finnhub (en millions USD)
///
/// CONCEPT RUST : Option combinators
/// - None ou 0 : "N/A"
/// - Sinon : milliards avec une décimale
pub fn market_cap_label(market_cap_millions: Option<f64>) -> String {
    match market_cap_millions {
        Some(cap) if cap > 0.0 => format!("{:.1}B", cap / 1000.0),
        _ => "N/A".to_string(),
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_percent_formula() {
        // value 105, change 5 -> base 100 -> 5%
        assert!((change_percent(105.0, 5.0) - 5.0).abs() < 1e-12);
        // baisse : value 95, change -5 -> base 100 -> -5%
        assert!((change_percent(95.0, -5.0) + 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_change_percent_near_zero_base_is_finite() {
        assert_eq!(change_percent(10.0, 10.0), 0.0);
        assert_eq!(change_percent(1e-12, 0.0), 0.0);
        assert!(change_percent(10.0, 10.0 - 1e-6).is_finite());
        assert!(change_percent(100.0, -0.0).is_sign_positive());
    }

    #[test]
    fn test_change_percent_scale_invariant() {
        // La conversion de devise multiplie value et change par le même taux
        let raw = change_percent(200.0, 4.0);
        let converted = change_percent(200.0 * 0.85, 4.0 * 0.85);
        assert!((raw - converted).abs() < 1e-9);
    }

    #[test]
    fn test_index_quote_new() {
        let quote = IndexQuote::new(&MARKET_INDICES[0], 4600.0, 46.0, Currency::USD, true);
        assert_eq!(quote.name, "S&P 500");
        assert_eq!(quote.symbol, "^GSPC");
        assert!((quote.change_percent - change_percent(4600.0, 46.0)).abs() < 1e-12);
        assert!(quote.is_positive());
    }

    #[test]
    fn test_market_cap_label() {
        assert_eq!(market_cap_label(Some(2_870_100.0)), "2870.1B");
        assert_eq!(market_cap_label(Some(0.0)), "N/A");
        assert_eq!(market_cap_label(None), "N/A");
    }

    #[test]
    fn test_snapshot_display() {
        let snap = StockSnapshot {
            symbol: "AAPL".to_string(),
            price: 185.23,
            change: 1.23,
            change_percent: 0.67,
            volume: 1000,
            market_cap: "N/A".to_string(),
            previous_close: 184.0,
            currency: Currency::USD,
            live: true,
        };

        let line = snap.display();
        assert!(line.starts_with("AAPL"));
        assert!(line.contains("$185.23"));
        assert!(line.contains("+$1.23"));
        assert!(line.contains("(+0.67%)"));
    }
}
