// ============================================================================
// Historique de prix et vue détaillée d'une action
// ============================================================================
// - TimeRange : période affichée dans la vue détaillée (1W, 1M, 3M, 1Y)
// - HistoricalPoint : un point (date, prix, volume) du graphique
// - StockDetail : tout ce qu'affiche la vue détaillée
//
// CONCEPT RUST : NaiveDate
// - Date sans fuseau horaire (chrono)
// - Suffisant pour des points journaliers
// ============================================================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::Currency;

/// Période affichée dans la vue détaillée
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimeRange {
    /// 7 jours
    OneWeek,
    /// 30 jours
    #[default]
    OneMonth,
    /// 90 jours
    ThreeMonths,
    /// 365 jours
    OneYear,
}

impl TimeRange {
    pub const ALL: [TimeRange; 4] = [
        TimeRange::OneWeek,
        TimeRange::OneMonth,
        TimeRange::ThreeMonths,
        TimeRange::OneYear,
    ];

    /// Nombre de jours couverts
    ///
    /// Sert aussi de nombre de points du graphique synthétique.
    pub fn to_days(&self) -> u32 {
        match self {
            TimeRange::OneWeek => 7,
            TimeRange::OneMonth => 30,
            TimeRange::ThreeMonths => 90,
            TimeRange::OneYear => 365,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TimeRange::OneWeek => "1W",
            TimeRange::OneMonth => "1M",
            TimeRange::ThreeMonths => "3M",
            TimeRange::OneYear => "1Y",
        }
    }

    /// Période suivante (cycle, utilisé avec 'l' / ']')
    pub fn next(&self) -> TimeRange {
        match self {
            TimeRange::OneWeek => TimeRange::OneMonth,
            TimeRange::OneMonth => TimeRange::ThreeMonths,
            TimeRange::ThreeMonths => TimeRange::OneYear,
            TimeRange::OneYear => TimeRange::OneWeek,
        }
    }

    /// Période précédente (cycle inverse, utilisé avec 'h' / '[')
    pub fn previous(&self) -> TimeRange {
        match self {
            TimeRange::OneWeek => TimeRange::OneYear,
            TimeRange::OneMonth => TimeRange::OneWeek,
            TimeRange::ThreeMonths => TimeRange::OneMonth,
            TimeRange::OneYear => TimeRange::ThreeMonths,
        }
    }
}

/// Un point du graphique historique
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalPoint {
    pub date: NaiveDate,
    pub price: f64,
    pub volume: u64,
}

impl HistoricalPoint {
    pub fn new(date: NaiveDate, price: f64, volume: u64) -> Self {
        Self { date, price, volume }
    }
}

/// Informations société (profil Finnhub, ou inventées en fallback)
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CompanyInfo {
    pub name: String,
    pub country: String,

    /// Devise de cotation annoncée par le profil (pas la devise d'affichage)
    pub listing_currency: String,
    pub industry: String,

    /// Capitalisation en millions USD
    pub market_cap_millions: Option<f64>,
    pub pe_ratio: Option<f64>,
}

/// Performance sur la période : variation entre premier et dernier point
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Performance {
    pub change: f64,
    pub change_percent: f64,
}

/// Contenu complet de la vue détaillée
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockDetail {
    pub symbol: String,
    pub range: TimeRange,
    pub currency: Currency,

    /// Points du plus ancien au plus récent, déjà convertis
    pub history: Vec<HistoricalPoint>,
    pub info: CompanyInfo,
    pub current_price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub previous_close: f64,
    pub live: bool,
}

impl StockDetail {
    /// Performance sur la période affichée
    ///
    /// CONCEPT RUST : Slice patterns
    /// - [first, .., last] : au moins deux éléments
    /// - Sinon : performance nulle
    pub fn performance(&self) -> Performance {
        match self.history.as_slice() {
            [first, .., last] if first.price != 0.0 => {
                let change = last.price - first.price;
                Performance {
                    change,
                    change_percent: change / first.price * 100.0,
                }
            }
            _ => Performance::default(),
        }
    }

    /// Prix min et max de l'historique, pour l'axe Y du graphique
    pub fn price_bounds(&self) -> Option<(f64, f64)> {
        let first = self.history.first()?.price;
        Some(self.history.iter().fold((first, first), |(lo, hi), p| {
            (lo.min(p.price), hi.max(p.price))
        }))
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn detail_with_prices(prices: &[f64]) -> StockDetail {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let history = prices
            .iter()
            .enumerate()
            .map(|(i, &p)| {
                HistoricalPoint::new(start + chrono::Duration::days(i as i64), p, 1000)
            })
            .collect();

        StockDetail {
            symbol: "AAPL".to_string(),
            range: TimeRange::OneWeek,
            currency: Currency::USD,
            history,
            info: CompanyInfo::default(),
            current_price: *prices.last().unwrap_or(&0.0),
            change: 0.0,
            change_percent: 0.0,
            previous_close: 0.0,
            live: false,
        }
    }

    #[test]
    fn test_time_range_days() {
        assert_eq!(TimeRange::OneWeek.to_days(), 7);
        assert_eq!(TimeRange::OneMonth.to_days(), 30);
        assert_eq!(TimeRange::ThreeMonths.to_days(), 90);
        assert_eq!(TimeRange::OneYear.to_days(), 365);
        assert_eq!(TimeRange::default(), TimeRange::OneMonth);
    }

    #[test]
    fn test_time_range_cycle() {
        for range in TimeRange::ALL {
            assert_eq!(range.next().previous(), range);
        }
        assert_eq!(TimeRange::OneYear.next(), TimeRange::OneWeek);
    }

    #[test]
    fn test_performance() {
        let detail = detail_with_prices(&[100.0, 90.0, 110.0]);
        let perf = detail.performance();
        assert_eq!(perf.change, 10.0);
        assert_eq!(perf.change_percent, 10.0);
    }

    #[test]
    fn test_performance_needs_two_points() {
        assert_eq!(detail_with_prices(&[100.0]).performance(), Performance::default());
        assert_eq!(detail_with_prices(&[]).performance(), Performance::default());
    }

    #[test]
    fn test_price_bounds() {
        let detail = detail_with_prices(&[100.0, 90.0, 110.0]);
        assert_eq!(detail.price_bounds(), Some((90.0, 110.0)));
        assert_eq!(detail_with_prices(&[]).price_bounds(), None);
    }
}
