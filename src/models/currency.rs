// ============================================================================
// Enum : Currency
// ============================================================================
// Devise d'affichage du dashboard (USD, EUR, GBP, JPY, CAD, INR)
//
// CONCEPTS RUST :
// 1. Enums Copy : une devise se passe par valeur, pas de référence
// 2. FromStr : parsing depuis la config ("EUR" -> Currency::EUR)
// 3. Display : affichage du code ISO
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Devises supportées par le dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Currency {
    /// Dollar américain (devise native des APIs)
    #[default]
    USD,
    EUR,
    GBP,
    JPY,
    CAD,
    INR,
}

impl Currency {
    /// Toutes les devises, dans l'ordre du cycle de la touche 'c'
    pub const ALL: [Currency; 6] = [
        Currency::USD,
        Currency::EUR,
        Currency::GBP,
        Currency::JPY,
        Currency::CAD,
        Currency::INR,
    ];

    /// Code ISO (ex: "EUR"), utilisé dans la requête Fixer
    pub fn code(&self) -> &'static str {
        match self {
            Currency::USD => "USD",
            Currency::EUR => "EUR",
            Currency::GBP => "GBP",
            Currency::JPY => "JPY",
            Currency::CAD => "CAD",
            Currency::INR => "INR",
        }
    }

    /// Symbole affiché devant les prix
    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::USD => "$",
            Currency::EUR => "€",
            Currency::GBP => "£",
            Currency::JPY => "¥",
            Currency::CAD => "C$",
            Currency::INR => "₹",
        }
    }

    /// Nombre de décimales pour les prix
    ///
    /// JPY et INR s'affichent sans décimales, les autres avec deux.
    pub fn decimals(&self) -> usize {
        match self {
            Currency::JPY | Currency::INR => 0,
            _ => 2,
        }
    }

    /// Taux USD -> devise de la table statique
    ///
    /// CONCEPT : Taux de secours
    /// - Utilisé uniquement sur le chemin synthétique (fallback)
    /// - Le chemin live utilise le taux Fixer, ou aucun taux s'il échoue
    pub fn fallback_rate(&self) -> f64 {
        match self {
            Currency::USD => 1.0,
            Currency::EUR => 0.85,
            Currency::GBP => 0.73,
            Currency::JPY => 110.0,
            Currency::CAD => 1.25,
            Currency::INR => 83.0,
        }
    }

    /// Vrai si aucune conversion n'est nécessaire
    pub fn is_usd(&self) -> bool {
        *self == Currency::USD
    }

    /// Devise suivante dans le cycle (USD → EUR → … → INR → USD)
    pub fn next(&self) -> Currency {
        let index = Self::ALL.iter().position(|c| c == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }

    /// Formate un prix : symbole + valeur avec les décimales de la devise
    ///
    /// Exemples : "$185.23", "€85.00", "¥11000"
    pub fn format_price(&self, value: f64) -> String {
        format!("{}{:.*}", self.symbol(), self.decimals(), value)
    }

    /// Formate une variation absolue : "+$1.23" ou "-€0.50"
    ///
    /// La variation garde toujours deux décimales, quelle que soit la devise.
    pub fn format_change(&self, change: f64) -> String {
        let sign = if change >= 0.0 { "+" } else { "-" };
        format!("{}{}{:.2}", sign, self.symbol(), change.abs())
    }
}

/// Formate une variation en pourcentage : "+1.23%" / "-0.45%"
pub fn format_percent(change_percent: f64) -> String {
    // -0.0 s'afficherait "+-0.00%"
    let change_percent = if change_percent == 0.0 { 0.0 } else { change_percent };
    let sign = if change_percent >= 0.0 { "+" } else { "" };
    format!("{}{:.2}%", sign, change_percent)
}

/// Formate un volume avec séparateurs de milliers : 1234567 -> "1,234,567"
pub fn format_volume(volume: u64) -> String {
    let digits = volume.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);

    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }

    out
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_uppercase();
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.code() == code)
            .ok_or_else(|| anyhow::anyhow!("Devise non supportée : {}", s))
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
