//! Taxonomie des échecs d'un appel upstream.
//!
//! Ces erreurs ne remontent jamais jusqu'à l'utilisateur : le cycle de
//! rafraîchissement les journalise puis bascule sur les données synthétiques.

use thiserror::Error;

/// Échec d'un fetch (Finnhub, Fixer ou NewsAPI)
#[derive(Error, Debug)]
pub enum FetchError {
    /// Erreur réseau, timeout ou corps illisible
    #[error("HTTP request failed: {0}")]
    Network(#[from] reqwest::Error),

    /// Réponse HTTP hors 2xx
    #[error("{service} returned HTTP {status}")]
    Status {
        service: &'static str,
        status: reqwest::StatusCode,
    },

    /// Réponse bien formée mais inutilisable (prix nul, série vide, ...)
    #[error("Unusable response from {service}: {reason}")]
    Invalid {
        service: &'static str,
        reason: String,
    },

    /// Aucune clé configurée : on n'essaie même pas l'appel
    #[error("No API key configured for {0}")]
    MissingKey(&'static str),

    /// Le taux de change n'a pas pu être obtenu
    #[error("Currency conversion to {currency} failed: {reason}")]
    Conversion {
        currency: &'static str,
        reason: String,
    },
}

impl FetchError {
    /// Raccourci pour une réponse invalide
    pub fn invalid(service: &'static str, reason: impl Into<String>) -> Self {
        FetchError::Invalid {
            service,
            reason: reason.into(),
        }
    }
}

pub type FetchResult<T> = std::result::Result<T, FetchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = FetchError::invalid("finnhub", "price is zero");
        assert_eq!(err.to_string(), "Unusable response from finnhub: price is zero");

        let err = FetchError::MissingKey("fixer");
        assert_eq!(err.to_string(), "No API key configured for fixer");
    }
}
