// ============================================================================
// Favoris : liste plate de tickers persistée
// ============================================================================
// CONCEPTS RUST :
// 1. Trait comme "port" de persistance : le dashboard ne connaît que
//    FavoriteStore, pas le fichier JSON
// 2. Méthodes par défaut dans un trait (contains, toggle)
// 3. Mutex pour l'implémentation en mémoire (&self partagé)
// ============================================================================

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

/// Clé de stockage : nom du fichier JSON des favoris
pub const FAVORITES_KEY: &str = "favoriteStocks";

/// Port de persistance des favoris
///
/// CONCEPT : Read-modify-write
/// - load() lit toute la liste, save() la réécrit entièrement
/// - Deux toggles concurrents : le dernier écrit gagne
pub trait FavoriteStore: Send + Sync {
    /// Lit la liste persistée
    fn load(&self) -> Result<Vec<String>>;

    /// Remplace la liste persistée
    fn save(&self, symbols: &[String]) -> Result<()>;

    fn contains(&self, symbol: &str) -> Result<bool> {
        Ok(self.load()?.iter().any(|s| s == symbol))
    }

    /// Ajoute le symbole s'il est absent, le retire sinon
    ///
    /// Retourne l'appartenance après le toggle (true = favori).
    fn toggle(&self, symbol: &str) -> Result<bool> {
        let mut favorites = self.load()?;

        let now_favorite = if favorites.iter().any(|s| s == symbol) {
            favorites.retain(|s| s != symbol);
            false
        } else {
            favorites.push(symbol.to_string());
            true
        };

        self.save(&favorites)?;
        debug!(ticker = %symbol, favorite = now_favorite, "Favorite toggled");
        Ok(now_favorite)
    }
}

// ============================================================================
// Implémentation fichier JSON
// ============================================================================

/// Favoris dans un fichier JSON : `["AAPL","TSLA"]`
pub struct JsonFavorites {
    path: PathBuf,
}

impl JsonFavorites {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl FavoriteStore for JsonFavorites {
    /// Fichier absent ou corrompu : liste vide
    fn load(&self) -> Result<Vec<String>> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Échec de la lecture des favoris : {}", self.path.display())
                })
            }
        };

        match serde_json::from_str::<Vec<String>>(&raw) {
            Ok(symbols) => Ok(symbols),
            Err(e) => {
                warn!(path = ?self.path, error = %e, "Corrupt favorites file, starting empty");
                Ok(Vec::new())
            }
        }
    }

    fn save(&self, symbols: &[String]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .context("Échec de la création du répertoire des favoris")?;
        }

        let json = serde_json::to_string(symbols).context("Échec de la sérialisation des favoris")?;
        fs::write(&self.path, json).with_context(|| {
            format!("Échec de l'écriture des favoris : {}", self.path.display())
        })?;

        info!(path = ?self.path, count = symbols.len(), "Favorites saved");
        Ok(())
    }
}

// ============================================================================
// Implémentation en mémoire
// ============================================================================

/// Favoris en mémoire (tests, mode sans fichier)
#[derive(Default)]
pub struct MemoryFavorites {
    symbols: Mutex<Vec<String>>,
}

impl MemoryFavorites {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_symbols(symbols: &[&str]) -> Self {
        Self {
            symbols: Mutex::new(symbols.iter().map(|s| s.to_string()).collect()),
        }
    }
}

impl FavoriteStore for MemoryFavorites {
    fn load(&self) -> Result<Vec<String>> {
        let symbols = self
            .symbols
            .lock()
            .map_err(|e| anyhow::anyhow!("Verrou des favoris empoisonné : {}", e))?;
        Ok(symbols.clone())
    }

    fn save(&self, symbols: &[String]) -> Result<()> {
        let mut guard = self
            .symbols
            .lock()
            .map_err(|e| anyhow::anyhow!("Verrou des favoris empoisonné : {}", e))?;
        *guard = symbols.to_vec();
        Ok(())
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toggle_adds_then_removes() {
        let store = MemoryFavorites::new();

        assert!(store.toggle("AAPL").unwrap());
        assert!(store.contains("AAPL").unwrap());

        assert!(!store.toggle("AAPL").unwrap());
        assert!(!store.contains("AAPL").unwrap());
    }

    #[test]
    fn test_double_toggle_restores_membership() {
        let store = MemoryFavorites::with_symbols(&["TSLA", "MSFT"]);
        let before = store.load().unwrap();

        store.toggle("TSLA").unwrap();
        store.toggle("TSLA").unwrap();
        store.toggle("AAPL").unwrap();
        store.toggle("AAPL").unwrap();

        let mut after = store.load().unwrap();
        let mut expected = before;
        after.sort();
        expected.sort();
        assert_eq!(after, expected);
    }

    #[test]
    fn test_json_store_roundtrip_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("favoriteStocks.json");
        let store = JsonFavorites::new(&path);

        // Pas de fichier : liste vide
        assert!(store.load().unwrap().is_empty());

        store.toggle("AAPL").unwrap();
        store.toggle("GOOGL").unwrap();

        // Format : tableau JSON plat
        let raw = fs::read_to_string(&path).unwrap();
        assert_eq!(raw, r#"["AAPL","GOOGL"]"#);

        // Une nouvelle instance relit le même état
        let reopened = JsonFavorites::new(&path);
        assert!(reopened.contains("GOOGL").unwrap());
    }

    #[test]
    fn test_json_store_corrupt_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("favoriteStocks.json");
        fs::write(&path, "not json").unwrap();

        let store = JsonFavorites::new(&path);
        assert!(store.load().unwrap().is_empty());

        // Le toggle réécrit un fichier valide
        assert!(store.toggle("AAPL").unwrap());
        assert_eq!(store.load().unwrap(), vec!["AAPL"]);
    }
}
