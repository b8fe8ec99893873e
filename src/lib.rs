// ============================================================================
// StockDash - Library
// ============================================================================
// Expose les modules publics pour le binaire et les tests
// ============================================================================

pub mod api;       // Sources de données (live, synthétique)
pub mod app;       // État du dashboard
pub mod config;    // Configuration depuis l'environnement
pub mod error;     // Erreurs de récupération typées
pub mod favorites; // Persistance des favoris
pub mod models;    // View models
pub mod poller;    // Tâches de rafraîchissement
pub mod refresh;   // Cycle live -> fallback
pub mod ui;        // Interface utilisateur
