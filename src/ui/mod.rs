// ============================================================================
// Module : ui
// ============================================================================
// Interface terminal (ratatui + crossterm)
// ============================================================================

pub mod dashboard; // Indices, cartes, actualités, footer
pub mod detail;    // Graphique historique + fiche société
pub mod events;    // Lecture du clavier et raccourcis

pub use dashboard::render;
pub use events::{Event, EventHandler};
