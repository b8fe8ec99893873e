// ============================================================================
// Gestion des événements
// ============================================================================
// Lecture du clavier (crossterm) et prédicats pour chaque raccourci
//
// RACCOURCIS :
//   q (x2)        quitter
//   ↑ ↓ / k j     navigation
//   Enter         vue détaillée
//   Esc / Space   retour au dashboard
//   h l / [ ]     période précédente / suivante (vue détaillée)
//   c             devise suivante
//   f             favori on/off
//   a             ajouter un ticker
//   d (x2)        supprimer le ticker sélectionné
// ============================================================================

use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event as CrosstermEvent, KeyCode, KeyEvent, KeyEventKind};

/// Délai max d'attente d'une touche ; sans touche, la boucle reçoit un Tick
///
/// Court : les mises à jour des pollers sont lues entre deux événements.
const POLL_TIMEOUT: Duration = Duration::from_millis(100);

/// Événements de l'application
#[derive(Debug, Clone)]
pub enum Event {
    /// Touche pressée
    Key(KeyEvent),

    /// Aucune touche pendant POLL_TIMEOUT
    Tick,
}

/// Gestionnaire d'événements (sans état)
#[derive(Default)]
pub struct EventHandler;

impl EventHandler {
    pub fn new() -> Self {
        Self
    }

    /// Lit le prochain événement (bloquant au plus POLL_TIMEOUT)
    ///
    /// Seuls les Press sont retenus : certains terminaux envoient aussi
    /// Release, ce qui doublerait chaque action.
    pub fn next(&self) -> Result<Event> {
        if !event::poll(POLL_TIMEOUT)? {
            return Ok(Event::Tick);
        }

        Ok(match event::read()? {
            CrosstermEvent::Key(key) if key.kind == KeyEventKind::Press => Event::Key(key),
            _ => Event::Tick,
        })
    }
}

// ============================================================================
// Prédicats de raccourcis
// ============================================================================
// CONCEPT RUST : matches! avec plusieurs motifs
// - key_code() extrait le KeyCode une fois pour toutes
// - Chaque prédicat devient une ligne
// ============================================================================

fn key_code(event: &Event) -> Option<KeyCode> {
    match event {
        Event::Key(key) => Some(key.code),
        Event::Tick => None,
    }
}

pub fn is_quit_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('q' | 'Q')))
}

pub fn is_escape_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Esc))
}

pub fn is_space_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char(' ')))
}

pub fn is_enter_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Enter))
}

/// Flèche haut ou 'k' (vim)
pub fn is_up_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Up | KeyCode::Char('k' | 'K')))
}

/// Flèche bas ou 'j' (vim)
pub fn is_down_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Down | KeyCode::Char('j' | 'J')))
}

/// 'l' ou ']' : période suivante (1W → 1M → 3M → 1Y)
pub fn is_next_range_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('l' | ']')))
}

/// 'h' ou '[' : période précédente
pub fn is_previous_range_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('h' | '[')))
}

/// 'c' : devise suivante (USD → EUR → GBP → JPY → CAD → INR)
pub fn is_currency_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('c' | 'C')))
}

pub fn is_favorite_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('f' | 'F')))
}

pub fn is_add_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('a' | 'A')))
}

pub fn is_delete_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Char('d' | 'D')))
}

pub fn is_backspace_event(event: &Event) -> bool {
    matches!(key_code(event), Some(KeyCode::Backspace))
}

/// Caractère acceptable dans un ticker : alphanumérique, '-', '.', '^'
pub fn ticker_char(event: &Event) -> Option<char> {
    match key_code(event) {
        Some(KeyCode::Char(c)) if c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '^') => {
            Some(c)
        }
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::empty()))
    }

    #[test]
    fn test_is_quit_event() {
        assert!(is_quit_event(&key(KeyCode::Char('q'))));
        assert!(!is_quit_event(&key(KeyCode::Char('a'))));
        assert!(!is_quit_event(&Event::Tick));
    }

    #[test]
    fn test_range_keys() {
        assert!(is_next_range_event(&key(KeyCode::Char('l'))));
        assert!(is_next_range_event(&key(KeyCode::Char(']'))));
        assert!(is_previous_range_event(&key(KeyCode::Char('['))));
        assert!(!is_previous_range_event(&key(KeyCode::Char('l'))));
    }

    #[test]
    fn test_ticker_char() {
        assert_eq!(ticker_char(&key(KeyCode::Char('b'))), Some('b'));
        assert_eq!(ticker_char(&key(KeyCode::Char('.'))), Some('.'));
        assert_eq!(ticker_char(&key(KeyCode::Char(' '))), None);
        assert_eq!(ticker_char(&key(KeyCode::Enter)), None);
    }
}
