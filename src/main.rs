// ============================================================================
// StockDash - point d'entrée
// ============================================================================
// Dashboard boursier en terminal : indices, cartes d'actions, actualités,
// vue détaillée avec historique. Données live (Finnhub, Fixer, NewsAPI) ou
// synthétiques en cas d'échec.
//
// ARCHITECTURE :
// - Boucle UI synchrone (ratatui) : possède App, dessine, lit le clavier
// - Runtime tokio : un poller par panneau, qui publie des PanelUpdate
// - std::sync::mpsc entre les deux : try_recv à chaque tour de boucle
// ============================================================================

use std::io;
use std::sync::{mpsc, Arc};
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{debug, error, info, warn};

use stockdash::api::{HttpUpstream, LiveSource};
use stockdash::app::App;
use stockdash::config::Config;
use stockdash::favorites::{FavoriteStore, JsonFavorites};
use stockdash::poller::{PanelUpdate, PollCommand, Scheduler};
use stockdash::refresh::RefreshCycle;
use stockdash::ui::{events::Event, render, EventHandler};

// ============================================================================
// Initialisation du logging
// ============================================================================
// stdout appartient au TUI : les logs partent dans ./logs/stockdash.log,
// avec rotation quotidienne.
//
//   tail -f logs/stockdash.log
//   RUST_LOG=stockdash=trace cargo run
// ============================================================================

fn init_logging() -> Result<()> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let log_dir = std::path::PathBuf::from("./logs");
    std::fs::create_dir_all(&log_dir).context("Échec de la création du répertoire de logs")?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir.clone(), "stockdash.log");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true),
        )
        .with(
            // Par défaut : debug pour stockdash, info pour les dépendances
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "stockdash=debug,info".into()),
        )
        .init();

    info!(?log_dir, "Logging initialisé");
    Ok(())
}

// ============================================================================
// Point d'entrée
// ============================================================================

fn main() -> Result<()> {
    init_logging().unwrap_or_else(|e| {
        eprintln!("⚠️  Warning: Failed to initialize logging: {}", e);
        eprintln!("   Continuing without logging...");
    });

    info!("StockDash starting up");
    let config = Config::from_env().context("Configuration invalide")?;

    // CONCEPT : Runtime tokio possédé par main
    // - Les pollers tournent sur ses workers
    // - La boucle UI reste synchrone et ne fait jamais de block_on
    let runtime = tokio::runtime::Runtime::new().context("Échec de la création du runtime tokio")?;

    let cycle = Arc::new(build_refresh_cycle(&config)?);
    info!(source = cycle.source_name(), "Data source ready");

    let favorites = JsonFavorites::new(&config.favorites_path);
    let favorite_symbols = favorites.load().unwrap_or_else(|e| {
        warn!(error = ?e, "Could not read favorites, starting without stars");
        Vec::new()
    });

    let mut app = App::new(&config.symbols, config.currency, &favorite_symbols);

    let (update_tx, update_rx) = mpsc::channel::<PanelUpdate>();
    let mut scheduler = Scheduler::new(
        runtime.handle().clone(),
        cycle,
        config.intervals,
        update_tx,
    );

    let startup = app.startup_commands();
    execute_commands(&mut scheduler, &mut app, startup);
    info!(pollers = scheduler.active(), "Pollers started");

    debug!("Setting up terminal");
    let mut terminal = setup_terminal()?;

    let events = EventHandler::new();
    info!("Starting event loop");
    let result = run(
        &mut terminal,
        &mut app,
        &events,
        &mut scheduler,
        &update_rx,
        &favorites,
    );

    // Restaure le terminal (même en cas d'erreur)
    debug!("Restoring terminal");
    restore_terminal(&mut terminal)?;

    scheduler.shutdown();
    runtime.shutdown_timeout(Duration::from_secs(1));

    match &result {
        Ok(_) => info!("Application exited normally"),
        Err(e) => error!(error = ?e, "Application exited with error"),
    }

    result
}

/// Source live, ou synthétique seule si STOCKDASH_OFFLINE est actif
fn build_refresh_cycle(config: &Config) -> Result<RefreshCycle> {
    if config.offline {
        info!("Offline mode: synthetic data only");
        return Ok(RefreshCycle::offline());
    }

    let upstream = HttpUpstream::new(config.api.clone())?;
    Ok(RefreshCycle::new(Arc::new(LiveSource::new(upstream))))
}

/// Exécute les commandes de l'App et enregistre les nouvelles générations
fn execute_commands(scheduler: &mut Scheduler, app: &mut App, commands: Vec<PollCommand>) {
    for command in commands {
        if let Some((panel, generation)) = scheduler.execute(command) {
            app.begin_panel(panel, generation);
        }
    }
}

// ============================================================================
// Event Loop
// ============================================================================
// À chaque itération :
//   0. applique les mises à jour des pollers (non bloquant)
//   1. dessine
//   2. attend une touche (au plus 100 ms) et la traite
// ============================================================================

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
    scheduler: &mut Scheduler,
    updates: &mpsc::Receiver<PanelUpdate>,
    favorites: &dyn FavoriteStore,
) -> Result<()> {
    while app.is_running() {
        loop {
            match updates.try_recv() {
                Ok(update) => {
                    app.apply_update(update);
                }
                Err(mpsc::TryRecvError::Empty) => break,
                Err(mpsc::TryRecvError::Disconnected) => {
                    error!("Update channel disconnected");
                    break;
                }
            }
        }

        terminal.draw(|frame| render(frame, app))?;

        match events.next() {
            Ok(event) => {
                let commands = handle_event(app, event, favorites);
                execute_commands(scheduler, app, commands);
            }
            Err(e) => warn!(error = ?e, "Failed to read terminal event"),
        }
    }

    Ok(())
}

// ============================================================================
// Gestion des événements
// ============================================================================
// Retourne les PollCommand à exécuter (changement de devise, de période,
// ouverture de la vue détaillée, ajout/suppression de ticker)
// ============================================================================

fn handle_event(app: &mut App, event: Event, favorites: &dyn FavoriteStore) -> Vec<PollCommand> {
    use stockdash::ui::events::{
        is_add_event, is_backspace_event, is_currency_event, is_delete_event, is_down_event,
        is_enter_event, is_escape_event, is_favorite_event, is_next_range_event,
        is_previous_range_event, is_quit_event, is_space_event, is_up_event, ticker_char,
    };

    if let Event::Tick = event {
        return Vec::new();
    }

    // Mode saisie : toutes les touches vont au buffer
    if app.is_in_input_mode() {
        if is_escape_event(&event) {
            info!("User cancelled input");
            app.cancel_input();
        } else if is_enter_event(&event) {
            let symbol = app.submit_input();
            let symbol = symbol.trim();
            info!(ticker = %symbol, "User submitted ticker");
            return app.add_stock(symbol, favorites);
        } else if is_backspace_event(&event) {
            app.backspace();
        } else if let Some(c) = ticker_char(&event) {
            app.append_char(c);
        }
        return Vec::new();
    }

    // 'q' : two-step quit
    if is_quit_event(&event) {
        if app.confirm_quit {
            info!("User confirmed quit");
            app.quit();
        } else {
            info!("User requested quit (awaiting confirmation)");
            app.cancel_confirmations();
            app.request_quit();
        }
        return Vec::new();
    }

    // 'd' : two-step delete (dashboard seulement)
    if is_delete_event(&event) && app.is_on_dashboard() && app.selected_card().is_some() {
        if app.confirm_delete {
            info!(ticker = ?app.selected_symbol(), "User confirmed delete");
            return app.delete_selected();
        }
        info!("User requested delete (awaiting confirmation)");
        app.cancel_confirmations();
        app.request_delete();
        return Vec::new();
    }

    // Toute autre touche annule les confirmations
    app.cancel_confirmations();
    app.status = None;

    match event {
        _ if is_up_event(&event) && app.is_on_dashboard() => {
            app.navigate_up();
            Vec::new()
        }
        _ if is_down_event(&event) && app.is_on_dashboard() => {
            app.navigate_down();
            Vec::new()
        }
        _ if is_enter_event(&event) && app.is_on_dashboard() => app.open_detail(),
        _ if (is_escape_event(&event) || is_space_event(&event)) && app.is_on_detail() => {
            debug!("User returned to dashboard");
            app.close_detail()
        }
        _ if is_next_range_event(&event) && app.is_on_detail() => app.next_range(),
        _ if is_previous_range_event(&event) && app.is_on_detail() => app.previous_range(),
        _ if is_currency_event(&event) => app.cycle_currency(),
        _ if is_favorite_event(&event) && app.is_on_dashboard() => {
            match app.toggle_favorite(favorites) {
                Ok(favorite) => {
                    info!(ticker = ?app.selected_symbol(), favorite, "Favorite toggled");
                }
                Err(e) => {
                    error!(error = ?e, "Failed to save favorites");
                    app.status = Some("Could not save favorites (see logs)".to_string());
                }
            }
            Vec::new()
        }
        _ if is_add_event(&event) && app.is_on_dashboard() => {
            info!("User requested add ticker");
            app.start_input("Add ticker: ");
            Vec::new()
        }
        _ => Vec::new(),
    }
}

// ============================================================================
// Setup et restauration du terminal
// ============================================================================

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode().context("Échec de l'activation du raw mode")?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    Terminal::new(CrosstermBackend::new(stdout)).context("Échec de la création du terminal")
}

/// Toujours appelé avant de quitter, même si run() a échoué
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
