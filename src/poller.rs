// ============================================================================
// Pollers : une tâche tokio par panneau du dashboard
// ============================================================================
// Chaque panneau (indices, carte d'action, vue détaillée, actualités) a son
// propre poller :
//
//   Loading ──refresh──> Ready ──tick──> Loading ──> Ready ...
//
// Pas d'état terminal : le poller tourne jusqu'à ce qu'on l'arrête.
//
// ANNULATION :
// - Changement de dépendance (devise, période, symbole) : l'ancienne tâche
//   est abortée (requête en vol abandonnée), une nouvelle démarre avec un
//   nouveau numéro de génération
// - Chaque mise à jour porte sa génération ; l'App ignore celles qui ne
//   correspondent plus au panneau courant
//
// CONCEPTS RUST :
// 1. tokio::time::interval : tick périodique, le premier tick est immédiat
// 2. JoinHandle::abort : annulation coopérative au prochain .await
// 3. Drop : arrêter un poller = le laisser sortir du scope
// 4. std::sync::mpsc : la boucle UI est synchrone, elle lit avec try_recv
// ============================================================================

use std::collections::HashMap;
use std::sync::{mpsc, Arc};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use crate::config::Intervals;
use crate::refresh::{Payload, RefreshCycle, RefreshRequest};

/// Identifiant d'un panneau du dashboard
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PanelId {
    Overview,
    Stock(String),
    Detail,
    News,
}

/// Transition publiée par un poller
#[derive(Debug, Clone, PartialEq)]
pub enum PanelEvent {
    /// Une actualisation commence
    Loading,
    /// Nouvelles données (toujours peuplées)
    Ready(Payload),
}

/// Message envoyé à la boucle UI
#[derive(Debug, Clone, PartialEq)]
pub struct PanelUpdate {
    pub panel: PanelId,
    pub generation: u64,
    pub event: PanelEvent,
}

/// Commandes produites par l'App, exécutées par le Scheduler
#[derive(Debug, Clone, PartialEq)]
pub enum PollCommand {
    /// Démarre (ou redémarre) le poller du panneau de la requête
    Start(RefreshRequest),
    /// Arrête le poller d'un panneau
    Stop(PanelId),
}

// ============================================================================
// Poller
// ============================================================================

/// Tâche de rafraîchissement d'un panneau
///
/// CONCEPT : RAII
/// - Le Poller possède le JoinHandle
/// - Drop abort la tâche : impossible d'oublier un timer actif
pub struct Poller {
    panel: PanelId,
    generation: u64,
    handle: JoinHandle<()>,
}

impl Poller {
    /// Lance la tâche sur le runtime
    ///
    /// `period` à None : un seul rafraîchissement, puis la tâche se termine.
    pub fn spawn(
        runtime: &Handle,
        cycle: Arc<RefreshCycle>,
        request: RefreshRequest,
        period: Option<Duration>,
        generation: u64,
        tx: mpsc::Sender<PanelUpdate>,
    ) -> Self {
        let panel = request.panel();
        let task_panel = panel.clone();

        let handle = runtime.spawn(async move {
            let publish = |event: PanelEvent| {
                tx.send(PanelUpdate {
                    panel: task_panel.clone(),
                    generation,
                    event,
                })
                .is_ok()
            };

            let Some(period) = period else {
                if publish(PanelEvent::Loading) {
                    let payload = cycle.run(&request).await;
                    publish(PanelEvent::Ready(payload));
                }
                return;
            };

            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;

                // Récepteur fermé : l'UI est partie, on s'arrête
                if !publish(PanelEvent::Loading) {
                    break;
                }
                let payload = cycle.run(&request).await;
                if !publish(PanelEvent::Ready(payload)) {
                    break;
                }
            }

            debug!(panel = ?task_panel, generation, "Poller exiting (channel closed)");
        });

        debug!(panel = ?panel, generation, ?period, "Poller started");
        Self {
            panel,
            generation,
            handle,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.handle.abort();
        debug!(panel = ?self.panel, generation = self.generation, "Poller aborted");
    }
}

// ============================================================================
// Scheduler : un poller actif au plus par panneau
// ============================================================================

/// Possède les pollers actifs et attribue les générations
pub struct Scheduler {
    runtime: Handle,
    cycle: Arc<RefreshCycle>,
    intervals: Intervals,
    tx: mpsc::Sender<PanelUpdate>,
    pollers: HashMap<PanelId, Poller>,
    next_generation: u64,
}

impl Scheduler {
    pub fn new(
        runtime: Handle,
        cycle: Arc<RefreshCycle>,
        intervals: Intervals,
        tx: mpsc::Sender<PanelUpdate>,
    ) -> Self {
        Self {
            runtime,
            cycle,
            intervals,
            tx,
            pollers: HashMap::new(),
            next_generation: 1,
        }
    }

    /// (Re)démarre le poller du panneau ; retourne sa génération
    ///
    /// L'ancien poller du même panneau est abandonné (Drop -> abort) avant
    /// que le nouveau ne démarre.
    pub fn start(&mut self, request: RefreshRequest) -> (PanelId, u64) {
        let panel = request.panel();
        let generation = self.next_generation;
        self.next_generation += 1;

        if self.pollers.remove(&panel).is_some() {
            debug!(panel = ?panel, "Restarting poller");
        }

        let period = request.period(&self.intervals);
        let poller = Poller::spawn(
            &self.runtime,
            self.cycle.clone(),
            request,
            period,
            generation,
            self.tx.clone(),
        );
        self.pollers.insert(panel.clone(), poller);

        (panel, generation)
    }

    pub fn stop(&mut self, panel: &PanelId) {
        if self.pollers.remove(panel).is_some() {
            debug!(panel = ?panel, "Poller stopped");
        }
    }

    /// Exécute une commande de l'App
    ///
    /// Retourne le panneau et la génération pour un Start.
    pub fn execute(&mut self, command: PollCommand) -> Option<(PanelId, u64)> {
        match command {
            PollCommand::Start(request) => Some(self.start(request)),
            PollCommand::Stop(panel) => {
                self.stop(&panel);
                None
            }
        }
    }

    pub fn active(&self) -> usize {
        self.pollers.len()
    }

    pub fn generation_of(&self, panel: &PanelId) -> Option<u64> {
        self.pollers.get(panel).map(Poller::generation)
    }

    /// Arrête tous les pollers
    pub fn shutdown(&mut self) {
        let count = self.pollers.len();
        self.pollers.clear();
        info!(count, "All pollers stopped");
    }
}

// ============================================================================
// Tests unitaires
// ============================================================================
// Runtime multi-thread : le thread du test bloque sur recv_timeout pendant
// que les workers exécutent les pollers.
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Currency, TimeRange};

    const WAIT: Duration = Duration::from_secs(5);

    fn fast_intervals() -> Intervals {
        Intervals {
            indices: Duration::from_millis(20),
            stocks: Duration::from_millis(20),
            news: Duration::from_millis(20),
        }
    }

    fn scheduler(intervals: Intervals) -> (Scheduler, mpsc::Receiver<PanelUpdate>) {
        let (tx, rx) = mpsc::channel();
        let scheduler = Scheduler::new(
            Handle::current(),
            Arc::new(RefreshCycle::offline()),
            intervals,
            tx,
        );
        (scheduler, rx)
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_poller_loading_then_ready() {
        let (mut scheduler, rx) = scheduler(fast_intervals());

        let (panel, generation) = scheduler.start(RefreshRequest::News);
        assert_eq!(panel, PanelId::News);

        let first = rx.recv_timeout(WAIT).unwrap();
        assert_eq!(first.generation, generation);
        assert_eq!(first.event, PanelEvent::Loading);

        let second = rx.recv_timeout(WAIT).unwrap();
        assert!(matches!(second.event, PanelEvent::Ready(Payload::News(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_periodic_poller_keeps_refreshing() {
        let (mut scheduler, rx) = scheduler(fast_intervals());

        scheduler.start(RefreshRequest::Overview {
            currency: Currency::USD,
        });

        let mut ready = 0;
        while ready < 3 {
            let update = rx.recv_timeout(WAIT).unwrap();
            if let PanelEvent::Ready(Payload::Overview(quotes)) = update.event {
                assert_eq!(quotes.len(), 4);
                ready += 1;
            }
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_detail_poller_is_one_shot() {
        let (mut scheduler, rx) = scheduler(fast_intervals());

        scheduler.start(RefreshRequest::Detail {
            symbol: "AAPL".to_string(),
            range: TimeRange::OneWeek,
            currency: Currency::USD,
        });

        assert_eq!(rx.recv_timeout(WAIT).unwrap().event, PanelEvent::Loading);
        assert!(matches!(
            rx.recv_timeout(WAIT).unwrap().event,
            PanelEvent::Ready(Payload::Detail(_))
        ));
        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_restart_bumps_generation_and_replaces_poller() {
        let (mut scheduler, _rx) = scheduler(Intervals::default());

        let request = |currency| RefreshRequest::Stock {
            symbol: "AAPL".to_string(),
            currency,
        };
        let (panel, first) = scheduler.start(request(Currency::USD));
        let (_, second) = scheduler.start(request(Currency::EUR));

        assert!(second > first);
        assert_eq!(scheduler.active(), 1);
        assert_eq!(scheduler.generation_of(&panel), Some(second));

        scheduler.execute(PollCommand::Stop(panel.clone()));
        assert_eq!(scheduler.active(), 0);
        assert_eq!(scheduler.generation_of(&panel), None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_stopped_poller_publishes_nothing() {
        let (mut scheduler, rx) = scheduler(Intervals {
            news: Duration::from_millis(50),
            ..fast_intervals()
        });

        scheduler.start(RefreshRequest::News);
        // Attend le premier cycle complet
        while !matches!(rx.recv_timeout(WAIT).unwrap().event, PanelEvent::Ready(_)) {}

        scheduler.shutdown();
        tokio::time::sleep(Duration::from_millis(20)).await;
        while rx.try_recv().is_ok() {}

        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
    }
}
