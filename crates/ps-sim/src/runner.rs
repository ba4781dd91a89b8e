//! Real-time driver for a [`Simulation`].

use crate::scheduler::Fired;
use crate::simulation::Simulation;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, channel};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Longest the worker sleeps before re-checking the queue.
const MAX_WAIT: Duration = Duration::from_millis(50);

/// Shared handle to a simulation driven by a [`Runner`].
pub type SharedSimulation = Arc<Mutex<Simulation>>;

/// Advances a simulation's virtual clock in step with wall time on a worker thread.
///
/// Virtual seconds map one-to-one to wall seconds; the simulation's speed
/// already shortens the periods. Every fired task is forwarded on
/// `events` for observers such as the CLI.
///
/// The simulation may be paused, started again or restarted through
/// [`Runner::simulation`]; the worker keeps running until [`Runner::stop`].
pub struct Runner {
    pub events: Receiver<Fired>,
    stop_tx: Sender<()>,
    handle: Option<JoinHandle<()>>,
    simulation: SharedSimulation,
}

impl Runner {
    /// Activate `simulation` and start advancing it.
    pub fn start(simulation: SharedSimulation) -> Self {
        let (events_tx, events) = channel();
        let (stop_tx, stop_rx) = channel();

        let fired = lock(&simulation).activate();
        for entry in fired {
            let _ = events_tx.send(entry);
        }

        let worker = Arc::clone(&simulation);
        let handle = thread::spawn(move || Self::run(worker, stop_rx, events_tx));
        info!("runner started");

        Self {
            events,
            stop_tx,
            handle: Some(handle),
            simulation,
        }
    }

    pub fn simulation(&self) -> &SharedSimulation {
        &self.simulation
    }

    /// Stop the worker and deactivate the simulation.
    ///
    /// Once this returns no further activation happens. Calling it twice is harmless.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = self.stop_tx.send(());
            let _ = handle.join();
            lock(&self.simulation).deactivate();
            info!("runner stopped");
        }
    }

    /// True while the worker thread is alive.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    fn run(simulation: SharedSimulation, stop_rx: Receiver<()>, events_tx: Sender<Fired>) {
        let mut clock = WallClock::new(&lock(&simulation));

        loop {
            let wait = {
                let sim = lock(&simulation);
                clock.sync(&sim);
                sim.next_due()
                    .filter(|_| sim.is_active())
                    .map_or(MAX_WAIT, |due| wait_for(due - clock.target()))
            };

            match stop_rx.recv_timeout(wait) {
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
                Err(RecvTimeoutError::Timeout) => {}
            }

            let fired = {
                let mut sim = lock(&simulation);
                clock.sync(&sim);
                if !sim.is_active() {
                    continue;
                }
                sim.run_until(clock.target())
            };
            for entry in fired {
                if events_tx.send(entry).is_err() {
                    debug!("event receiver dropped");
                }
            }
        }
    }
}

/// Maps wall time onto the simulation's virtual clock.
///
/// Re-based whenever the simulation is paused or restarted, so neither the
/// time spent paused nor the time before a restart is ever replayed.
#[derive(Debug)]
struct WallClock {
    origin: f64,
    started: Instant,
    epoch: u64,
}

impl WallClock {
    fn new(sim: &Simulation) -> Self {
        Self {
            origin: sim.now(),
            started: Instant::now(),
            epoch: sim.epoch(),
        }
    }

    fn sync(&mut self, sim: &Simulation) {
        if !sim.is_active() || sim.epoch() != self.epoch {
            *self = Self::new(sim);
        }
    }

    /// Virtual time the simulation should have reached by now.
    fn target(&self) -> f64 {
        self.origin + self.started.elapsed().as_secs_f64()
    }
}

/// Wait of `seconds`, capped at [`MAX_WAIT`]. Overflowing or NaN waits become the cap.
fn wait_for(seconds: f64) -> Duration {
    Duration::try_from_secs_f64(seconds.max(0.0))
        .unwrap_or(MAX_WAIT)
        .min(MAX_WAIT)
}

impl Drop for Runner {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for Runner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Runner")
            .field("running", &self.is_running())
            .finish()
    }
}

fn lock(simulation: &SharedSimulation) -> MutexGuard<'_, Simulation> {
    simulation.lock().unwrap_or_else(PoisonError::into_inner)
}
