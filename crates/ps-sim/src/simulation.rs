//! The simulation facade: a plant, its register bridge, and the scheduler.

use crate::error::{SimError, SimResult};
use crate::scheduler::{Fired, Scheduler, Task};
use ps_bridge::RegisterBridge;
use ps_core::DeviceId;
use ps_graph::Plant;
use ps_project::PlantConfig;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A running (or paused) plant.
///
/// Time is virtual: nothing happens until [`Simulation::advance`] moves the
/// clock, which makes every scenario reproducible. The real-time
/// [`Runner`](crate::Runner) drives `advance` from a worker thread.
#[derive(Debug)]
pub struct Simulation {
    config: PlantConfig,
    plant: Arc<Plant>,
    bridge: Arc<RegisterBridge>,
    scheduler: Scheduler,
    read_period: f64,
    active: bool,
    /// Bumped on every restart, when the clock goes back to 0.
    epoch: u64,
}

impl Simulation {
    /// Build the plant and bridge described by `config`. Nothing runs yet.
    pub fn new(config: PlantConfig) -> SimResult<Self> {
        ps_project::validate_config(&config).map_err(ps_project::ProjectError::from)?;
        let plant = Arc::new(ps_graph::build(&config)?);
        let bridge = Arc::new(RegisterBridge::new(&plant, &config.plcs)?);
        let scheduler = Scheduler::new(config.settings.speed)?;
        let read_period = config.settings.read_period_s;
        Ok(Self {
            config,
            plant,
            bridge,
            scheduler,
            read_period,
            active: false,
            epoch: 0,
        })
    }

    /// Load a YAML or JSON configuration and build it.
    pub fn from_path(path: &std::path::Path) -> SimResult<Self> {
        Self::new(ps_project::load(path)?)
    }

    pub fn plant(&self) -> &Arc<Plant> {
        &self.plant
    }

    pub fn bridge(&self) -> &Arc<RegisterBridge> {
        &self.bridge
    }

    pub fn config(&self) -> &PlantConfig {
        &self.config
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Number of restarts so far. Clock drivers re-base on a change.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn now(&self) -> f64 {
        self.scheduler.now()
    }

    pub fn speed(&self) -> f64 {
        self.scheduler.speed()
    }

    /// Takes effect on the next scheduled activation of each node.
    pub fn set_speed(&mut self, speed: f64) -> SimResult<()> {
        self.scheduler.set_speed(speed)?;
        info!(speed, "speed changed");
        Ok(())
    }

    /// Change a device's activation period; `None` stops its recurring timer.
    ///
    /// An activation already queued still fires once.
    pub fn set_period(&mut self, id: DeviceId, period: Option<f64>) -> SimResult<()> {
        let device = self.plant.device_or_err(id)?;
        device.set_period(period);
        if self.active
            && !self.scheduler.is_queued(Task::Device(id))
            && let Some(period) = device.period()
        {
            self.scheduler.schedule(Task::Device(id), period);
        }
        Ok(())
    }

    /// Start every node: each device fires once now, then recurs on its period.
    ///
    /// Calling it while already active does nothing, so nodes are never
    /// scheduled twice.
    pub fn activate(&mut self) -> Vec<Fired> {
        if self.active {
            return Vec::new();
        }
        self.active = true;
        info!(
            devices = self.plant.len(),
            speed = self.speed(),
            time = self.now(),
            "simulation activated"
        );

        let mut fired = Vec::with_capacity(self.plant.len());
        let now = self.now();
        for index in 0..self.plant.len() {
            let task = Task::Device(DeviceId::from_index(index as u32));
            self.fire(task);
            fired.push(Fired { time: now, task });
            self.reschedule(task);
        }
        self.reschedule(Task::ReadCycle);
        fired
    }

    /// Cancel every pending activation. Idempotent.
    pub fn deactivate(&mut self) {
        self.scheduler.cancel_all();
        if self.active {
            self.active = false;
            info!(time = self.now(), "simulation deactivated");
        }
    }

    /// Alias of [`Simulation::activate`].
    pub fn start(&mut self) -> Vec<Fired> {
        self.activate()
    }

    /// Alias of [`Simulation::deactivate`].
    pub fn pause(&mut self) {
        self.deactivate();
    }

    /// Rebuild the plant from its configuration and start again from time 0.
    ///
    /// Nothing is carried over from the previous run.
    pub fn restart(&mut self) -> SimResult<Vec<Fired>> {
        self.deactivate();
        let speed = self.speed();
        let mut fresh = Self::new(self.config.clone())?;
        fresh.set_speed(speed)?;
        fresh.epoch = self.epoch + 1;
        *self = fresh;
        Ok(self.activate())
    }

    /// Move the clock forward by `dt` virtual seconds, firing everything due.
    pub fn advance(&mut self, dt: f64) -> SimResult<Vec<Fired>> {
        if !(dt.is_finite() && dt >= 0.0) {
            return Err(SimError::InvalidArg {
                what: "dt must be non-negative and finite",
            });
        }
        Ok(self.run_until(self.now() + dt))
    }

    /// Fire everything due up to virtual time `until`, then set the clock there.
    pub fn run_until(&mut self, until: f64) -> Vec<Fired> {
        let mut fired = Vec::new();
        while let Some(entry) = self.scheduler.pop_due(until) {
            self.fire(entry.task);
            fired.push(entry);
            if self.active {
                self.reschedule(entry.task);
            }
        }
        self.scheduler.advance_clock(until);
        fired
    }

    /// Virtual time of the next pending activation.
    pub fn next_due(&self) -> Option<f64> {
        self.scheduler.next_due()
    }

    fn fire(&self, task: Task) {
        match task {
            Task::Device(id) => {
                if let Err(err) = self.plant.activate(id) {
                    warn!(%task, %err, "activation failed");
                }
            }
            Task::ReadCycle => {
                self.bridge.refresh();
                debug!(time = self.now(), "read cycle");
            }
        }
    }

    fn reschedule(&mut self, task: Task) {
        let period = match task {
            Task::Device(id) => self.plant.device(id).and_then(|d| d.period()),
            Task::ReadCycle => Some(self.read_period),
        };
        if let Some(period) = period {
            self.scheduler.schedule(task, period);
        }
    }
}
