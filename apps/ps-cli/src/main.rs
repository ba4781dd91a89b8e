use clap::{Parser, Subcommand};
use ps_bridge::RegisterBridge;
use ps_devices::Device;
use ps_sim::{Runner, Simulation, Task};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::info;
use tracing_subscriber::EnvFilter;

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(name = "ps-cli")]
#[command(about = "PlantSim CLI - industrial plant device simulator", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a plant configuration and build its graph
    Validate {
        /// Path to the plant YAML or JSON file
        config_path: PathBuf,
    },
    /// List devices, wiring, sensors and PLC registers
    Inspect {
        /// Path to the plant YAML or JSON file
        config_path: PathBuf,
    },
    /// Run the plant and print every PLC's registers on each read cycle
    Run {
        /// Path to the plant YAML or JSON file
        config_path: PathBuf,
        /// Seconds to run for
        #[arg(long, default_value_t = 10.0)]
        duration: f64,
        /// Override the configured speed multiplier
        #[arg(long)]
        speed: Option<f64>,
        /// Advance a virtual clock instead of waiting on wall time
        #[arg(long = "virtual")]
        virtual_clock: bool,
    },
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Validate { config_path } => cmd_validate(&config_path),
        Commands::Inspect { config_path } => cmd_inspect(&config_path),
        Commands::Run {
            config_path,
            duration,
            speed,
            virtual_clock,
        } => cmd_run(&config_path, duration, speed, virtual_clock),
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn cmd_validate(config_path: &Path) -> CliResult<()> {
    println!("Validating plant: {}", config_path.display());
    let config = ps_project::load(config_path)?;
    let plant = ps_graph::build(&config)?;
    println!(
        "✓ Plant is valid ({} devices, {} sensors, {} PLCs)",
        config.devices.len(),
        config.sensors.len(),
        config.plcs.len()
    );
    info!(nodes = plant.len(), "graph built");
    Ok(())
}

fn cmd_inspect(config_path: &Path) -> CliResult<()> {
    let sim = Simulation::from_path(config_path)?;
    let plant = sim.plant();

    println!("Devices:");
    for device in plant.devices().iter().filter(|d| !d.is_sensor()) {
        print_device(plant, device);
    }

    println!("Sensors:");
    for sensor in plant.sensors() {
        print_device(plant, sensor);
        if let Some(target) = sensor.monitored().and_then(|id| plant.device(id)) {
            println!("      monitors {}", target);
        }
    }

    println!("PLCs:");
    for name in sim.bridge().plc_names() {
        println!("  {}", name);
        for (register, entry) in sim.bridge().snapshot(&name)? {
            println!(
                "    [{}] {} = {}{}",
                entry.address,
                register,
                entry.value,
                if entry.writable { " (rw)" } else { "" }
            );
        }
    }
    Ok(())
}

fn print_device(plant: &ps_graph::Plant, device: &Device) {
    let labels = |ids: Vec<_>| {
        ids.into_iter()
            .filter_map(|id| plant.device(id).map(|d| d.label().to_string()))
            .collect::<Vec<_>>()
            .join(", ")
    };
    let period = device
        .period()
        .map_or_else(|| "-".to_string(), |p| format!("{p} s"));
    println!("  {}  period: {}", device, period);

    let inputs = labels(device.inputs());
    let outputs = labels(device.outputs());
    if !inputs.is_empty() {
        println!("      inputs:  {}", inputs);
    }
    if !outputs.is_empty() {
        println!("      outputs: {}", outputs);
    }
    if let Some(volume) = device.volume() {
        println!("      volume:  {}", volume);
    }
    if let Some(state) = device.actuation() {
        println!("      state:   {}", state);
    }
    if let Some(fluid) = device.fluid() {
        println!("      fluid:   {}", fluid);
    }
}

fn cmd_run(
    config_path: &Path,
    duration: f64,
    speed: Option<f64>,
    virtual_clock: bool,
) -> CliResult<()> {
    let mut sim = Simulation::from_path(config_path)?;
    if let Some(speed) = speed {
        sim.set_speed(speed)?;
    }
    let bridge = Arc::clone(sim.bridge());
    for name in bridge.plc_names() {
        bridge.register(&name)?;
    }

    if virtual_clock {
        sim.activate();
        print_registers(&bridge, sim.now())?;
        // One step per read cycle so every refresh gets printed.
        let step = sim.config().settings.read_period_s / sim.speed();
        let end = sim.now() + duration.max(0.0);
        while sim.now() < end {
            let fired = sim.advance(step.min(end - sim.now()))?;
            if fired.iter().any(|f| f.task == Task::ReadCycle) {
                print_registers(&bridge, sim.now())?;
            }
        }
        return Ok(());
    }

    let shared = Arc::new(Mutex::new(sim));
    let mut runner = Runner::start(Arc::clone(&shared));
    print_registers(&bridge, 0.0)?;

    let started = Instant::now();
    let deadline = Duration::try_from_secs_f64(duration.max(0.0)).unwrap_or(Duration::MAX);
    while started.elapsed() < deadline {
        let left = deadline.saturating_sub(started.elapsed());
        match runner.events.recv_timeout(left) {
            Ok(fired) if fired.task == Task::ReadCycle => print_registers(&bridge, fired.time)?,
            Ok(_) => {}
            Err(_) => break,
        }
    }
    runner.stop();
    Ok(())
}

fn print_registers(bridge: &RegisterBridge, time: f64) -> CliResult<()> {
    for name in bridge.plc_names() {
        let line = serde_json::json!({
            "time": time,
            "plc": name,
            "registers": bridge.snapshot(&name)?,
        });
        println!("{}", line);
    }
    Ok(())
}
