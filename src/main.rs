//! # simtemp command line
//!
//! Drives the sampling engine the way a user-space client drives the sensor:
//! block on readiness, read one sample, print it.
//!
//! ## Commands
//! - **run:** stream samples until `--count` is reached, `quit` is typed or
//!   Ctrl-C is pressed. Live commands on stdin while running:
//!   `sampling N`, `htemp N`, `ltemp N`, `s_mode M`, `g_mode`, `stats`, `quit`.
//! - **stats:** run for a while, then print the alert statistics.
//! - **show-config:** print the effective configuration attributes.
//!
//! Logging goes through `env_logger` (`RUST_LOG=debug simtemp run`).

use std::{
    io::{BufRead, stdin},
    path::PathBuf,
    process::ExitCode,
    thread,
    time::Duration,
};

use chrono::{DateTime, Local, Utc};
use clap::{Args, Parser, Subcommand};
use log::{error, info, warn};

use simtemp::{
    Attribute, ConfigUpdate, Engine, EngineBuilder, EngineError, EngineHandle, Mode, Result,
    Sample, TemperatureSource,
    utils::{
        recorder::SampleRecorder,
        settings::{Settings, SourceKind},
    },
};

#[derive(Parser, Debug)]
#[command(version, about = "Simulated temperature sensor", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Stream samples as they become ready
    Run(RunArgs),
    /// Run for a while and print the alert statistics
    Stats {
        #[command(flatten)]
        common: CommonArgs,
        /// How long to sample before reporting; defaults to one interval
        #[arg(long)]
        duration_ms: Option<u64>,
    },
    /// Print the effective configuration
    ShowConfig {
        #[command(flatten)]
        common: CommonArgs,
    },
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// TOML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Notification interval in milliseconds
    #[arg(long)]
    sampling: Option<i32>,
    /// High threshold in milli-degrees Celsius
    #[arg(long)]
    htemp: Option<i32>,
    /// Low threshold in milli-degrees Celsius
    #[arg(long)]
    ltemp: Option<i32>,
    /// Waveform mode (normal, noisy, ramp)
    #[arg(long)]
    mode: Option<String>,
}

#[derive(Args, Debug)]
struct RunArgs {
    #[command(flatten)]
    common: CommonArgs,
    /// Stop after this many samples
    #[arg(short = 'n', long)]
    count: Option<u64>,
    /// Also log every sample to this CSV file
    #[arg(long)]
    csv: Option<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();
    log::debug!("Arguments: {cli:#?}");

    let result = match cli.command {
        Command::Run(args) => run(args),
        Command::Stats {
            common,
            duration_ms,
        } => stats(common, duration_ms),
        Command::ShowConfig { common } => show_config(common),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("[Main] {}", e);
            eprintln!("simtemp: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Settings file (or defaults) with command-line overrides applied.
fn load(common: &CommonArgs) -> Result<(Settings, simtemp::Config)> {
    let settings = match &common.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    let mut config = settings.config()?;

    let mut update = ConfigUpdate::default();
    if let Some(ms) = common.sampling {
        update = update.sampling_ms(ms);
    }
    if let Some(mc) = common.htemp {
        update = update.high_threshold_mc(mc);
    }
    if let Some(mc) = common.ltemp {
        update = update.low_threshold_mc(mc);
    }
    if let Some(text) = &common.mode {
        let (mode, dropped) = Mode::parse(text);
        if dropped > 0 {
            warn!("[Main] mode truncated, {} bytes dropped", dropped);
        }
        update = update.mode(mode);
    }
    config.apply(&update)?;
    Ok((settings, config))
}

fn build_source(settings: &Settings) -> Result<Box<dyn TemperatureSource>> {
    match settings.sampler.source {
        SourceKind::Simulated => Ok(Box::new(settings.simulated_source())),
        SourceKind::I2c => i2c_source(settings),
    }
}

#[cfg(feature = "linux-i2c")]
fn i2c_source(settings: &Settings) -> Result<Box<dyn TemperatureSource>> {
    let bus = linux_embedded_hal::I2cdev::new(&settings.sampler.i2c_bus).map_err(|e| {
        EngineError::HardwareRead(format!("{}: {}", settings.sampler.i2c_bus, e))
    })?;
    info!(
        "[Main] i2c source on {} addr 0x{:02x}",
        settings.sampler.i2c_bus, settings.sampler.i2c_address
    );
    Ok(Box::new(simtemp::I2cSource::new(
        bus,
        settings.sampler.i2c_address,
    )))
}

#[cfg(not(feature = "linux-i2c"))]
fn i2c_source(_settings: &Settings) -> Result<Box<dyn TemperatureSource>> {
    Err(EngineError::Settings(
        "source = \"i2c\" needs the linux-i2c feature".into(),
    ))
}

fn start_engine(settings: &Settings, config: simtemp::Config) -> Result<Engine> {
    let mut builder = EngineBuilder::new()
        .config(config)
        .boxed_source(build_source(settings)?);
    if let Some(tick) = settings.sampler_tick()? {
        builder = builder.sampler_tick(tick);
    }
    builder.start()
}

fn run(args: RunArgs) -> Result<()> {
    let (settings, config) = load(&args.common)?;
    info!("[Main] starting with {:?}", config);
    let engine = start_engine(&settings, config)?;
    let handle = engine.handle();

    {
        let handle = handle.clone();
        if let Err(e) = ctrlc::set_handler(move || {
            info!("Received Ctrl+C, stopping...");
            handle.request_shutdown();
        }) {
            warn!("[Main] no Ctrl-C handler: {}", e);
        }
    }

    {
        let handle = handle.clone();
        thread::Builder::new()
            .name("simtemp-commands".into())
            .spawn(move || command_loop(handle))?;
    }

    let recorder = args.csv.as_ref().map(SampleRecorder::start).transpose()?;

    let mut printed = 0u64;
    while args.count.is_none_or(|n| printed < n) {
        match handle.wait_ready() {
            Ok(_) => {}
            Err(EngineError::ShutdownInProgress) => break,
            Err(e) => return Err(e),
        }
        let sample = match handle.last_sample() {
            Ok(s) => s,
            Err(EngineError::ShutdownInProgress) => break,
            Err(e) => return Err(e),
        };
        println!("{}", format_sample(&sample));
        if let Some(rec) = &recorder {
            rec.record(sample);
        }
        printed += 1;
    }

    engine.stop();
    if let Some(rec) = recorder {
        let dropped = rec.dropped();
        let rows = rec.finish()?;
        info!("[Main] csv rows={} dropped={}", rows, dropped);
    }
    print!("{}", handle.stats_report());
    Ok(())
}

/// One line per sample, local time.
fn format_sample(sample: &Sample) -> String {
    let local =
        DateTime::<Utc>::from_timestamp_nanos(sample.timestamp_ns as i64).with_timezone(&Local);
    format!(
        "{}   temp={:.1}°C   high temp alert={}   low temp alert={}",
        local.format("%Y-%m-%d %H:%M:%S"),
        sample.celsius(),
        sample.high_alert as u8,
        sample.low_alert as u8
    )
}

fn command_loop(handle: EngineHandle) {
    for line in stdin().lock().lines() {
        let Ok(line) = line else { break };
        match execute(&handle, line.trim()) {
            Ok(true) => {}
            Ok(false) => break,
            Err(EngineError::ShutdownInProgress) => break,
            Err(e) => println!("error: {e}"),
        }
    }
}

/// Applies one live command. `Ok(false)` ends the session.
fn execute(handle: &EngineHandle, line: &str) -> Result<bool> {
    let (cmd, arg) = line.split_once(' ').unwrap_or((line, ""));
    let arg = arg.trim();
    match cmd {
        "" => {}
        "sampling" => {
            handle.store(Attribute::SamplingMs, arg)?;
        }
        "htemp" => {
            handle.store(Attribute::HighThresholdMc, arg)?;
        }
        "ltemp" => {
            handle.store(Attribute::LowThresholdMc, arg)?;
        }
        "s_mode" => {
            handle.store(Attribute::Mode, arg)?;
        }
        "g_mode" => print!("mode={}", handle.show(Attribute::Mode)),
        "stats" => print!("{}", handle.show(Attribute::Stats)),
        "quit" | "exit" => {
            handle.request_shutdown();
            return Ok(false);
        }
        other => println!(
            "unknown command '{other}' (sampling, htemp, ltemp, s_mode, g_mode, stats, quit)"
        ),
    }
    Ok(true)
}

fn stats(common: CommonArgs, duration_ms: Option<u64>) -> Result<()> {
    let (settings, config) = load(&common)?;
    let wait = duration_ms.unwrap_or(config.sampling_ms as u64);
    let engine = start_engine(&settings, config)?;
    thread::sleep(Duration::from_millis(wait));
    engine.stop();
    print!("{}", engine.handle().stats_report());
    Ok(())
}

fn show_config(common: CommonArgs) -> Result<()> {
    let (_, config) = load(&common)?;
    let handle = EngineHandle::new(config);
    for attr in Attribute::ALL.into_iter().filter(Attribute::is_writable) {
        print!("{}={}", attr.name(), handle.show(attr));
    }
    Ok(())
}
