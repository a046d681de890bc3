//! Companion CLI for the simulated temperature sensor
//!
//! Attaches an in-process device instance and drives it the way the
//! original tooling drove the character device: monitor the sample
//! stream, run a threshold-crossing self-test, or inspect and update
//! the configuration attributes.

use anyhow::{bail, Context, Result};
use clap::Parser;
use simtemp_device::{Attribute, DeviceOptions, Sample, SimTempDevice};
use std::time::Duration;
use tokio::time::{timeout, Instant};
use tracing::{warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Per-sample wait before reporting a stall
const READ_TIMEOUT: Duration = Duration::from_secs(2);
/// How long the self-test waits for a crossing
const TEST_WINDOW: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(name = "simtemp")]
#[command(version)]
#[command(about = "Simulated temperature sensor monitor and configuration tool")]
struct Cli {
    /// Monitor temperature readings continuously
    #[arg(long)]
    monitor: bool,

    /// Configure ramp mode and verify a threshold crossing
    #[arg(long)]
    test: bool,

    /// Monitor duration in seconds (with --monitor)
    #[arg(long, value_name = "SECONDS")]
    duration: Option<f64>,

    /// Threshold for test mode (milli-degrees Celsius)
    #[arg(long, default_value_t = 30_000, value_name = "MC")]
    threshold: i32,

    /// Show the current configuration
    #[arg(long)]
    config: bool,

    /// Show device statistics
    #[arg(long)]
    stats: bool,

    /// Set the sampling period (milliseconds)
    #[arg(long, value_name = "MS")]
    set_sampling: Option<u32>,

    /// Set the alert threshold (milli-degrees Celsius)
    #[arg(long, value_name = "MC")]
    set_threshold: Option<i32>,

    /// Set the generation mode (normal, noisy or ramp)
    #[arg(long, value_name = "MODE")]
    set_mode: Option<String>,

    /// Reset the configuration to defaults
    #[arg(long)]
    reset: bool,
}

fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::WARN)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("Failed to set tracing subscriber");
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let device = SimTempDevice::attach(DeviceOptions::default());
    let result = run(&cli, &device).await;
    device.detach().await;
    result
}

async fn run(cli: &Cli, device: &SimTempDevice) -> Result<()> {
    if cli.config {
        print_config(device);
        return Ok(());
    }

    if cli.stats {
        let snap = device.stats();
        println!("Device statistics:");
        println!("  updates: {}", snap.updates);
        println!("  alerts: {}", snap.alerts);
        println!("  errors: {}", snap.errors);
        println!("  last_error: {}", snap.last_error);
        return Ok(());
    }

    if cli.reset {
        println!("Resetting configuration to defaults...");
        device
            .store_attr(Attribute::SamplingMs, "100")
            .context("reset sampling_ms")?;
        device
            .store_attr(Attribute::ThresholdMc, "45000")
            .context("reset threshold_mC")?;
        device
            .store_attr(Attribute::Mode, "normal")
            .context("reset mode")?;
        print_config(device);
        return Ok(());
    }

    if cli.set_sampling.is_some() || cli.set_threshold.is_some() || cli.set_mode.is_some() {
        println!("Updating configuration...");
        if let Some(ms) = cli.set_sampling {
            device
                .set_sampling_ms(ms)
                .with_context(|| format!("set sampling_ms={ms}"))?;
        }
        if let Some(mc) = cli.set_threshold {
            device.set_threshold_mc(mc);
        }
        if let Some(mode) = &cli.set_mode {
            device
                .store_attr(Attribute::Mode, mode)
                .with_context(|| format!("set mode={mode}"))?;
        }
        println!("Configuration updated");
        return Ok(());
    }

    if cli.test {
        return test_mode(device, cli.threshold).await;
    }

    if cli.monitor {
        return monitor_mode(device, cli.duration).await;
    }

    // Default: show a handful of samples
    println!("Reading temperature samples...");
    for _ in 0..5 {
        match read_record(device).await {
            Ok(sample) => print_sample(&sample),
            Err(err) => {
                warn!("{err:#}");
                break;
            }
        }
    }
    Ok(())
}

/// Read one wire record through the byte gateway and decode it
async fn read_record(device: &SimTempDevice) -> Result<Sample> {
    let mut buf = [0u8; Sample::WIRE_SIZE];
    timeout(READ_TIMEOUT, device.read(&mut buf))
        .await
        .context("read timeout")?
        .context("device read failed")?;
    Sample::from_bytes(&buf).context("malformed record")
}

fn print_sample(sample: &Sample) {
    let elapsed_s = sample.timestamp_ns as f64 / 1e9;
    let temp_c = sample.temp_mc as f64 / 1000.0;
    let alert = u8::from(sample.threshold_crossed());
    println!("[{elapsed_s:10.3}s] temp={temp_c:.3}°C alert={alert}");
}

fn print_config(device: &SimTempDevice) {
    println!("Current configuration:");
    for attr in [Attribute::SamplingMs, Attribute::ThresholdMc, Attribute::Mode] {
        print!("  {}: {}", attr.name(), device.show_attr(attr));
    }
}

async fn monitor_mode(device: &SimTempDevice, duration: Option<f64>) -> Result<()> {
    println!("Monitoring temperature readings...");
    println!("Press Ctrl+C to stop");
    println!();

    let deadline = duration.map(|secs| Instant::now() + Duration::from_secs_f64(secs));

    loop {
        if let Some(deadline) = deadline {
            if Instant::now() >= deadline {
                break;
            }
        }

        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("\nMonitoring stopped");
                break;
            }
            record = read_record(device) => match record {
                Ok(sample) => print_sample(&sample),
                Err(err) => warn!("{err:#}"),
            },
        }
    }
    Ok(())
}

/// Configure ramp mode against `threshold_mc` and wait for the
/// threshold-crossed flag; exits nonzero when no crossing shows up.
async fn test_mode(device: &SimTempDevice, threshold_mc: i32) -> Result<()> {
    println!("Running test mode...");
    println!(
        "Setting threshold to {threshold_mc} mC ({:.1}°C)",
        threshold_mc as f64 / 1000.0
    );
    println!();

    device.set_sampling_ms(100).context("set sampling_ms")?;
    device.set_threshold_mc(threshold_mc);
    // Ramp mode heads toward the threshold, so a crossing is quick
    device
        .store_attr(Attribute::Mode, "ramp")
        .context("set mode")?;

    println!("Waiting for a threshold crossing...");
    let deadline = Instant::now() + TEST_WINDOW;

    while Instant::now() < deadline {
        match read_record(device).await {
            Ok(sample) => {
                print_sample(&sample);
                if sample.threshold_crossed() {
                    println!();
                    println!("TEST PASSED: threshold crossing detected");
                    return Ok(());
                }
            }
            Err(err) => warn!("{err:#}"),
        }
    }

    bail!("TEST FAILED: no threshold crossing within {TEST_WINDOW:?}");
}
