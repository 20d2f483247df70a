use anyhow::{Context, Result};
use clap::Parser;
use mtslots::discovery::{DeviceDiscovery, UdevDiscovery};
use mtslots::{DeviceSession, SessionConfig, SessionError, TouchEvents};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mtslots", about = "Print multitouch lifecycle events")]
struct Cli {
    /// Device node to read (defaults to the first multitouch device found)
    #[arg(short, long)]
    device: Option<PathBuf>,

    /// List multitouch devices and exit
    #[arg(short, long)]
    list: bool,

    /// Maximum wait per poll in milliseconds; 0 polls without blocking
    #[arg(short, long, default_value_t = 100)]
    timeout_ms: u64,

    /// Trace every raw evdev record
    #[arg(short, long)]
    verbose: bool,

    /// Grab the device so no other client receives its events
    #[arg(short, long)]
    grab: bool,

    /// Print positions scaled to 0..1
    #[arg(short, long)]
    normalized: bool,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "mtslots=trace" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if cli.list {
        for device in UdevDiscovery::find_multitouch()? {
            println!(
                "{}\t{}\t{} slots",
                device.devnode.display(),
                device.name,
                device.num_slots
            );
        }
        return Ok(());
    }

    let path = match cli.device {
        Some(path) => path,
        None => {
            let devices =
                UdevDiscovery::find_multitouch().context("unable to find multitouch device")?;
            devices[0].devnode.clone()
        }
    };

    let config = SessionConfig::new(&path)
        .with_poll_timeout(Some(Duration::from_millis(cli.timeout_ms)))
        .with_verbose(cli.verbose)
        .with_grab(cli.grab);

    let mut session = DeviceSession::new(config);
    session.start()?;
    info!(
        name = session.name().unwrap_or("unknown"),
        path = %path.display(),
        "using touch device"
    );

    while session.running() {
        match session.poll() {
            Ok(events) => print_events(&session, &events, cli.normalized),
            Err(SessionError::DecodeCorruption { error, salvaged }) => {
                print_events(&session, &salvaged, cli.normalized);
                return Err(anyhow::Error::new(error).context("corrupt event stream"));
            }
            Err(e) => return Err(e.into()),
        }
    }

    info!(reason = ?session.stop_reason(), "device session ended");
    Ok(())
}

fn print_events(session: &DeviceSession, events: &TouchEvents, normalized: bool) {
    let ranges = session
        .capabilities()
        .map(|caps| (caps.x_range(), caps.y_range()));

    for touch in &events.finished {
        match session.track(touch.id) {
            Some(track) => println!(
                "touch point {} was finished after {} ms",
                touch.id,
                track.duration().as_millis()
            ),
            None => println!("touch point {} was finished", touch.id),
        }
    }
    for touch in &events.new {
        println!("new touch point {}", touch.id);
    }
    for touch in &events.updated {
        match (normalized, &ranges) {
            (true, Some((x, y))) => {
                let (nx, ny) = touch.normalized(x, y);
                println!("updated {} ({:.4}, {:.4})", touch.id, nx, ny);
            }
            _ => println!("updated {} ({}, {})", touch.id, touch.x(), touch.y()),
        }
    }
}
