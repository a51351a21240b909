use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vitalwatch::config::parse_interval;
use vitalwatch::{
    FileSource, Monitor, MonitorStats, Output, Pipeline, PipelineConfig, ReadingSource,
    StreamSource,
};

#[derive(Parser, Debug)]
#[command(name = "vitalwatch")]
#[command(about = "Smooth, trend and alert on streamed vital-sign readings")]
struct Args {
    /// Path to an NDJSON capture file to tail
    #[arg(short, long, default_value = "vitals.ndjson", conflicts_with_all = ["connect", "device"])]
    file: PathBuf,

    /// Connect to a TCP endpoint for live readings (host:port)
    #[arg(short, long, conflicts_with_all = ["file", "device"])]
    connect: Option<String>,

    /// Read from a serial device node (e.g. /dev/ttyUSB0)
    #[arg(short, long, conflicts_with_all = ["file", "connect"])]
    device: Option<PathBuf>,

    /// Pipeline configuration file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Append events to this file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Also forward events to a TCP endpoint (host:port)
    #[arg(long)]
    forward: Option<String>,

    /// Poll interval when the source has nothing new (e.g. "100ms", "1s")
    #[arg(short, long, default_value = "100ms")]
    poll: String,

    /// Process what the file holds right now, print a summary and exit
    #[arg(long, conflicts_with_all = ["connect", "device"])]
    once: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vitalwatch=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = PipelineConfig::load(args.config.as_deref())?;
    let poll_interval = parse_interval(&args.poll)
        .with_context(|| format!("Invalid poll interval: {}", args.poll))?;
    let outputs = build_outputs(&args);

    // Build a tokio runtime for sources and outputs
    let rt = tokio::runtime::Runtime::new()?;

    rt.block_on(async {
        let source = open_source(&args).await?;
        let mut monitor = Monitor::new(source, Pipeline::new(config), outputs);

        if args.once {
            let stats = monitor.drain().await;
            print_summary(monitor.source_description(), &stats);
        } else {
            monitor.run(poll_interval).await;
        }
        Ok::<_, anyhow::Error>(())
    })
}

/// Open whichever source the arguments select.
async fn open_source(args: &Args) -> Result<Box<dyn ReadingSource>> {
    if let Some(ref addr) = args.connect {
        use tokio::net::TcpStream;

        info!("Connecting to {}...", addr);
        let stream = TcpStream::connect(addr)
            .await
            .with_context(|| format!("Failed to connect to {}", addr))?;
        info!("Connected");
        return Ok(Box::new(StreamSource::spawn(stream, addr)));
    }

    if let Some(ref path) = args.device {
        let device = tokio::fs::File::open(path)
            .await
            .with_context(|| format!("Failed to open device {}", path.display()))?;
        info!(device = %path.display(), "Reading from device");
        return Ok(Box::new(StreamSource::spawn(device, &path.display().to_string())));
    }

    Ok(Box::new(FileSource::new(&args.file)))
}

fn build_outputs(args: &Args) -> Vec<Output> {
    let mut outputs = vec![match args.output {
        Some(ref path) => Output::file(path),
        None => Output::Stdout,
    }];
    if let Some(ref addr) = args.forward {
        outputs.push(Output::tcp(addr));
    }
    for output in &outputs {
        info!(output = %output.description(), "Emitting events");
    }
    outputs
}

fn print_summary(source: &str, stats: &MonitorStats) {
    info!(
        source,
        readings = stats.readings,
        rejected = stats.rejected_values,
        warnings = stats.warnings,
        dangers = stats.dangers,
        output_errors = stats.output_errors,
        "Processed {} readings, raised {} alerts",
        stats.readings,
        stats.alerts()
    );
}
