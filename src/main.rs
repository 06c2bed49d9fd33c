use anyhow::{Context, Result};
use audiosplit::audio::FfmpegCutter;
use audiosplit::cleanup::TokioCleanupScheduler;
use audiosplit::config::Config;
use audiosplit::pipeline::{ExtractionPipeline, PipelineConfig};
use audiosplit::server;
use audiosplit::source::YtDlpSource;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "audiosplit")]
#[command(version, about = "Split a video's audio track into labeled clips")]
#[command(long_about = "HTTP service that downloads a video's audio with yt-dlp, cuts it into clips at the given timestamps with FFmpeg, and serves the result as a zip for a limited time.")]
struct Cli {
    /// Config file (defaults to the per-user audiosplit/config.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to listen on, e.g. 0.0.0.0:3000
    #[arg(short, long)]
    listen: Option<String>,

    /// Directory holding downloads, clips and archives
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Seconds to keep a job's files before deleting them
    #[arg(short, long)]
    retention_secs: Option<u64>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };

    let builder = FmtSubscriber::builder()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact();

    if std::env::var_os("RUST_LOG").is_some() {
        builder.with_env_filter(EnvFilter::from_default_env()).init();
    } else {
        builder.with_max_level(level).init();
    }
}

fn apply_cli(config: &mut Config, cli: &Cli) {
    if let Some(ref listen) = cli.listen {
        config.listen_addr = listen.clone();
    }
    if let Some(ref dir) = cli.output_dir {
        config.output_dir = dir.clone();
    }
    if let Some(secs) = cli.retention_secs {
        config.retention_secs = secs;
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutting down");
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    // Load and validate configuration
    let mut config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
    apply_cli(&mut config, &cli);
    config
        .validate()
        .context("Configuration validation failed")?;

    std::fs::create_dir_all(&config.output_dir).with_context(|| {
        format!("Failed to create output dir {}", config.output_dir.display())
    })?;

    info!("Listen:     {}", config.listen_addr);
    info!("Output dir: {}", config.output_dir.display());
    info!("Format:     {}", config.audio_format);
    info!("Retention:  {}s", config.retention_secs);

    let source = YtDlpSource::new(&config.ytdlp_bin)
        .with_audio_format(config.audio_format.clone())
        .with_timeout(config.tool_timeout());
    let cutter = FfmpegCutter::new(&config.ffmpeg_bin).with_timeout(config.tool_timeout());

    // Missing tools only fail the jobs that need them.
    match source.check().await {
        Ok(version) => info!("yt-dlp:     {}", version),
        Err(e) => warn!("{}", e),
    }
    if let Err(e) = cutter.check().await {
        warn!("{}", e);
    }

    let pipeline = Arc::new(ExtractionPipeline::new(
        Arc::new(source),
        Arc::new(cutter),
        Arc::new(TokioCleanupScheduler::new()),
        PipelineConfig::from(&config),
    ));

    let listener = tokio::net::TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.listen_addr))?;

    server::serve(listener, pipeline, shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}
