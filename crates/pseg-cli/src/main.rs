//! Demo driver: launch the segmenter server, segment some text, shut down.

use anyhow::Result;
use clap::Parser;
use pseg_client::SegmenterClient;
use pseg_core::SegmentRequest;
use pseg_runtime::{ServerShuttle, ShuttleConfig};
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Launches a pragmatic_segmenter server, runs the given texts through it,
/// prints the segmentations, and kills the server again.
#[derive(Debug, Parser)]
#[command(name = "pseg", version, about)]
struct Cli {
    /// Host the server binds to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Port the server listens on
    #[arg(short, long, default_value_t = 5000)]
    port: u16,

    /// Rack application file of the segmenter server
    #[arg(long, default_value = "config.ru")]
    config: PathBuf,

    /// Where the server should write its pid (defaults into the working
    /// directory)
    #[arg(long)]
    pid_file: Option<PathBuf>,

    /// Language code passed to the segmenter
    #[arg(long, default_value = "en")]
    lang: String,

    /// Per-request client timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Texts to segment
    #[arg(default_values_t = [String::from("   Hello. My name is John. And you   ")])]
    texts: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let mut config = ShuttleConfig::new(cli.host.clone(), cli.port, cli.config.clone());
    if let Some(pid_file) = cli.pid_file.clone() {
        config = config.with_pid_file(pid_file);
    }

    let shuttle = ServerShuttle::new(config);
    if let Err(e) = shuttle.start().await {
        shuttle.stop().await;
        return Err(e.into());
    }

    let client = SegmenterClient::with_timeout(
        &cli.host,
        cli.port,
        Duration::from_secs(cli.timeout_secs),
    );
    let request = SegmentRequest::new(cli.lang.clone(), cli.texts.clone());

    // Stop before surfacing any client error so the server never outlives
    // the demo.
    let outcome = client.segment(&request).await;
    shuttle.stop().await;
    let results = outcome?;

    info!(texts = results.len(), "segmentation complete");
    for (text, segmentation) in cli.texts.iter().zip(&results) {
        println!("text: {text:?}");
        for segment in &segmentation.segments {
            println!("  segment: {segment:?}");
        }
        println!("  mask:    {}", segmentation.mask);
    }

    Ok(())
}
