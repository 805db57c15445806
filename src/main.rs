use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;

use websnap::{ImageSurface, MemorySurface, SnapshotClient, SnapshotConfig, SnapshotRequest};

/// Request a remotely rendered website snapshot.
#[derive(Parser, Debug)]
#[command(name = "websnap", version, about)]
struct Args {
    /// Website URL to snapshot
    url: String,

    /// API key for the snapshot service (free-tier keys start with '1')
    #[arg(long, env = "WEBSNAP_API_KEY")]
    api_key: String,

    /// JSON file overriding parts of the client configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Snapshot width in pixels (0 = server default)
    #[arg(long, default_value_t = 0)]
    width: u32,

    /// Snapshot height in pixels, only honored together with --width
    #[arg(long, default_value_t = 0)]
    height: u32,

    /// Maximum acceptable age of a cached snapshot, in minutes
    #[arg(long)]
    max_age: Option<i64>,

    /// Retry budget override
    #[arg(long)]
    retries: Option<u32>,

    /// Ask the server to prepare the snapshot without downloading it
    #[arg(long)]
    preload: bool,

    /// Fetch the site's icon instead of a page snapshot
    #[arg(long)]
    icon: bool,

    /// Download the resolved image to this file
    #[arg(long)]
    out: Option<PathBuf>,
}

fn load_config(args: &Args) -> anyhow::Result<SnapshotConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file {}", path.display()))?;
            serde_json::from_str::<SnapshotConfig>(&raw)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?
        }
        None => SnapshotConfig::default(),
    };
    config.set_api_key(&args.api_key);
    Ok(config)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let client = SnapshotClient::new(load_config(&args)?)?;

    let request = SnapshotRequest {
        url: args.url.clone(),
        preload: args.preload,
        width: args.width,
        height: args.height,
        max_age_minutes: args.max_age,
        retries: args.retries,
    };

    let mut surface = MemorySurface::new(args.width, args.height);
    let accepted = if args.icon {
        client.request_website_icon(&request, Some(&mut surface))
    } else {
        client.request_snapshot(&request, Some(&mut surface))
    };

    if !accepted {
        bail!("request rejected, see log output");
    }

    if args.preload {
        println!("preload dispatched for {}", args.url);
        return Ok(());
    }

    let final_source = surface
        .source()
        .context("request finished without resolving a source")?;

    // Anything not served by the API entry point is a templated error image
    if !final_source.starts_with(&client.config.api_entry_point) {
        bail!("snapshot failed, error image: {}", final_source);
    }

    println!("{}", final_source);

    if let Some(out) = &args.out {
        let bytes = reqwest::blocking::get(final_source)
            .and_then(|r| r.bytes())
            .with_context(|| format!("Failed to download {}", final_source))?;
        fs::write(out, &bytes)
            .with_context(|| format!("Failed to write {}", out.display()))?;
        println!("saved {} bytes to {}", bytes.len(), out.display());
    }

    Ok(())
}
