//! mediagrab: scrape the media assets of a page and download them as one ZIP
//! bundle built by the scraping service.

mod effects;
mod render;
mod session;
mod settings;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use grab_core::MediaType;
use grab_engine::ReqwestCollaborator;
use grab_logging::{grab_info, grab_warn, LogDestination};
use log::LevelFilter;

use crate::effects::EffectRunner;
use crate::session::{GrabRequest, Session};
use crate::settings::{load_settings, SETTINGS_FILENAME};

/// Scrape a page and download its media as a ZIP bundle
#[derive(Parser, Debug)]
#[command(name = "mediagrab")]
#[command(version)]
#[command(about = "Scrape a page and download its media assets as one ZIP bundle")]
struct Args {
    /// Page to scrape
    #[arg(long, value_name = "URL")]
    url: String,

    /// Also scrape every detected pagination page
    #[arg(long)]
    all_pages: bool,

    /// Media types to collect: audio, img, pdf, svg, video (default: all)
    #[arg(long, value_name = "TYPES", value_delimiter = ',')]
    types: Vec<MediaType>,

    /// Only keep text results containing this keyword
    #[arg(long)]
    keyword: Option<String>,

    /// Restrict the scrape to elements matching this CSS selector
    #[arg(long, value_name = "SELECTOR")]
    selector: Option<String>,

    /// Bundle name (default: page title, or media-assets.zip)
    #[arg(long, value_name = "NAME")]
    bundle_name: Option<String>,

    /// Directory the bundle is written to
    #[arg(long, value_name = "PATH")]
    output_dir: Option<PathBuf>,

    /// Base URL of the scraping service
    #[arg(long, value_name = "URL")]
    server: Option<String>,

    /// Settings file
    #[arg(long, value_name = "PATH", default_value = SETTINGS_FILENAME)]
    config: PathBuf,

    /// Enable debug logging
    #[arg(long)]
    verbose: bool,

    /// Also write logs to ./mediagrab.log
    #[arg(long)]
    log_file: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let destination = if args.log_file {
        LogDestination::Both
    } else {
        LogDestination::Terminal
    };
    let level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    grab_logging::initialize(destination, level);

    let mut settings = load_settings(&args.config);
    if let Some(server) = &args.server {
        settings.server_url = server.clone();
    }
    if let Some(dir) = &args.output_dir {
        settings.output_dir = dir.clone();
    }
    grab_info!("Using scraping service at {}", settings.server_url);

    let api = ReqwestCollaborator::new(settings.client_settings())?;
    let mut session = Session::new(EffectRunner::new(Arc::new(api)));

    let request = GrabRequest {
        url: args.url,
        all_pages: args.all_pages,
        media_types: args.types,
        keyword: args.keyword,
        selector: args.selector,
        bundle_name: args.bundle_name,
    };
    let saved = session
        .run(&request, &settings.output_dir, interrupted())
        .await;
    let jobs = session.runner().jobs();
    grab_info!(
        "Progress channels opened {} closed {}",
        jobs.channels_opened(),
        jobs.channels_closed()
    );
    match saved? {
        Some(path) => println!("Saved {}", path.display()),
        None => println!("Cancelled"),
    }
    Ok(())
}

async fn interrupted() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        grab_warn!("Ctrl-C handler unavailable: {}", err);
        std::future::pending::<()>().await;
    }
}
