use std::fs::File;
use std::io::stdout;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use log::{error, info};
use simplelog::{Config, WriteLogger};

use folio::event_source::KeyboardEventSource;
use folio::export::{export_pages, parse_page_range};
use folio::notification::{LogNotifier, Toast};
use folio::panic_handler::{self, TerminalSession};
use folio::settings;
use folio::viewer::{DisplayMetrics, Engine, PdfViewer, ViewerConfig};
use folio::{TerminalFullscreen, run_presenter};

/// Page-at-a-time PDF viewer for the terminal
#[derive(Parser, Debug)]
#[command(name = "folio", version, about)]
struct Args {
    /// Path, file:// or http(s) URL of the PDF
    url: String,

    /// Render pages to JPEG files in this directory instead of presenting
    #[arg(long, value_name = "DIR")]
    export: Option<PathBuf>,

    /// Pages to export, `N` or `A-B`
    #[arg(long, value_name = "RANGE", requires = "export")]
    pages: Option<String>,

    /// Viewport width in CSS pixels, selects the render scale tier
    #[arg(long, default_value_t = 1024)]
    viewport_width: u32,

    /// Device pixel ratio
    #[arg(long, default_value_t = 1.0)]
    pixel_ratio: f32,

    /// Settings file to use instead of the user config directory
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    #[arg(long, default_value = "folio.log")]
    log_file: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();

    match &args.config {
        Some(path) => settings::load_settings_from_path(path),
        None => settings::load_settings(),
    }
    let settings = settings::get_settings();

    WriteLogger::init(
        settings.log_level_filter(),
        Config::default(),
        File::create(&args.log_file)?,
    )?;
    info!("Starting folio for {}", args.url);

    let mut config = ViewerConfig::from(&settings);
    config.display = DisplayMetrics {
        viewport_width: args.viewport_width,
        pixel_ratio: args.pixel_ratio,
    };
    let engine = std::sync::Arc::new(Engine::mupdf());

    if let Some(dir) = &args.export {
        let pages = args.pages.as_deref().map(parse_page_range).transpose()?;
        let mut viewer = PdfViewer::new(
            engine,
            config.clone(),
            Box::new(TerminalFullscreen::new()),
            Box::new(LogNotifier),
        );
        let timeout = config.render.timeout + Duration::from_secs(30);
        let written = export_pages(&mut viewer, &args.url, dir, pages, timeout)?;
        for path in &written {
            println!("{}", path.display());
        }
        info!("Exported {} pages", written.len());
        return Ok(());
    }

    panic_handler::initialize_panic_handler();

    let (toast_tx, toast_rx) = flume::unbounded::<Toast>();
    let mut viewer = PdfViewer::new(
        engine,
        config,
        Box::new(TerminalFullscreen::new()),
        Box::new(toast_tx),
    );

    let terminal = TerminalSession::start()?;
    let mut out = stdout();

    // The presenter keeps running so the status line can show the error
    if let Err(e) = viewer.load(&args.url) {
        error!("Could not start loading {}: {e}", args.url);
    }
    let mut source = KeyboardEventSource;
    let res = run_presenter(&mut viewer, &mut source, &mut out, &toast_rx);

    viewer.exit_presentation();
    drop(viewer);
    drop(terminal);

    if let Err(err) = res {
        error!("Application error: {err:?}");
        println!("{err:?}");
    }

    info!("Shutting down folio");
    Ok(())
}
