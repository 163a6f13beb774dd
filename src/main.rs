// In src/main.rs

// Declare modules
pub mod app;
pub mod clock;
pub mod color;
pub mod config;
pub mod display;
pub mod error;
pub mod rain;
pub mod rasterizer;
pub mod surface;

use crate::{
    app::MatrixApp,
    clock::{Clock, MonotonicClock},
    config::{Config, DriverKind},
    display::{drivers::HeadlessDisplayDriver, DisplayDriver, DisplayManager, DriverConfig},
    rain::{FadeController, RowGenerator, ScrollCompositor, TextEmbedScheduler},
    rasterizer::{BlockRasterizer, GlyphMetrics, GlyphRasterizer},
};

use anyhow::{bail, Context};
use clap::Parser;
use log::info;
use std::path::PathBuf;
use std::rc::Rc;

/// Frames rendered by the headless driver when `--frames` is not given.
const DEFAULT_HEADLESS_FRAMES: u64 = 600;

/// Digital rain with optional text woven into the stream.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Text fragments to embed, in order
    text: Vec<String>,

    /// JSON config file; missing fields use defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Display driver
    #[arg(long, value_enum)]
    driver: Option<DriverKind>,

    /// Surface width in pixels
    #[arg(long)]
    width: Option<u32>,

    /// Surface height in pixels
    #[arg(long)]
    height: Option<u32>,

    /// Target frames per second (0 = unpaced)
    #[arg(long)]
    fps: Option<u32>,

    /// Fade the effect in at startup
    #[arg(long)]
    fade: bool,

    /// Seed for reproducible rain
    #[arg(long)]
    seed: Option<u64>,

    /// Stop after this many frames
    #[arg(long)]
    frames: Option<u64>,

    /// Write the last presented frame to this PPM file
    #[arg(long)]
    dump: Option<PathBuf>,
}

impl Cli {
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(driver) = self.driver {
            config.display.driver = driver;
        }
        if let Some(width) = self.width {
            config.display.width_px = width;
        }
        if let Some(height) = self.height {
            config.display.height_px = height;
        }
        if let Some(fps) = self.fps {
            config.performance.target_fps = fps;
        }
        if self.fade {
            config.fade.enabled = true;
        }
        if self.seed.is_some() {
            config.rain.seed = self.seed;
        }
    }
}

type Rasterizers = (Box<dyn GlyphRasterizer>, Box<dyn GlyphRasterizer>);

fn open_rasterizers(config: &Config) -> anyhow::Result<Rasterizers> {
    match config.display.driver {
        DriverKind::Headless => {
            let (rw, rh) = config.fonts.headless_rain_cell;
            let (tw, th) = config.fonts.headless_text_cell;
            Ok((
                Box::new(BlockRasterizer::new(rw, rh)),
                Box::new(BlockRasterizer::new(tw, th)),
            ))
        }
        #[cfg(feature = "x11")]
        DriverKind::X11 => {
            use crate::rasterizer::xft::XftRasterizer;
            let rain = XftRasterizer::open(&config.fonts.rain)
                .with_context(|| format!("Failed to open rain font '{}'", config.fonts.rain))?;
            let text = XftRasterizer::open(&config.fonts.text)
                .with_context(|| format!("Failed to open text font '{}'", config.fonts.text))?;
            Ok((Box::new(rain), Box::new(text)))
        }
        #[cfg(not(feature = "x11"))]
        DriverKind::X11 => bail!("termatrix was built without the `x11` feature"),
    }
}

fn open_display(config: &Config) -> anyhow::Result<DisplayManager> {
    let driver: Box<dyn DisplayDriver> = match config.display.driver {
        DriverKind::Headless => Box::new(HeadlessDisplayDriver::new()?),
        #[cfg(feature = "x11")]
        DriverKind::X11 => Box::new(crate::display::drivers::X11DisplayDriver::new()?),
        #[cfg(not(feature = "x11"))]
        DriverKind::X11 => bail!("termatrix was built without the `x11` feature"),
    };
    DisplayManager::new(
        driver,
        DriverConfig {
            width_px: config.display.width_px,
            height_px: config.display.height_px,
            title: config.display.title.clone(),
        },
    )
}

/// Main entry point for `termatrix`.
fn main() -> anyhow::Result<()> {
    // Initialize the logger. Default filter is "info" if RUST_LOG is not set.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_micros()
        .init();

    let cli = Cli::parse();
    info!("Starting termatrix...");

    let mut config =
        Config::load_or_default(cli.config.as_deref()).context("Failed to load configuration")?;
    cli.apply_overrides(&mut config);
    info!(
        "Display {}x{} via {:?}, {} text fragments",
        config.display.width_px,
        config.display.height_px,
        config.display.driver,
        cli.text.len()
    );

    // --- Glyphs ---
    let (mut rain_font, mut text_font) = open_rasterizers(&config)?;
    let metrics = GlyphMetrics::measure(
        rain_font.as_mut(),
        config.fonts.rain_sample,
        text_font.as_mut(),
        config.fonts.text_sample,
    )
    .context("Failed to measure glyphs")?;

    // --- Rain engine ---
    let clock: Rc<dyn Clock> = Rc::new(MonotonicClock::new());
    let generator = RowGenerator::new(
        rain_font,
        text_font,
        metrics,
        config.display.width_px,
        &config.rain,
        config.performance.glyph_cache_limit,
    )
    .context("Failed to create row generator")?;
    let scheduler = TextEmbedScheduler::new(
        cli.text.clone(),
        config.embed.min_interval_ms,
        Rc::clone(&clock),
    );
    let compositor = ScrollCompositor::new(generator, scheduler, config.display.height_px)
        .context("Failed to create compositor")?;
    let fade = config
        .fade
        .enabled
        .then(|| FadeController::new(&config.fade, Rc::clone(&clock)));

    // --- Display and frame loop ---
    let display = open_display(&config)?;
    let mut app = MatrixApp::new(compositor, fade, display, clock, &config.performance)
        .context("Failed to create application")?;

    let max_frames = match (cli.frames, config.display.driver) {
        (Some(n), _) => Some(n),
        (None, DriverKind::Headless) => Some(DEFAULT_HEADLESS_FRAMES),
        (None, DriverKind::X11) => None,
    };
    app.run(max_frames).context("Frame loop stopped on an error")?;

    if let Some(path) = &cli.dump {
        app.dump_frame(path)?;
    }

    info!("termatrix exited successfully.");
    Ok(())
}
