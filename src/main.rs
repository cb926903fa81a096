// What you SEE:
// • A picture centred on a dark background.
// • Move the mouse: a lens bulges under the pointer and rings spread out behind it.
// • Space toggles the water on/off (off = the clean picture). ESC quits.

mod config;
mod draw;
mod error;
mod field;
mod renderer;
mod resample;
mod ripple;
mod schedule;
mod source;
mod types;

use clap::Parser;
use config::Config;
use draw::Drawer;
use error::Error;
use renderer::WaterRenderer;
use source::ImageLoad;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ripple-window")]
#[command(about = "Water-like distortion of a picture that follows your mouse")]
#[command(version)]
struct Cli {
    /// Config file path (defaults to ./ripple-window.toml if present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Picture to show (overrides the config file)
    #[arg(short, long)]
    image: Option<PathBuf>,

    /// Internal resolution factor in (0, 1]
    #[arg(short, long)]
    resolution: Option<f32>,

    /// Background colour, e.g. "#0a0c12"
    #[arg(short, long)]
    background: Option<String>,

    /// Draw the clean picture only, no animation
    #[arg(long = "static")]
    still: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn apply(self, config: &mut Config) {
        if let Some(image) = self.image { config.display.image = image; }
        if let Some(resolution) = self.resolution { config.display.resolution = resolution; }
        if let Some(background) = self.background { config.display.background_color = background; }
        if self.still { config.display.animated = false; }
    }
}

fn main() -> Result<(), Error> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("ripple_window=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ripple_window=info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    /* --- Config: file, then command-line overrides --- */
    let mut config = Config::load(cli.config.as_deref())?;
    cli.apply(&mut config);
    config.validate()?;
    info!(?config, "Loaded configuration");

    /* --- Window + renderer ---
       Visual: window opens showing only the background colour. */
    let d = &config.display;
    let mut drawer = Drawer::new(&d.title, d.width, d.height, d.frame_rate)?;
    let mut renderer = WaterRenderer::from_config(&config, drawer.size())?;

    /* --- Picture decodes in the background ---
       Visual: it pops in as soon as it's ready; on failure the background stays. */
    let mut load = ImageLoad::spawn(d.image.clone());

    /* --- FPS (debug log once per second) --- */
    let mut last_fps_time = Instant::now();
    let mut frames_this_second: u32 = 0;

    /* ------------------------------ Main loop ------------------------------ */
    while drawer.is_open() && !drawer.esc_pressed() {
        /* 1) Picture arrived? */
        if let Some(result) = load.poll() {
            renderer.image_loaded(result);
            info!(size = ?renderer.internal_size(), animating = renderer.is_loaded() && renderer.is_animated(), "renderer ready");
        }

        /* 2) Window resized -> rebuild buffers at the new size */
        let (w, h) = drawer.size();
        renderer.resize(w, h);

        /* 3) Inputs: latest pointer position only, plus the Space toggle */
        match drawer.mouse_pos() {
            Some((mx, my)) => renderer.pointer_moved(mx, my),
            None => renderer.pointer_left(),
        }
        if drawer.toggle_pressed() {
            let on = !renderer.is_animated();
            info!(animated = on, "toggled animation");
            renderer.set_animated(on);
        }

        /* 4) One frame of water (no-op when still or not loaded) */
        if renderer.tick()? {
            frames_this_second += 1;
        }

        /* 5) Present (the window stretches the small frame to full size) */
        drawer.present(renderer.frame())?;

        /* 6) FPS counter */
        let now = Instant::now();
        if now.duration_since(last_fps_time) >= Duration::from_secs(1) {
            let secs = now.duration_since(last_fps_time).as_secs_f32();
            let fps = frames_this_second as f32 / secs;
            debug!("FPS: {:.1} ({} ripples)", fps, renderer.ripple_count());
            frames_this_second = 0;
            last_fps_time = now;
        }
    }

    renderer.shutdown();
    Ok(())
}
