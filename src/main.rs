use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use image::{GenericImageView, RgbaImage};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::level_filters::LevelFilter;
use tracing::{info, warn};

use pixoo_serial::display::hex_dump;
use pixoo_serial::patterns::Pattern;
use pixoo_serial::playlist::Playlist;
use pixoo_serial::{encode_image, Config, Framing, Pixoo, Sent};

#[derive(Parser)]
#[command(name = "pixoo_serial")]
#[command(about = "Pixoo Serial - palette LED matrix sender\n\nEncodes images and sends them to a 32x32 display over a Bluetooth serial link.", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,

    /// Enable detailed debug (hex dumps every frame)
    #[arg(long, global = true)]
    ddebug: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Send a single image file
    Send {
        /// Path to configuration file (JSON)
        config: PathBuf,
        image: PathBuf,
        /// Number to stamp in the top-left corner
        #[arg(long)]
        overlay: Option<u32>,
    },
    /// Send a built-in test pattern
    Pattern {
        /// Path to configuration file (JSON)
        config: PathBuf,
        #[arg(value_enum)]
        pattern: Pattern,
        #[arg(long)]
        overlay: Option<u32>,
    },
    /// Cycle through images, stamping the round number, until Ctrl-C
    Play {
        /// Path to configuration file (JSON)
        config: PathBuf,
        #[arg(required = true)]
        images: Vec<PathBuf>,
        /// Seconds each image stays on screen
        #[arg(long, default_value_t = 10)]
        interval: u64,
        /// Round number to start counting from
        #[arg(long, default_value_t = 1)]
        start_round: u32,
    },
    /// Print the encoded frame as hex without touching a device
    Encode {
        image: PathBuf,
        #[arg(long, value_enum)]
        framing: Framing,
        #[arg(long)]
        overlay: Option<u32>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // ddebug implies debug
    let level = if cli.ddebug {
        LevelFilter::TRACE
    } else if cli.debug {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    match cli.command {
        Command::Send { config, image, overlay } => {
            let config = load_config(&config)?;
            let bitmap = load_image(&image)?;
            send_once(&config, &bitmap, overlay)
        }
        Command::Pattern { config, pattern, overlay } => {
            let config = load_config(&config)?;
            send_once(&config, &pattern.render(), overlay)
        }
        Command::Play { config, images, interval, start_round } => {
            let config = load_config(&config)?;
            let mut playlist = Playlist::new(images);
            playlist.set_round(start_round);
            play(&config, playlist, Duration::from_secs(interval))
        }
        Command::Encode { image, framing, overlay } => {
            let bitmap = load_image(&image)?;
            match encode_image(&bitmap, overlay, framing)? {
                Some(frame) => println!("{}", hex_dump(&frame)),
                None => warn!("{} has no pixels", image.display()),
            }
            Ok(())
        }
    }
}

fn load_config(path: &Path) -> Result<Config> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config = serde_json::from_str(&data)
        .with_context(|| format!("Failed to parse config {}", path.display()))?;
    Ok(config)
}

fn load_image(path: &Path) -> Result<RgbaImage> {
    let img = image::open(path).with_context(|| format!("Failed to open image {}", path.display()))?;
    info!("Opened {} ({}x{})", path.display(), img.width(), img.height());
    Ok(img.to_rgba8())
}

fn send_once(config: &Config, bitmap: &RgbaImage, overlay: Option<u32>) -> Result<()> {
    let mut pixoo = Pixoo::from_config(config);
    pixoo
        .connect()
        .with_context(|| format!("Failed to connect to {}", config.device.name))?;

    let sent = pixoo.show_image(Some(bitmap), overlay);
    pixoo.close();

    match sent {
        Sent::Delivered { chunks } => {
            info!("✓ Image sent in {} chunks", chunks);
            Ok(())
        }
        other => anyhow::bail!("Image was not delivered ({:?})", other),
    }
}

fn play(config: &Config, mut playlist: Playlist, interval: Duration) -> Result<()> {
    let mut pixoo = Pixoo::from_config(config);
    pixoo
        .connect()
        .with_context(|| format!("Failed to connect to {}", config.device.name))?;

    // Set up Ctrl-C handler with graceful shutdown
    let running = Arc::new(AtomicBool::new(true));
    let handler_flag = Arc::clone(&running);
    if let Err(e) = ctrlc::set_handler(move || {
        handler_flag.store(false, Ordering::Relaxed);
    }) {
        warn!("Could not set Ctrl-C handler: {}", e);
    }

    info!("Playing {} images every {:?} (Press Ctrl-C to stop)", playlist.len(), interval);

    while running.load(Ordering::Relaxed) {
        let Some(path) = playlist.current() else {
            break;
        };

        // An unreadable file is shown as nothing rather than ending playback
        let bitmap = match image::open(path) {
            Ok(img) => Some(img.to_rgba8()),
            Err(e) => {
                warn!("Skipping {}: {}", path.display(), e);
                None
            }
        };

        info!("Round {}: {}", playlist.round(), path.display());
        if pixoo.ensure_connected()
            && pixoo.show_image(bitmap.as_ref(), Some(playlist.round())) == Sent::Aborted
        {
            warn!("Link to {} lost, reconnecting next image", pixoo.device().name);
        }

        let shown_at = Instant::now();
        while running.load(Ordering::Relaxed) && shown_at.elapsed() < interval {
            thread::sleep(Duration::from_millis(100));
        }
        playlist.advance();
    }

    info!("Shutting down...");
    pixoo.close();
    Ok(())
}
