use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tripfolio::camera;
use tripfolio::cli::{run_exif, run_list, run_upload};
use tripfolio::config::Config;
use tripfolio::logging::{init_logging, LOG_ENV};
use tripfolio::metadata::CoordinateFormat;
use tripfolio::serve::run_serve;

#[derive(Parser)]
#[command(name = "tripfolio")]
#[command(about = "Travel photo uploads with EXIF metadata")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract EXIF metadata from a local image
    Exif {
        /// Image file to read
        file: PathBuf,
        /// Report GPS as degrees/minutes/seconds instead of decimal
        #[arg(long)]
        dms: bool,
        /// Print the raw record as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the marketing name for a camera model code
    Camera {
        /// Model code as found in EXIF (e.g. ILCE-7CM2)
        model: String,
    },
    /// Upload an image into the configured store and catalog
    Upload {
        /// Image file to upload
        file: PathBuf,
        /// Config file (defaults to tripfolio.toml in the config directory)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// List cataloged photos, newest first
    List {
        /// Config file (defaults to tripfolio.toml in the config directory)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Page number, starting at 1
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Start the upload and media server
    Serve {
        /// Config file (defaults to tripfolio.toml in the config directory)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Port to listen on (overrides config)
        #[arg(short, long)]
        port: Option<u16>,
    },
}

fn main() -> Result<()> {
    // Initialize logging - guard must be held for logs to flush
    let _guard = init_logging().ok();
    let verbose = std::env::var(LOG_ENV).is_ok();
    let start = Instant::now();

    let cli = Cli::parse();

    let result = run_command(cli);

    if verbose {
        let elapsed = start.elapsed();
        eprintln!("Completed in {:.2?}", elapsed);
    }

    result
}

fn run_command(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Exif { file, dms, json } => {
            let format = if dms {
                CoordinateFormat::Dms
            } else {
                CoordinateFormat::Decimal
            };
            let report = run_exif(&file, format)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report.exif)?);
            } else {
                let d = &report.display;
                println!("Camera:        {}", d.camera);
                println!("Lens:          {}", d.lens);
                println!("Focal length:  {} ({} equiv.)", d.focal_length, d.focal_length_35mm);
                println!("Aperture:      {}", d.aperture);
                println!("Shutter speed: {}", d.shutter_speed);
                println!("ISO:           {}", d.iso);
                println!("Taken:         {}", d.taken_at);
                println!("Location:      {}", d.location);
            }
        }
        Commands::Camera { model } => {
            println!("{}", camera::humanize(Some(model.as_str())));
        }
        Commands::Upload { file, config } => {
            let config = Config::load(config.as_deref())?;
            let photo = run_upload(&config, &file)?;
            println!("Uploaded {} as #{}", photo.original_filename, photo.id);
            println!("{}", photo.url);
        }
        Commands::List { config, page } => {
            let config = Config::load(config.as_deref())?;
            let (photos, total) = run_list(&config, page)?;
            for photo in &photos {
                let taken = photo
                    .exif
                    .taken_at
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "#{} {} [{}] {}",
                    photo.id,
                    photo.original_filename,
                    taken,
                    camera::humanize(
                        photo
                            .exif
                            .camera_model
                            .as_deref()
                            .or(photo.exif.camera_make.as_deref())
                    )
                );
            }
            println!("{} of {} photos", photos.len(), total);
        }
        Commands::Serve { config, port } => {
            let mut config = Config::load(config.as_deref())?;
            if let Some(port) = port {
                config.server.port = port;
            }
            run_serve(&config)?;
        }
    }

    Ok(())
}
