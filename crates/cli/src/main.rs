//! CropSense CLI - crop-health indices, classification and alerts

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use cropsense_algorithms::alerts::{alert_report, AlertLabels};
use cropsense_algorithms::imagery::{composite, normalized_difference, IndexDefinition, SpectralIndex};
use cropsense_algorithms::pipeline::{run_pipeline, PipelineConfig};
use cropsense_algorithms::sampling::sample;
use cropsense_core::io::{read_geotiff, read_image_stack, read_sample_points, write_geotiff};
use cropsense_core::{Connectivity, ImageStack, Raster, SamplePoint};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "cropsense")]
#[command(author, version, about = "Crop-health monitoring from multispectral imagery", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about a raster file
    Info {
        /// Input raster file
        input: PathBuf,
    },
    /// Normalized difference of two band files
    Index {
        /// Index name used in messages: ndvi, ndwi, ndsi, pir
        index: String,
        /// Band added in the numerator (NIR for NDVI)
        positive: PathBuf,
        /// Band subtracted in the numerator (red for NDVI)
        negative: PathBuf,
        /// Output file
        output: PathBuf,
    },
    /// Cloud-filtered median composite of every index
    Composite {
        /// Scene manifest (JSON)
        manifest: PathBuf,
        /// Output directory, one GeoTIFF per index
        output_dir: PathBuf,
        /// Maximum cloud cover in percent
        #[arg(short, long, default_value = "10")]
        cloud_threshold: f64,
        /// Comma-separated indices, e.g. ndvi,ndwi
        #[arg(short, long, value_delimiter = ',')]
        indices: Option<Vec<String>>,
    },
    /// Sample a raster at labeled points
    Sample {
        /// Input raster file
        raster: PathBuf,
        /// Sample points (CSV or JSON)
        points: PathBuf,
        /// Sampling resolution in meters
        #[arg(short, long, default_value = "10")]
        scale: f64,
    },
    /// Full pipeline: composite, sample, train, classify, alert
    Run {
        /// Scene manifest (JSON)
        manifest: PathBuf,
        /// Labeled sample points (CSV or JSON)
        samples: PathBuf,
        /// Output directory
        output_dir: PathBuf,
        /// Pipeline configuration file (JSON)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Maximum cloud cover in percent
        #[arg(short, long)]
        cloud_threshold: Option<f64>,
        /// Sampling resolution in meters
        #[arg(short, long)]
        scale: Option<f64>,
        /// Number of trees in the random forest
        #[arg(short, long)]
        trees: Option<usize>,
        /// Region connectivity: 4 or 8
        #[arg(long)]
        connectivity: Option<u8>,
        /// Random seed for training
        #[arg(long)]
        seed: Option<u64>,
        /// Comma-separated labels that raise alerts
        #[arg(long, value_delimiter = ',')]
        alert_labels: Option<Vec<String>>,
        /// Also write the trained model as model.json
        #[arg(long)]
        save_model: bool,
    },
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn read_raster(path: &Path) -> Result<Raster<f64>> {
    let pb = spinner("Reading raster...");
    let raster: Raster<f64> = read_geotiff(path)
        .with_context(|| format!("Failed to read raster {}", path.display()))?;
    pb.finish_and_clear();
    info!("Input: {} x {}", raster.cols(), raster.rows());
    Ok(raster)
}

fn read_stack(path: &Path) -> Result<ImageStack> {
    let pb = spinner("Reading image stack...");
    let stack = read_image_stack(path)
        .with_context(|| format!("Failed to load scene manifest {}", path.display()))?;
    pb.finish_and_clear();
    info!("Stack: {} observations", stack.len());
    Ok(stack)
}

fn read_points(path: &Path) -> Result<Vec<SamplePoint>> {
    let points = read_sample_points(path)
        .with_context(|| format!("Failed to read sample points {}", path.display()))?;
    info!("Sample points: {}", points.len());
    Ok(points)
}

fn write_result(raster: &Raster<f64>, path: &Path) -> Result<()> {
    write_geotiff(raster, path)
        .with_context(|| format!("Failed to write {}", path.display()))
}

fn write_json<T: serde::Serialize>(value: &T, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), value)
        .with_context(|| format!("Failed to write {}", path.display()))
}

fn done(name: &str, path: &Path, elapsed: std::time::Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

fn parse_indices(names: &[String]) -> Result<Vec<IndexDefinition>> {
    names
        .iter()
        .map(|n| {
            n.parse::<SpectralIndex>()
                .map(SpectralIndex::definition)
                .with_context(|| format!("Unknown index: {}", n))
        })
        .collect()
}

fn parse_connectivity(value: u8) -> Result<Connectivity> {
    match Connectivity::try_from(value) {
        Ok(c) => Ok(c),
        Err(e) => bail!(e),
    }
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Info { input } => {
            let raster = read_raster(&input)?;
            let (rows, cols) = raster.shape();
            let bounds = raster.bounds();
            let stats = raster.statistics();

            println!("File: {}", input.display());
            println!("Dimensions: {} x {} ({} cells)", cols, rows, raster.len());
            println!("Cell size: {}", raster.cell_size());
            println!(
                "Bounds: ({:.6}, {:.6}) - ({:.6}, {:.6})",
                bounds.0, bounds.1, bounds.2, bounds.3
            );
            if let Some(crs) = raster.crs() {
                println!("CRS: {}", crs);
            }
            println!("\nStatistics:");
            if let Some(min) = stats.min {
                println!("  Min: {:.4}", min);
            }
            if let Some(max) = stats.max {
                println!("  Max: {:.4}", max);
            }
            if let Some(mean) = stats.mean {
                println!("  Mean: {:.4}", mean);
            }
            println!(
                "  Valid cells: {} ({:.1}%)",
                stats.valid_count,
                100.0 * stats.valid_count as f64 / raster.len() as f64
            );
        }

        Commands::Index {
            index,
            positive,
            negative,
            output,
        } => {
            let index: SpectralIndex = index.parse().context("Unknown index")?;
            let a = read_raster(&positive)?;
            let b = read_raster(&negative)?;
            let start = Instant::now();
            let result = normalized_difference(&a, &b)
                .with_context(|| format!("Failed to compute {}", index))?;
            let elapsed = start.elapsed();
            write_result(&result, &output)?;
            done(index.name(), &output, elapsed);
        }

        Commands::Composite {
            manifest,
            output_dir,
            cloud_threshold,
            indices,
        } => {
            let stack = read_stack(&manifest)?;
            let mut config = PipelineConfig {
                cloud_threshold,
                ..Default::default()
            };
            if let Some(names) = indices {
                config.indices = parse_indices(&names)?;
            }
            config.validate()?;

            let pb = spinner("Compositing...");
            let start = Instant::now();
            let result = composite(&stack, &config.composite_params())?;
            let elapsed = start.elapsed();
            pb.finish_and_clear();

            std::fs::create_dir_all(&output_dir)
                .with_context(|| format!("Failed to create {}", output_dir.display()))?;
            for (name, raster) in result.indices.iter() {
                write_result(raster, &output_dir.join(format!("{}.tif", name)))?;
            }
            println!(
                "Observations used ({} of {}): {}",
                result.observations.len(),
                stack.len(),
                result.observations.join(", ")
            );
            done("Composites", &output_dir, elapsed);
        }

        Commands::Sample {
            raster,
            points,
            scale,
        } => {
            let raster = read_raster(&raster)?;
            let points = read_points(&points)?;

            println!("id,x,y,label,value");
            for p in &points {
                let value = sample(&raster, p.location, scale)
                    .with_context(|| format!("Failed to sample point {}", p.id))?;
                println!("{},{},{},{},{}", p.id, p.location.x, p.location.y, p.label, value);
            }
        }

        Commands::Run {
            manifest,
            samples,
            output_dir,
            config,
            cloud_threshold,
            scale,
            trees,
            connectivity,
            seed,
            alert_labels,
            save_model,
        } => {
            let mut cfg = match &config {
                Some(path) => PipelineConfig::from_path(path)
                    .with_context(|| format!("Failed to load config {}", path.display()))?,
                None => PipelineConfig::default(),
            };
            if let Some(v) = cloud_threshold {
                cfg.cloud_threshold = v;
            }
            if let Some(v) = scale {
                cfg.scale = v;
            }
            if let Some(v) = trees {
                cfg.tree_count = v;
            }
            if let Some(v) = connectivity {
                cfg.connectivity = parse_connectivity(v)?;
            }
            if let Some(v) = seed {
                cfg.seed = v;
            }
            if let Some(labels) = alert_labels {
                cfg.alert_labels = AlertLabels::new(labels);
            }
            cfg.validate()?;

            let stack = read_stack(&manifest)?;
            let points = read_points(&samples)?;

            let pb = spinner("Running pipeline...");
            let start = Instant::now();
            let out = run_pipeline(&stack, &points, &cfg).context("Pipeline failed")?;
            let elapsed = start.elapsed();
            pb.finish_and_clear();

            let pb = spinner("Writing outputs...");
            std::fs::create_dir_all(&output_dir)
                .with_context(|| format!("Failed to create {}", output_dir.display()))?;
            for (name, raster) in out.composite.indices.iter() {
                write_result(raster, &output_dir.join(format!("{}.tif", name)))?;
            }
            write_result(&out.classification.labels, &output_dir.join("classification.tif"))?;
            write_result(&out.classification.confidence, &output_dir.join("confidence.tif"))?;
            write_json(&out.classification.legend(), &output_dir.join("classes.json"))?;
            write_json(&out.regions, &output_dir.join("regions.json"))?;
            if save_model {
                write_json(&out.model, &output_dir.join("model.json"))?;
            }
            pb.finish_and_clear();

            print!("{}", alert_report(&out.regions));
            done("Results", &output_dir, elapsed);
        }
    }

    Ok(())
}
