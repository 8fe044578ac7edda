use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use facefind_core::annotate;
use facefind_core::enrollment;
use facefind_core::finder::{self, FinderError};
use facefind_core::report::SearchReport;
use facefind_core::{BoundingBox, DistanceMatcher, MatchVerdict, OnnxExtractor};
use tracing_subscriber::EnvFilter;

mod config;

use config::Config;

/// Find known people in a photograph by matching faces against an enrolled gallery.
#[derive(Parser)]
#[command(
    name = "facefind",
    about = "facefind: identify known people in an image",
    after_help = "WARNING: Use responsibly and ethically. Respect privacy laws."
)]
struct Cli {
    /// Directory of known faces (structure: dir/person_name/*.jpg)
    #[arg(short, long)]
    known_faces: PathBuf,

    /// Image file to search for people
    #[arg(short, long)]
    search_image: PathBuf,

    /// Output path for the annotated image
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Matching tolerance (0.0-1.0, lower is stricter) [default: 0.6, env: FACEFIND_TOLERANCE]
    #[arg(short, long)]
    tolerance: Option<f32>,

    /// Save results as a JSON file
    #[arg(short, long)]
    json: Option<PathBuf>,

    /// Directory containing the ONNX models [env: FACEFIND_MODEL_DIR]
    #[arg(long)]
    model_dir: Option<PathBuf>,
}

const RULE: &str = "======================================================================";

fn print_banner() {
    println!("{RULE}");
    println!("FACEFIND - PERSON IDENTIFICATION");
    println!("{RULE}");
    println!("ETHICAL USAGE WARNING:");
    println!("   - Use only with proper consent and authorization");
    println!("   - Respect privacy laws and regulations");
    println!("   - Do not use for surveillance or unauthorized tracking");
    println!("{RULE}");
    println!();
}

fn print_results(verdicts: &[MatchVerdict]) {
    println!("\nResults: found {} face(s)\n", verdicts.len());
    for (i, v) in verdicts.iter().enumerate() {
        println!("Face #{}:", i + 1);
        println!("  Name: {}", v.name);
        println!("  Confidence: {:.2}%", v.confidence * 100.0);
        println!("  Location: {}", format_location(&v.bounding_box));
        println!();
    }
}

/// `[top, right, bottom, left]`, the same order as the JSON `location` field.
fn format_location(bbox: &BoundingBox) -> String {
    format!("{:?}", bbox.to_array())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::from_env();

    let tolerance = finder::validate_tolerance(cli.tolerance.unwrap_or(config.tolerance))?;
    let model_dir = cli.model_dir.unwrap_or(config.model_dir);
    tracing::debug!(model_dir = %model_dir.display(), tolerance, threads = config.intra_threads, "configuration resolved");

    print_banner();

    let mut extractor = OnnxExtractor::load(&model_dir, config.intra_threads)
        .with_context(|| format!("loading models from {}", model_dir.display()))?;

    println!("Loading known faces from {} ...", cli.known_faces.display());
    let outcome = enrollment::enroll_directory(&cli.known_faces, &mut extractor)?;
    for skipped in &outcome.skipped {
        println!("  skipped: {skipped}");
    }
    if outcome.gallery.is_empty() {
        bail!(FinderError::EmptyGallery);
    }
    println!(
        "\nLoaded {} known face(s) for {} person(s)\n",
        outcome.enrolled,
        outcome.gallery.names().len()
    );

    println!("Searching for people in: {}", cli.search_image.display());
    let verdicts = finder::search_path(
        &outcome.gallery,
        &cli.search_image,
        &mut extractor,
        &DistanceMatcher,
        tolerance,
    )?;
    print_results(&verdicts);

    if let Some(json_path) = &cli.json {
        SearchReport::new(&cli.search_image, tolerance, &verdicts)
            .write_to(json_path)
            .context("saving JSON results")?;
        println!("Results saved to JSON: {}", json_path.display());
    }

    if let Some(output) = &cli.output {
        annotate::annotate_to_file(&cli.search_image, &verdicts, output)
            .context("writing annotated image")?;
        println!("Annotated image saved to: {}", output.display());
    }

    Ok(())
}
