use std::{fs, path::PathBuf, process};

use anyhow::Context;
use clap::{Parser, ValueEnum};

use jms2scene::{
    ImportOptions, QuaternionConvention, ScalePreset, import_model_document,
    options::{load_import_settings, save_import_settings},
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ScaleArg {
    Metric,
    Native,
    Identity,
}

#[derive(Parser)]
#[command(name = "jms2scene")]
#[command(about = "Resolve a JMS model into armature, meshes, weights and markers", long_about = None)]
struct Cli {
    /// Model document (JSON records of a JMS model).
    input: PathBuf,

    /// Load import settings from a JSON file before applying flags.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Write the effective settings to a JSON file.
    #[arg(long)]
    save_settings: Option<PathBuf>,

    #[arg(long, value_enum, conflicts_with = "custom_scale")]
    scale: Option<ScaleArg>,

    #[arg(long)]
    custom_scale: Option<f32>,

    /// Region index to import; repeat for more. Default: all regions.
    #[arg(long = "region")]
    regions: Vec<usize>,

    /// Permutation index to import; repeat for more. Default: all.
    #[arg(long = "permutation")]
    permutations: Vec<usize>,

    /// Size markers by their radius.
    #[arg(long)]
    import_radius: bool,

    /// Skip the armature.
    #[arg(long)]
    no_nodes: bool,

    /// Read quaternions without negating the scalar part.
    #[arg(long)]
    raw_rotations: bool,

    /// Write the resolved scene as JSON.
    #[arg(long, short)]
    output: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt::init();

    if let Err(err) = run() {
        eprintln!("{err:#}");
        process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let options = effective_options(&cli)?;

    if let Some(path) = &cli.save_settings {
        save_import_settings(path, &options)?;
    }

    let (scene, report) = import_model_document(&cli.input, &options)?;

    println!("JMS version: {}", report.version);
    println!("Scale factor: {:.5}", report.scale_factor);
    println!("Bones: {}, Meshes: {}", report.bone_count, report.mesh_count);
    println!(
        "Vertices: {} -> {}, Triangles: {}",
        report.source_vertices, report.imported_vertices, report.imported_triangles
    );
    println!("Markers: {}", report.marker_count);
    println!("Weight entries: {}", report.weight_entries);

    if let Some(output) = &cli.output {
        let json = serde_json::to_vec_pretty(&scene).context("failed to serialize scene")?;
        fs::write(output, json)
            .with_context(|| format!("failed to write output: {}", output.display()))?;
    }

    Ok(())
}

fn effective_options(cli: &Cli) -> anyhow::Result<ImportOptions> {
    let mut options = match &cli.settings {
        Some(path) => load_import_settings(path)?,
        None => ImportOptions::default(),
    };

    if let Some(scale) = cli.scale {
        options.scale = match scale {
            ScaleArg::Metric => ScalePreset::Metric,
            ScaleArg::Native => ScalePreset::Native,
            ScaleArg::Identity => ScalePreset::Identity,
        };
    }
    if let Some(factor) = cli.custom_scale {
        options.scale = ScalePreset::Custom(factor);
    }
    if !cli.regions.is_empty() {
        options.selection.regions = cli.regions.clone();
    }
    if !cli.permutations.is_empty() {
        options.selection.permutations = cli.permutations.clone();
    }
    if cli.import_radius {
        options.import_radius = true;
    }
    if cli.no_nodes {
        options.import_nodes = false;
    }
    if cli.raw_rotations {
        options.quaternion_convention = QuaternionConvention::AsIs;
    }

    Ok(options)
}
