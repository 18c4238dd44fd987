//! Scenefile CLI
//!
//! Command-line interface for exporting scene documents to scenefile
//! directories, validating documents, and inspecting written scenefiles.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};

use scenefile_export::{ExportOptions, ExportSummary, OverwritePolicy, Scenefile, ScenefileExporter};
use scenefile_scene::Document;

/// Scenefile exporter - convert host scene documents for the real-time renderer
#[derive(Parser)]
#[command(name = "scenefile")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Output format for summaries
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Export a scene document to a scenefile directory
    Export(ExportArgs),

    /// Validate a scene document without writing anything
    Check(CheckArgs),

    /// Summarize a written scenefile
    Inspect(InspectArgs),
}

#[derive(Args)]
struct SceneArgs {
    /// Scene document (JSON) dumped by the host
    #[arg(short, long)]
    document: PathBuf,

    /// Collection to export
    #[arg(long)]
    collection: Option<String>,

    /// World the sky is read from
    #[arg(long)]
    world: Option<String>,

    /// Export options file (YAML)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Args)]
struct ExportArgs {
    #[command(flatten)]
    scene: SceneArgs,

    /// Output directory (must not exist unless --overwrite)
    #[arg(short, long)]
    output: PathBuf,

    /// Replace an existing output directory
    #[arg(long)]
    overwrite: bool,

    /// Create the GlobalIBL directories without running the tools
    #[arg(long)]
    skip_ibl: bool,

    /// Diffuse IBL tool
    #[arg(long)]
    diffuse_tool: Option<PathBuf>,

    /// Specular IBL tool
    #[arg(long)]
    specular_tool: Option<PathBuf>,

    /// Working directory while the export runs
    #[arg(long)]
    tool_dir: Option<PathBuf>,
}

#[derive(Args)]
struct CheckArgs {
    #[command(flatten)]
    scene: SceneArgs,
}

#[derive(Args)]
struct InspectArgs {
    /// Path to scenefile.txt
    path: PathBuf,
}

fn setup_logging(verbosity: u8) {
    let level = match verbosity {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    fmt()
        .with_env_filter(filter)
        .with_target(verbosity >= 2)
        .with_file(verbosity >= 3)
        .with_line_number(verbosity >= 3)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose);

    match cli.command {
        Commands::Export(args) => cmd_export(args, cli.format),
        Commands::Check(args) => cmd_check(args, cli.format),
        Commands::Inspect(args) => cmd_inspect(args, cli.format),
    }
}

/// Options from the config file (or defaults), then command-line overrides
fn load_options(args: &SceneArgs) -> Result<ExportOptions> {
    let mut options = match &args.config {
        Some(path) => ExportOptions::from_yaml_file(path)
            .with_context(|| format!("Failed to load config {:?}", path))?,
        None => ExportOptions::default(),
    };
    if let Some(collection) = &args.collection {
        options.collection = collection.clone();
    }
    if let Some(world) = &args.world {
        options.world = world.clone();
    }
    Ok(options)
}

fn load_document(path: &Path) -> Result<Document> {
    info!("Loading scene document: {:?}", path);
    Document::load(path).with_context(|| format!("Failed to load scene document {:?}", path))
}

fn cmd_export(args: ExportArgs, format: OutputFormat) -> Result<()> {
    let mut options = load_options(&args.scene)?;
    if args.overwrite {
        options.overwrite = OverwritePolicy::Replace;
    }
    if args.skip_ibl {
        options.ibl.enabled = false;
    }
    if let Some(tool) = args.diffuse_tool {
        options.ibl.diffuse_tool = tool;
    }
    if let Some(tool) = args.specular_tool {
        options.ibl.specular_tool = tool;
    }
    if let Some(dir) = args.tool_dir {
        options.ibl.tool_dir = Some(dir);
    }

    let document = load_document(&args.scene.document)?;
    let report = ScenefileExporter::with_options(options)
        .export(&document, &args.output)
        .with_context(|| format!("Export to {:?} failed", args.output))?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::Text => {
            println!("Exported to {}", report.output_dir.display());
            print_summary(&report.summary);
            println!("  Copied files:       {}", report.copied_files.len());
        }
    }
    Ok(())
}

fn cmd_check(args: CheckArgs, format: OutputFormat) -> Result<()> {
    let options = load_options(&args.scene)?;
    let document = load_document(&args.scene.document)?;
    let summary = ScenefileExporter::with_options(options)
        .check(&document)
        .context("Scene document is not exportable")?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        OutputFormat::Text => {
            println!("{:?} is exportable", args.scene.document);
            print_summary(&summary);
        }
    }
    Ok(())
}

fn cmd_inspect(args: InspectArgs, format: OutputFormat) -> Result<()> {
    let scenefile = Scenefile::read_from(&args.path)
        .with_context(|| format!("Failed to read scenefile {:?}", args.path))?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "path": args.path,
                "summary": ExportSummary::from_scenefile(&scenefile),
                "meshes": scenefile.meshes.iter().map(|m| serde_json::json!({
                    "name": m.name,
                    "triangles": m.triangle_count(),
                })).collect::<Vec<_>>(),
                "materials": scenefile.materials,
                "mesh_entities": scenefile.mesh_entities,
                "directional_lights": scenefile.directional_lights,
                "point_lights": scenefile.point_lights,
                "spot_lights": scenefile.spot_lights,
                "sky": scenefile.sky,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Text => {
            println!("Scenefile: {}", args.path.display());
            print_summary(&ExportSummary::from_scenefile(&scenefile));

            if !scenefile.meshes.is_empty() {
                println!("\nMeshes:");
                for mesh in &scenefile.meshes {
                    println!("  {:<32} {:>8} triangles", mesh.name, mesh.triangle_count());
                }
            }
            if !scenefile.mesh_entities.is_empty() {
                println!("\nEntities:");
                for entity in &scenefile.mesh_entities {
                    println!("  {:<32} {} / {}", entity.name, entity.mesh, entity.material);
                }
            }
            if let Some(sky) = &scenefile.sky {
                println!("\nSky: {} (intensity {})", sky.image_path, sky.intensity);
            }
        }
    }
    Ok(())
}

fn print_summary(summary: &ExportSummary) {
    println!("  Meshes:             {} ({} triangles)", summary.meshes, summary.triangles);
    println!("  Materials:          {}", summary.materials);
    println!("  Mesh entities:      {}", summary.mesh_entities);
    println!("  Directional lights: {}", summary.directional_lights);
    println!("  Point lights:       {}", summary.point_lights);
    println!("  Spot lights:        {}", summary.spot_lights);
    if summary.skipped_lights > 0 {
        println!("  Skipped lights:     {}", summary.skipped_lights);
    }
    println!("  Sky:                {}", if summary.sky { "yes" } else { "no" });
}
