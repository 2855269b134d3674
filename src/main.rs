//! rwkit CLI - Command-line tool for RenderWare models and textures.
//!
//! This is the main entry point for the rwkit command-line application.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use glob::{MatchOptions, Pattern};
use indicatif::{ProgressBar, ProgressStyle};
use memmap2::Mmap;
use rayon::prelude::*;
use serde::Serialize;

use rwkit::dff::Geometry;
use rwkit::prelude::*;

/// rwkit - RenderWare DFF/TXD inspection tool
#[derive(Parser)]
#[command(name = "rwkit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a DFF model and print its structure
    DffInfo {
        /// Path to the DFF file
        #[arg(short, long, env = "INPUT_DFF")]
        input: PathBuf,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List textures in a TXD archive
    TxdList {
        /// Path to the TXD file
        #[arg(short, long, env = "INPUT_TXD")]
        input: PathBuf,

        /// Filter pattern (glob-style, case-insensitive)
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Decode textures from a TXD archive to PNG files
    TxdExtract {
        /// Path to the TXD file
        #[arg(short, long, env = "INPUT_TXD")]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, env = "OUTPUT_FOLDER")]
        output: PathBuf,

        /// Filter pattern (glob-style, case-insensitive)
        #[arg(short, long)]
        filter: Option<String>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::DffInfo { input, json } => {
            cmd_dff_info(&input, json)?;
        }
        Commands::TxdList { input, filter } => {
            cmd_txd_list(&input, filter.as_deref())?;
        }
        Commands::TxdExtract { input, output, filter } => {
            cmd_txd_extract(&input, &output, filter.as_deref())?;
        }
    }

    Ok(())
}

#[derive(Serialize)]
struct DffReport {
    frames: Vec<FrameReport>,
    geometries: Vec<GeometryReport>,
    parts: Vec<PartReport>,
    skeleton: Option<Vec<BoneReport>>,
    diagnostics: Vec<String>,
}

#[derive(Serialize)]
struct FrameReport {
    index: usize,
    name: Option<String>,
    parent: Option<usize>,
    position: [f32; 3],
    node_id: Option<u32>,
}

#[derive(Serialize)]
struct GeometryReport {
    index: usize,
    vertices: u32,
    triangles: u32,
    uv_sets: usize,
    native: bool,
    skinned: bool,
    materials: Vec<MaterialReport>,
}

#[derive(Serialize)]
struct MaterialReport {
    color: [u8; 4],
    texture: Option<String>,
    mask: Option<String>,
}

#[derive(Serialize)]
struct PartReport {
    atomic: usize,
    frame: usize,
    geometry: usize,
    vertices: usize,
    groups: Vec<GroupReport>,
}

#[derive(Serialize)]
struct GroupReport {
    material: u32,
    start: usize,
    count: usize,
}

#[derive(Serialize)]
struct BoneReport {
    node_id: u32,
    frame: usize,
    frame_name: Option<String>,
}

impl DffReport {
    fn new(clump: &Clump, model: &Model, diagnostics: &[Diagnostic]) -> Self {
        let frames = clump
            .frames
            .iter()
            .enumerate()
            .map(|(index, frame)| FrameReport {
                index,
                name: frame.name().map(str::to_string),
                parent: frame.parent(),
                position: frame.position,
                node_id: frame.hanim().map(|h| h.node_id),
            })
            .collect();

        let geometries = clump
            .geometries
            .iter()
            .enumerate()
            .filter_map(|(index, geometry)| geometry.map(|g| geometry_report(index, g)))
            .collect();

        let parts = model
            .parts
            .iter()
            .map(|part| PartReport {
                atomic: part.atomic,
                frame: part.frame,
                geometry: part.geometry,
                vertices: part.mesh.vertex_count(),
                groups: part
                    .mesh
                    .groups
                    .iter()
                    .map(|g| GroupReport {
                        material: g.material_index,
                        start: g.start,
                        count: g.count,
                    })
                    .collect(),
            })
            .collect();

        let skeleton = model
            .parts
            .iter()
            .find_map(|p| p.skeleton.as_ref())
            .map(|skeleton| {
                skeleton
                    .bones
                    .iter()
                    .map(|bone| BoneReport {
                        node_id: bone.node_id,
                        frame: bone.frame,
                        frame_name: clump
                            .frames
                            .get(bone.frame)
                            .and_then(|f| f.name())
                            .map(str::to_string),
                    })
                    .collect()
            });

        Self {
            frames,
            geometries,
            parts,
            skeleton,
            diagnostics: diagnostics.iter().map(ToString::to_string).collect(),
        }
    }
}

fn geometry_report(index: usize, geometry: &Geometry) -> GeometryReport {
    GeometryReport {
        index,
        vertices: geometry.vertex_count,
        triangles: geometry.triangle_count,
        uv_sets: geometry.uv_sets.len(),
        native: geometry.is_native(),
        skinned: geometry.skin().is_some(),
        materials: geometry
            .materials
            .iter()
            .flatten()
            .map(|m| MaterialReport {
                color: m.color,
                texture: m.texture.as_ref().map(|t| t.name.clone()),
                mask: m.texture.as_ref().and_then(|t| t.mask_name.clone()),
            })
            .collect(),
    }
}

fn cmd_dff_info(input: &Path, json: bool) -> Result<()> {
    let data = map_file(input)?;

    let start = Instant::now();
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    let clump = Clump::parse(&data, &mut diagnostics)
        .context("Failed to parse DFF")?
        .context("No Clump chunk found")?;
    let model = Model::build(&clump, &mut diagnostics);
    tracing::info!(elapsed = ?start.elapsed(), "decoded {}", input.display());

    let report = DffReport::new(&clump, &model, &diagnostics);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Frames: {}", report.frames.len());
    for frame in &report.frames {
        println!(
            "  [{:>3}] parent {:>4} {:<24} node {}",
            frame.index,
            frame.parent.map_or("-".to_string(), |p| p.to_string()),
            frame.name.as_deref().unwrap_or(""),
            frame.node_id.map_or("-".to_string(), |n| n.to_string()),
        );
    }

    println!("Geometries: {}", report.geometries.len());
    for geometry in &report.geometries {
        println!(
            "  [{:>3}] {} vertices, {} triangles, {} uv sets{}{}",
            geometry.index,
            geometry.vertices,
            geometry.triangles,
            geometry.uv_sets,
            if geometry.native { ", native" } else { "" },
            if geometry.skinned { ", skinned" } else { "" },
        );
        for material in &geometry.materials {
            println!(
                "        material #{:02x}{:02x}{:02x}{:02x} {} {}",
                material.color[0],
                material.color[1],
                material.color[2],
                material.color[3],
                material.texture.as_deref().unwrap_or("-"),
                material.mask.as_deref().unwrap_or(""),
            );
        }
    }

    println!("Parts: {}", report.parts.len());
    for part in &report.parts {
        println!(
            "  atomic {} -> frame {}, geometry {}: {} vertices in {} groups",
            part.atomic,
            part.frame,
            part.geometry,
            part.vertices,
            part.groups.len()
        );
    }

    if let Some(bones) = &report.skeleton {
        println!("Skeleton: {} bones", bones.len());
        for bone in bones {
            println!(
                "  node {:>4} -> frame {:>3} {}",
                bone.node_id,
                bone.frame,
                bone.frame_name.as_deref().unwrap_or("")
            );
        }
    }

    if !report.diagnostics.is_empty() {
        println!("Diagnostics: {}", report.diagnostics.len());
        for diagnostic in &report.diagnostics {
            println!("  {}", diagnostic);
        }
    }

    Ok(())
}

fn cmd_txd_list(input: &Path, filter: Option<&str>) -> Result<()> {
    let filter = name_filter(filter)?;
    let data = map_file(input)?;

    let mut sink = TracingSink::new();
    let txd = TextureDictionary::parse(&data, &mut sink).context("Failed to parse TXD")?;

    let mut textures: Vec<(&str, &RasterImage)> = txd
        .iter()
        .filter(|(name, _)| matches(filter.as_ref(), name))
        .collect();
    textures.sort_unstable_by_key(|(name, _)| *name);

    for (_, image) in &textures {
        println!(
            "{:>5}x{:<5} {:<9} {:<5} {:>2} mips  {}{}",
            image.width,
            image.height,
            image.codec.name(),
            if image.has_alpha { "alpha" } else { "" },
            image.mip_levels,
            image.name,
            image
                .mask_name
                .as_deref()
                .map(|m| format!(" (mask {})", m))
                .unwrap_or_default()
        );
    }

    println!(
        "\nTotal: {} textures ({} declared, {} warnings)",
        textures.len(),
        txd.declared_count(),
        sink.warnings()
    );

    Ok(())
}

fn cmd_txd_extract(input: &Path, output: &Path, filter: Option<&str>) -> Result<()> {
    let filter = name_filter(filter)?;
    let data = map_file(input)?;

    let mut sink = TracingSink::new();
    let txd = TextureDictionary::parse(&data, &mut sink).context("Failed to parse TXD")?;

    let textures: Vec<(&str, &RasterImage)> = txd
        .iter()
        .filter(|(name, _)| matches(filter.as_ref(), name))
        .collect();

    println!("Extracting {} textures...", textures.len());

    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create {}", output.display()))?;

    let pb = ProgressBar::new(textures.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );

    let start = Instant::now();
    let errors: Vec<String> = textures
        .par_iter()
        .filter_map(|(name, texture)| {
            let path = output.join(format!("{}.png", name.replace(['/', '\\'], "_")));
            let result = write_png(&path, texture);
            pb.inc(1);
            result.err().map(|e| format!("{}: {:#}", name, e))
        })
        .collect();

    pb.finish_with_message("Done");

    for error in &errors {
        eprintln!("Error exporting {}", error);
    }
    println!(
        "Extracted {} textures in {:?} ({} errors)",
        textures.len() - errors.len(),
        start.elapsed(),
        errors.len()
    );

    Ok(())
}

fn write_png(path: &Path, texture: &RasterImage) -> Result<()> {
    image::save_buffer_with_format(
        path,
        &texture.rgba,
        texture.width,
        texture.height,
        image::ExtendedColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("Failed to write {}", path.display()))
}

fn map_file(path: &Path) -> Result<Mmap> {
    let file = File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mmap = unsafe { Mmap::map(&file) }
        .with_context(|| format!("Failed to map {}", path.display()))?;
    Ok(mmap)
}

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: false,
    require_literal_separator: false,
    require_literal_leading_dot: false,
};

fn name_filter(pattern: Option<&str>) -> Result<Option<Pattern>> {
    pattern
        .map(Pattern::new)
        .transpose()
        .context("Invalid glob pattern")
}

fn matches(filter: Option<&Pattern>, name: &str) -> bool {
    filter.map_or(true, |p| p.matches_with(name, MATCH_OPTIONS))
}
