//! Headless collision octree probe
//!
//! Builds a terrain-like grid of triangles, optimizes an octree over it and
//! drops a line of spheres onto the surface, logging how much work each
//! query took compared to testing every triangle.

use anyhow::{bail, Context, Result};
use clap::{value_parser, Arg, ArgAction, Command};
use log::{debug, info, warn};
use std::path::PathBuf;

use collision_octree::foundation::logging;
use collision_octree::prelude::*;

const DEFAULT_GRID: u32 = 64;
const DEFAULT_PROBES: u32 = 16;
/// Largest grid whose vertex indices still fit in `u32`
const MAX_GRID: u32 = 65_534;

#[derive(Debug)]
struct ProbeConfig {
    config_file: Option<PathBuf>,
    grid: u32,
    spacing: f32,
    probes: u32,
    radius: f32,
    heatmap: bool,
}

fn main() -> Result<()> {
    logging::init();

    let matches = Command::new("collision_probe")
        .about("Builds a collision octree over generated terrain and reports query statistics")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Octree settings file (.toml or .ron)")
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("grid")
                .short('g')
                .long("grid")
                .value_name("CELLS")
                .help("Terrain cells along each side")
                .default_value("64")
                .value_parser(value_parser!(u32)),
        )
        .arg(
            Arg::new("spacing")
                .short('s')
                .long("spacing")
                .value_name("UNITS")
                .help("Width of one terrain cell")
                .default_value("1.0")
                .value_parser(value_parser!(f32)),
        )
        .arg(
            Arg::new("probes")
                .short('p')
                .long("probes")
                .value_name("COUNT")
                .help("Number of probe spheres")
                .default_value("16")
                .value_parser(value_parser!(u32)),
        )
        .arg(
            Arg::new("radius")
                .short('r')
                .long("radius")
                .value_name("UNITS")
                .help("Probe sphere radius")
                .default_value("0.75")
                .value_parser(value_parser!(f32)),
        )
        .arg(
            Arg::new("heatmap")
                .long("heatmap")
                .help("Render the cell heatmap into a draw list and report its size")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let probe = ProbeConfig {
        config_file: matches.get_one::<PathBuf>("config").cloned(),
        grid: matches.get_one::<u32>("grid").copied().unwrap_or(DEFAULT_GRID),
        spacing: matches.get_one::<f32>("spacing").copied().unwrap_or(1.0),
        probes: matches.get_one::<u32>("probes").copied().unwrap_or(DEFAULT_PROBES),
        radius: matches.get_one::<f32>("radius").copied().unwrap_or(0.75),
        heatmap: matches.get_flag("heatmap"),
    };
    debug!("Probe settings: {:?}", probe);

    run(&probe)
}

fn run(probe: &ProbeConfig) -> Result<()> {
    if probe.grid == 0 || probe.grid > MAX_GRID {
        bail!("--grid must be between 1 and {MAX_GRID}, got {}", probe.grid);
    }

    let config = match &probe.config_file {
        Some(path) => OctreeConfig::load(path)
            .with_context(|| format!("Failed to load octree config from {}", path.display()))?,
        None => OctreeConfig::default(),
    };
    info!(
        "Octree config: subdivide_threshold={}, max_depth={}",
        config.subdivide_threshold, config.max_depth
    );

    let triangles = terrain(probe.grid, probe.spacing);
    info!("Generated {} terrain triangles", triangles.len());

    let mut tree = CollisionOctree::from_triangles(&triangles, config).context("Failed to build collision octree")?;
    tree.optimize();
    let stats = tree.stats();
    info!(
        "Tree: {} nodes ({} leaves, {} populated), depth {}, {} triangles",
        stats.node_count, stats.leaf_count, stats.populated_count, stats.max_depth, stats.triangle_count
    );

    let mut total_tests = 0;
    let mut total_hits = 0;
    let mut hits = Vec::new();
    for i in 0..probe.probes {
        let position = probe_position(i, probe);
        let sphere = BoundingSphere::new(position, probe.radius);
        hits.clear();
        let tests = tree
            .find_collisions(&sphere.into(), &triangles, None, &mut hits)
            .context("Probe query failed")?;
        debug!(
            "Probe {} at ({:.2}, {:.2}, {:.2}): {} tests, {} hits",
            i, position.x, position.y, position.z, tests, hits.len()
        );
        if hits.is_empty() {
            warn!("Probe {} resting on the surface hit nothing", i);
        }
        total_tests += tests;
        total_hits += hits.len();
    }

    if probe.probes > 0 {
        let brute = triangles.len() * probe.probes as usize;
        info!(
            "{} probes: {} hits, {} triangle tests ({:.2}% of brute force)",
            probe.probes,
            total_hits,
            total_tests,
            percent(total_tests, brute)
        );
    }

    if probe.heatmap {
        let mut sink = DebugDrawList::new(DebugView::all());
        let camera = Vec3::new(0.0, height_at(0.0, 0.0) + 2.0, 0.0);
        let drawn = render_octree(&tree, &triangles, camera, None, &mut sink).context("Heatmap render failed")?;
        info!("Heatmap: {} triangles, {} cells", drawn, sink.cell_count());
    }
    Ok(())
}

/// Rolling terrain height
fn height_at(x: f32, z: f32) -> f32 {
    (x * 0.15).sin() * 2.0 + (z * 0.1).cos() * 1.5
}

/// Two triangles per grid cell, centered on the origin
fn terrain(grid: u32, spacing: f32) -> TriangleSet {
    let half = grid as f32 * spacing * 0.5;
    let side = grid + 1;
    let vertices: Vec<Vec3> = (0..side)
        .flat_map(|row| (0..side).map(move |col| (row, col)))
        .map(|(row, col)| {
            let x = col as f32 * spacing - half;
            let z = row as f32 * spacing - half;
            Vec3::new(x, height_at(x, z), z)
        })
        .collect();

    let cells = grid as usize * grid as usize;
    let mut indices = Vec::with_capacity(cells * 6);
    for row in 0..grid {
        for col in 0..grid {
            let a = row * side + col;
            let b = a + 1;
            let c = a + side;
            let d = c + 1;
            indices.extend_from_slice(&[a, c, b, b, c, d]);
        }
    }

    let mut triangles = TriangleSet::new();
    triangles.extend_indexed(&vertices, &indices);
    triangles
}

/// Probes walk the terrain diagonal, centered just above the surface
fn probe_position(index: u32, probe: &ProbeConfig) -> Vec3 {
    let half = probe.grid as f32 * probe.spacing * 0.5;
    let t = (index as f32 + 0.5) / probe.probes as f32;
    let x = -half + t * 2.0 * half;
    let z = x * 0.5;
    Vec3::new(x, height_at(x, z) + probe.radius * 0.5, z)
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
