use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use campusnav_lib::{
    plan_route, rasterize, CampusMap, GeoPoint, GridConfig, RasterOptions, RouteRequest,
};

#[derive(Parser, Debug)]
#[command(author, version, about = "Campus walkability grid and routing utilities")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Rasterize a campus feature map into a walkability grid artifact.
    Build {
        /// Path to the campus feature collection (GeoJSON).
        #[arg(long)]
        input: PathBuf,
        /// Where to write the grid configuration JSON.
        #[arg(long)]
        output: PathBuf,
        /// Cell edge length in degrees.
        #[arg(long)]
        cell_size: Option<f64>,
        /// Outward building dilation, in cells.
        #[arg(long)]
        building_padding: Option<f64>,
        /// Corridor stamp radius around hallway samples, in cells.
        #[arg(long)]
        hallway_radius: Option<i64>,
    },
    /// Plan a route between two geographic points over a built grid.
    Route {
        /// Path to the grid configuration JSON.
        #[arg(long)]
        grid: PathBuf,
        /// Start latitude in decimal degrees.
        #[arg(long, allow_negative_numbers = true)]
        from_lat: f64,
        /// Start longitude in decimal degrees.
        #[arg(long, allow_negative_numbers = true)]
        from_lng: f64,
        /// Destination latitude in decimal degrees.
        #[arg(long, allow_negative_numbers = true)]
        to_lat: f64,
        /// Destination longitude in decimal degrees.
        #[arg(long, allow_negative_numbers = true)]
        to_lng: f64,
        /// Obstacle padding radius in cells.
        #[arg(long)]
        padding: Option<u32>,
        /// Skip smoothing and emit raw cell centers.
        #[arg(long)]
        raw: bool,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Build {
            input,
            output,
            cell_size,
            building_padding,
            hallway_radius,
        } => handle_build(&input, &output, cell_size, building_padding, hallway_radius),
        Command::Route {
            grid,
            from_lat,
            from_lng,
            to_lat,
            to_lng,
            padding,
            raw,
        } => handle_route(
            &grid,
            GeoPoint::new(from_lat, from_lng),
            GeoPoint::new(to_lat, to_lng),
            padding,
            raw,
        ),
    }
}

fn handle_build(
    input: &Path,
    output: &Path,
    cell_size: Option<f64>,
    building_padding: Option<f64>,
    hallway_radius: Option<i64>,
) -> Result<()> {
    let map = CampusMap::from_path(input)
        .with_context(|| format!("failed to load campus map from {}", input.display()))?;

    let defaults = RasterOptions::default();
    let options = RasterOptions {
        cell_size: cell_size.unwrap_or(defaults.cell_size),
        building_padding: building_padding.unwrap_or(defaults.building_padding),
        hallway_radius: hallway_radius.unwrap_or(defaults.hallway_radius),
    };
    let rasterized = rasterize(&map, &options).context("failed to rasterize the campus map")?;
    rasterized
        .config
        .save(output)
        .with_context(|| format!("failed to write grid artifact to {}", output.display()))?;

    let diagnostics = &rasterized.diagnostics;
    println!(
        "Built {}x{} grid ({} walkable, {} obstacle cells)",
        rasterized.config.rows(),
        rasterized.config.cols(),
        rasterized.config.walkable_count(),
        rasterized.config.obstacle_count(),
    );
    println!(
        "Hallways: {} carved, {} skipped; dead ends: {} found, {} repaired, {} unresolved",
        diagnostics.carved_hallways,
        diagnostics.skipped_hallways,
        diagnostics.dead_ends_found,
        diagnostics.dead_ends_repaired,
        diagnostics.dead_ends_unresolved,
    );
    println!("Grid artifact written to {}", output.display());
    Ok(())
}

fn handle_route(
    grid: &Path,
    start: GeoPoint,
    end: GeoPoint,
    padding: Option<u32>,
    raw: bool,
) -> Result<()> {
    let config = GridConfig::load(grid)
        .with_context(|| format!("failed to load grid artifact from {}", grid.display()))?;

    let request = RouteRequest {
        start,
        end,
        padding,
        smooth: !raw,
    };
    let plan = plan_route(&config, &request).context("failed to plan route")?;

    if !plan.found() {
        println!("No route found between the requested points");
        return Ok(());
    }

    serde_json::to_writer_pretty(std::io::stdout().lock(), &plan)
        .context("failed to serialize route plan")?;
    println!();
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    // Logs go to stderr so the route plan JSON on stdout stays parseable.
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
