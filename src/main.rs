use clap::Parser;
use env_logger::Env;
use log::{info, warn};

use landscape_metrics::cli::Args;
use landscape_metrics::{crs, io, run_job, tables};
use landscape_metrics::{HabitatSet, LandscapeContext, LandscapeError, Result, SEA_NODATA};

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logger
    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    info!("=== Farmland Bird Landscape Metrics ===");

    if let Some(n_threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(n_threads)
            .build_global()?;
        info!("Using {} threads", n_threads);
    } else {
        info!("Using all available threads");
    }

    let grid_refs = if !args.grid_refs.is_empty() {
        args.grid_refs.clone()
    } else {
        match (&args.params, args.job_id) {
            (Some(params), Some(job_id)) => tables::read_job_grid_refs_from_path(params, job_id)?,
            _ => return Err(LandscapeError::MissingJobSelection),
        }
    };
    info!("Grid cells: {:?}", grid_refs);
    info!("Scales (m): {:?}", args.scales);

    let raster = io::read_land_cover(&args.raster)?;
    let metadata = raster.metadata();

    info!("Raster size: {}x{}", metadata.width, metadata.height);
    info!(
        "Pixel size: {:.6} × {:.6}",
        metadata.pixel_width, metadata.pixel_height
    );

    if (metadata.pixel_width - metadata.pixel_height).abs() > 1e-9 {
        warn!(
            "Non-square pixels detected ({:.6} x {:.6}), using width for calculations",
            metadata.pixel_width, metadata.pixel_height
        );
    }

    if !crs::uses_metre_units(&metadata.projection) {
        warn!("Scales are interpreted as multiples of the raster's linear unit");
    }

    // The sea value is fixed by the land cover product, not by the band metadata
    let nodata = args.nodata.unwrap_or(SEA_NODATA);
    info!("Using nodata value: {}", nodata);

    let grid = io::read_reference_grid(&args.grid, &args.grid_field)?;
    let habitat = HabitatSet::farmland();

    let ctx = LandscapeContext {
        raster: &raster,
        grid: &grid,
        habitat: &habitat,
        nodata,
    };
    let results = run_job(&ctx, &grid_refs, &args.scales)?;

    let suffix = tables::output_suffix(args.job_id);
    tables::write_job_outputs(&args.output_dir, &suffix, &results)?;

    info!("=== Done! ===");
    Ok(())
}
