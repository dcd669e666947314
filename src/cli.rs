use crate::job::DEFAULT_SCALES;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "landscape-metrics")]
#[command(about = "Habitat amount and heterogeneity of farmland bird habitat per grid cell and scale")]
#[command(version)]
pub struct Args {
    /// Land cover GeoTIFF (categorical, 0 = sea / nodata)
    #[arg(short, long, value_name = "FILE")]
    pub raster: PathBuf,

    /// Reference grid vector dataset (e.g. 10 km grid shapefile)
    #[arg(short, long, value_name = "FILE")]
    pub grid: PathBuf,

    /// Attribute holding the grid reference on each grid feature
    #[arg(long, value_name = "NAME", default_value = "grid_ref")]
    pub grid_field: String,

    /// Job parameter CSV with JID and grid_ref_levels columns
    #[arg(short, long, value_name = "FILE")]
    pub params: Option<PathBuf>,

    /// Job array index selecting rows of the parameter table
    #[arg(short, long, value_name = "N", env = "PBS_ARRAY_INDEX")]
    pub job_id: Option<u32>,

    /// Explicit grid references, overriding the parameter table
    #[arg(long = "grid-ref", value_name = "REF", value_delimiter = ',')]
    pub grid_refs: Vec<String>,

    /// Window scales in metres
    #[arg(short, long, value_name = "METERS", value_delimiter = ',', default_values_t = DEFAULT_SCALES)]
    pub scales: Vec<u32>,

    /// Override the sea / nodata value
    #[arg(long, value_name = "VALUE")]
    pub nodata: Option<i32>,

    /// Directory for the results and coastal tables
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Number of threads (default: all available)
    #[arg(short, long, value_name = "N")]
    pub threads: Option<usize>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from([
            "landscape-metrics",
            "--raster",
            "lcm.tif",
            "--grid",
            "grid.shp",
            "--grid-ref",
            "SU41",
        ])
        .unwrap();
        assert_eq!(args.scales, vec![1000, 1500, 2000]);
        assert_eq!(args.grid_field, "grid_ref");
        assert_eq!(args.output_dir, PathBuf::from("."));
        assert_eq!(args.grid_refs, vec!["SU41".to_string()]);
        assert!(args.nodata.is_none());
        assert!(!args.verbose);
    }

    #[test]
    fn test_comma_separated_lists() {
        let args = Args::try_parse_from([
            "landscape-metrics",
            "-r",
            "lcm.tif",
            "-g",
            "grid.shp",
            "--grid-ref",
            "SU41,SU42",
            "--scales",
            "500,2500",
        ])
        .unwrap();
        assert_eq!(args.grid_refs, vec!["SU41".to_string(), "SU42".to_string()]);
        assert_eq!(args.scales, vec![500, 2500]);
    }

    #[test]
    fn test_job_selection_from_params() {
        let args = Args::try_parse_from([
            "landscape-metrics",
            "-r",
            "lcm.tif",
            "-g",
            "grid.shp",
            "--params",
            "params.csv",
            "--job-id",
            "4",
        ])
        .unwrap();
        assert_eq!(args.job_id, Some(4));
        assert_eq!(args.params, Some(PathBuf::from("params.csv")));
        assert!(args.grid_refs.is_empty());
    }

    #[test]
    fn test_raster_is_required() {
        assert!(Args::try_parse_from(["landscape-metrics", "-g", "grid.shp"]).is_err());
    }
}
