use crate::error::{LandscapeError, Result};
use crate::job::JobResults;
use crate::landscape::{CoastalRow, MetricsRow};
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// One row of the job parameter table; other columns are ignored
#[derive(Debug, Deserialize)]
struct JobAssignment {
    #[serde(rename = "JID")]
    job_id: u32,
    #[serde(rename = "grid_ref_levels")]
    grid_ref: String,
}

/// Grid refs assigned to `job_id`, in table order without repeats
pub fn read_job_grid_refs<R: Read>(reader: R, job_id: u32) -> Result<Vec<String>> {
    let mut csv_reader = csv::Reader::from_reader(reader);
    let mut seen = HashSet::new();
    let mut grid_refs = Vec::new();

    for record in csv_reader.deserialize() {
        let assignment: JobAssignment = record?;
        if assignment.job_id == job_id && seen.insert(assignment.grid_ref.clone()) {
            grid_refs.push(assignment.grid_ref);
        }
    }

    if grid_refs.is_empty() {
        return Err(LandscapeError::NoGridCells(job_id));
    }

    debug!("Job {} has {} grid cells", job_id, grid_refs.len());
    Ok(grid_refs)
}

pub fn read_job_grid_refs_from_path<P: AsRef<Path>>(path: P, job_id: u32) -> Result<Vec<String>> {
    info!("Reading job parameters: {}", path.as_ref().display());
    read_job_grid_refs(File::open(path)?, job_id)
}

fn write_rows<W: Write, T: Serialize>(writer: W, header: &[&str], rows: &[T]) -> Result<()> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    // Written by hand so an empty table still has its header
    csv_writer.write_record(header)?;
    for row in rows {
        csv_writer.serialize(row)?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn write_metrics<W: Write>(writer: W, rows: &[MetricsRow]) -> Result<()> {
    write_rows(
        writer,
        &["grid_ref", "scale", "ls_amount", "ls_hetero", "ls_both"],
        rows,
    )
}

pub fn write_coastal<W: Write>(writer: W, rows: &[CoastalRow]) -> Result<()> {
    write_rows(writer, &["grid_ref", "scale"], rows)
}

/// File name suffix: the job id when known, otherwise a random UUID
pub fn output_suffix(job_id: Option<u32>) -> String {
    match job_id {
        Some(id) => format!("job{}", id),
        None => Uuid::new_v4().to_string(),
    }
}

/// Paths of the results and coastal tables for a suffix
pub fn output_paths(dir: &Path, suffix: &str) -> (PathBuf, PathBuf) {
    (
        dir.join(format!("output_{}.csv", suffix)),
        dir.join(format!("coastal_{}.csv", suffix)),
    )
}

/// Write both tables of a finished job into `dir`
pub fn write_job_outputs(dir: &Path, suffix: &str, results: &JobResults) -> Result<(PathBuf, PathBuf)> {
    std::fs::create_dir_all(dir)?;
    let (metrics_path, coastal_path) = output_paths(dir, suffix);

    write_metrics(File::create(&metrics_path)?, &results.metrics)?;
    info!(
        "Wrote {} metric rows to {}",
        results.metrics.len(),
        metrics_path.display()
    );

    write_coastal(File::create(&coastal_path)?, &results.coastal)?;
    info!(
        "Wrote {} coastal rows to {}",
        results.coastal.len(),
        coastal_path.display()
    );

    Ok((metrics_path, coastal_path))
}
