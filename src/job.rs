use crate::error::{LandscapeError, Result};
use crate::landscape::{compute_scale_metrics, CoastalRow, LandscapeContext, MetricsRow, ScaleOutcome};
use log::{debug, info};
use rayon::prelude::*;
use std::time::Instant;

/// Scales analysed by default, in metres
pub const DEFAULT_SCALES: [u32; 3] = [1000, 1500, 2000];

/// Rows collected over a job
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JobResults {
    pub metrics: Vec<MetricsRow>,
    pub coastal: Vec<CoastalRow>,
}

impl JobResults {
    pub fn push(&mut self, outcome: ScaleOutcome) {
        match outcome {
            ScaleOutcome::Metrics(row) => self.metrics.push(row),
            ScaleOutcome::Coastal(row) => self.coastal.push(row),
        }
    }

    /// Number of (grid cell, scale) pairs recorded
    pub fn len(&self) -> usize {
        self.metrics.len() + self.coastal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Compute every (grid cell, scale) pair of the job.
///
/// Pairs run in parallel on the rayon pool; rows keep grid-ref-major,
/// scale-minor order. The first failing pair aborts the job.
pub fn run_job(ctx: &LandscapeContext<'_>, grid_refs: &[String], scales: &[u32]) -> Result<JobResults> {
    if let Some(&scale) = scales.iter().find(|&&s| s == 0) {
        return Err(LandscapeError::invalid_scale(scale, "scale must be positive"));
    }

    let pairs: Vec<(&str, u32)> = grid_refs
        .iter()
        .flat_map(|grid_ref| scales.iter().map(move |&scale| (grid_ref.as_str(), scale)))
        .collect();

    info!(
        "Processing {} grid cells at {} scales ({} pairs)",
        grid_refs.len(),
        scales.len(),
        pairs.len()
    );
    let started = Instant::now();

    let outcomes: Vec<ScaleOutcome> = pairs
        .par_iter()
        .map(|&(grid_ref, scale)| {
            let pair_started = Instant::now();
            let outcome = compute_scale_metrics(ctx, grid_ref, scale)?;
            debug!(
                "{} at {} m done in {:.2}s",
                grid_ref,
                scale,
                pair_started.elapsed().as_secs_f64()
            );
            Ok(outcome)
        })
        .collect::<Result<_>>()?;

    let mut results = JobResults::default();
    for outcome in outcomes {
        results.push(outcome);
    }

    info!(
        "Job finished in {:.1}s: {} metric rows, {} coastal rows",
        started.elapsed().as_secs_f64(),
        results.metrics.len(),
        results.coastal.len()
    );

    Ok(results)
}
