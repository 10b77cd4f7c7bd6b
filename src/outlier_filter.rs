// src/outlier_filter.rs - Statistical rejection of spurious or merged detections

use serde::{Deserialize, Serialize};

use crate::errors::{GrainError, Result};
use crate::geometry::Candidate;

/// Rule deciding which fitted circles are real grains
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FilterPolicy {
    /// Accept iff `median - band < r < median + band`
    TightBand { band: f64 },
    /// Accept iff `r > median - std`
    LowerBoundOnly,
}

impl FilterPolicy {
    pub(crate) fn validate(&self) -> std::result::Result<(), String> {
        match *self {
            FilterPolicy::TightBand { band } if !(band > 0.0) => {
                Err(format!("tight_band.band must be > 0.0, got {}", band))
            }
            _ => Ok(()),
        }
    }

    /// Decide a single radius against the statistics of its run
    pub fn accepts(&self, radius: f64, stats: &RadiusStats) -> bool {
        match *self {
            FilterPolicy::TightBand { band } => {
                radius > stats.median - band && radius < stats.median + band
            }
            FilterPolicy::LowerBoundOnly => radius > stats.median - stats.std,
        }
    }
}

/// Summary statistics of the radius column
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RadiusStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    /// Population standard deviation (divides by N)
    pub std: f64,
}

impl RadiusStats {
    pub fn from_radii(radii: &[f64]) -> Result<Self> {
        if radii.is_empty() {
            return Err(GrainError::DegenerateInput(
                "radius statistics are undefined for an empty circle set".to_string(),
            ));
        }

        let count = radii.len();
        let n = count as f64;
        let mean = radii.iter().sum::<f64>() / n;
        let variance = radii.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;

        let mut sorted = radii.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let median = if count % 2 == 1 {
            sorted[count / 2]
        } else {
            (sorted[count / 2 - 1] + sorted[count / 2]) / 2.0
        };

        Ok(Self {
            count,
            min: sorted[0],
            max: sorted[count - 1],
            mean,
            median,
            std: variance.sqrt(),
        })
    }
}

/// Accepted/rejected partition of the input, each side in input order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterResult {
    pub stats: RadiusStats,
    pub accepted: Vec<Candidate>,
    pub rejected: Vec<Candidate>,
}

/// Partition candidates by the radius of their enclosing circle
pub fn filter_candidates(candidates: &[Candidate], policy: &FilterPolicy) -> Result<FilterResult> {
    let radii: Vec<f64> = candidates.iter().map(|c| c.circle.r as f64).collect();
    let stats = RadiusStats::from_radii(&radii)?;

    let (accepted, rejected): (Vec<Candidate>, Vec<Candidate>) = candidates
        .iter()
        .copied()
        .partition(|c| policy.accepts(c.circle.r as f64, &stats));

    log::debug!(
        "Radius stats: n={} min={:.1} max={:.1} mean={:.2} median={:.1} std={:.2}",
        stats.count, stats.min, stats.max, stats.mean, stats.median, stats.std
    );

    Ok(FilterResult { stats, accepted, rejected })
}
