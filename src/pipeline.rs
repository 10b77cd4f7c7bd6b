// src/pipeline.rs - Per-image analysis chain and the batch driver

use std::fs;
use std::path::{Path, PathBuf};

use image::{DynamicImage, GenericImageView};
use log::{debug, error, info, warn};
use rayon::prelude::*;

use crate::boundary::{extract_boundaries, BinaryGrid, Extraction};
use crate::config::{Config, DatasetEntry};
use crate::crop_planner::{plan_crops, CropRegion};
use crate::errors::{GrainError, Result};
use crate::geometry::Candidate;
use crate::image_io::{load_image, save_image};
use crate::image_utils::{binarize, detect_edges};
use crate::outlier_filter::{filter_candidates, FilterPolicy, FilterResult};
use crate::output::{write_boxes_csv, write_circles_csv, write_summary_json, EntrySummary};
use crate::render::render_diagnostics;
use crate::sampling::{resize_and_pad, sample_crops};
use crate::shape_analysis::fit_candidates;

/// Everything the core chain derives from one edge map
#[derive(Debug, Clone)]
pub struct Analysis {
    pub extraction: Extraction,
    pub candidates: Vec<Candidate>,
    pub filter: FilterResult,
    pub crops: Vec<CropRegion>,
}

/// Boundaries, shapes, outlier filter and crop windows for one edge map
pub fn analyze(
    edges: &BinaryGrid,
    tolerance: f64,
    policy: &FilterPolicy,
    crop_size: u32,
) -> Result<Analysis> {
    let extraction = extract_boundaries(edges, tolerance);
    if extraction.boundaries.is_empty() {
        return Err(GrainError::DegenerateInput(format!(
            "no boundaries detected ({} borders traced)",
            extraction.hierarchy.len()
        )));
    }

    let candidates = fit_candidates(&extraction.boundaries)?;
    let filter = filter_candidates(&candidates, policy)?;
    let crops = plan_crops(&filter.accepted, crop_size);

    Ok(Analysis { extraction, candidates, filter, crops })
}

/// Outcome of one successfully processed dataset entry
#[derive(Debug, Clone)]
pub struct EntryReport {
    pub name: String,
    pub output_dir: PathBuf,
    pub boundaries: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub crops_outside_frame: usize,
}

/// Load, analyse and write every artifact for one dataset entry.
/// Nothing is written unless the whole computation succeeds.
pub fn process_entry(entry: &DatasetEntry, config: &Config) -> Result<EntryReport> {
    let input = load_image(&entry.path)?;
    let (width, height) = input.image.dimensions();
    debug!(
        "{}: loaded {}.{} ({}x{}) from {}",
        entry.name, input.filename, input.extension, width, height, input.path.display()
    );

    let binary = binarize(&input.image, &entry.params);
    let edges = detect_edges(&binary.image, &entry.params);

    let analysis = analyze(
        &BinaryGrid::from_luma(&edges),
        config.simplify_tolerance,
        &entry.params.policy,
        config.crop_size,
    )?;

    let stats = &analysis.filter.stats;
    info!(
        "{}: {} boundaries, radius median {:.1} std {:.2} (min {:.0}, max {:.0}, mean {:.2})",
        entry.name, analysis.candidates.len(), stats.median, stats.std, stats.min, stats.max, stats.mean
    );
    info!(
        "{}: {} accepted, {} rejected with {:?}",
        entry.name, analysis.filter.accepted.len(), analysis.filter.rejected.len(), entry.params.policy
    );

    let crops_outside_frame = analysis.crops.iter().filter(|c| !c.is_within(width, height)).count();
    if crops_outside_frame > 0 {
        warn!(
            "{}: {} of {} crop regions extend past the {}x{} frame",
            entry.name, crops_outside_frame, analysis.crops.len(), width, height
        );
    }

    let canvases = render_diagnostics(width, height, &analysis);
    let samples: Vec<_> = if config.write_samples {
        sample_crops(&input.image.to_rgb8(), &analysis.crops, config.sample_margin)
            .into_iter()
            .map(|(_, sample)| match config.sample_size {
                Some(size) => resize_and_pad(&sample, (size, size), config.sample_padding),
                None => sample,
            })
            .collect()
    } else {
        Vec::new()
    };

    // Computation finished; write everything
    let output_dir = PathBuf::from(&config.output_dir).join(&entry.name);
    let ext = &input.extension;

    write_atomically(&output_dir, |dir| {
        let stage_path = |stage: &str| dir.join(format!("{}.{}", stage, ext));
        save_image(&DynamicImage::ImageLuma8(binary.image), stage_path("01 - binary"))?;
        save_image(&DynamicImage::ImageLuma8(edges), stage_path("02 - canny"))?;
        save_image(&DynamicImage::ImageRgb8(canvases.boundaries), stage_path("03 - contours"))?;
        save_image(&DynamicImage::ImageRgb8(canvases.shapes), stage_path("04 - boundaries"))?;
        save_image(&DynamicImage::ImageRgb8(canvases.refined), stage_path("05 - refined"))?;
        save_image(&DynamicImage::ImageRgb8(canvases.crops), stage_path("06 - crops"))?;

        write_circles_csv(&analysis.candidates, dir.join(format!("{}.circles.csv", entry.name)))?;
        write_boxes_csv(&analysis.candidates, dir.join(format!("{}.boxes.csv", entry.name)))?;

        let summary = EntrySummary {
            name: &entry.name,
            class: &entry.class,
            image_size: (width, height),
            threshold_level: binary.level,
            policy: entry.params.policy,
            stats: analysis.filter.stats,
            boundary_count: analysis.candidates.len(),
            accepted: analysis.filter.accepted.iter().map(|c| c.boundary_id).collect(),
            rejected: analysis.filter.rejected.iter().map(|c| c.boundary_id).collect(),
            crops: &analysis.crops,
            crops_outside_frame,
        };
        write_summary_json(&summary, dir.join(format!("{}.summary.json", entry.name)))?;

        if !samples.is_empty() {
            let samples_dir = dir.join("samples");
            fs::create_dir_all(&samples_dir)?;
            for (i, sample) in samples.into_iter().enumerate() {
                save_image(&DynamicImage::ImageRgb8(sample), samples_dir.join(format!("{}.jpg", i)))?;
            }
        }

        Ok(())
    })?;

    Ok(EntryReport {
        name: entry.name.clone(),
        output_dir,
        boundaries: analysis.candidates.len(),
        accepted: analysis.filter.accepted.len(),
        rejected: analysis.filter.rejected.len(),
        crops_outside_frame,
    })
}

/// Run `write` against a fresh staging directory beside `target`, then move
/// it into place. On failure the staging directory is removed and `target`
/// is left as it was.
pub fn write_atomically<F>(target: &Path, write: F) -> Result<()>
where
    F: FnOnce(&Path) -> Result<()>,
{
    let name = target
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| GrainError::InvalidPath(target.to_path_buf()))?;
    let staging = target.with_file_name(format!(".{}.partial", name));

    if staging.exists() {
        fs::remove_dir_all(&staging)?;
    }
    fs::create_dir_all(&staging)?;

    if let Err(e) = write(&staging) {
        if let Err(cleanup) = fs::remove_dir_all(&staging) {
            warn!("Could not remove {}: {}", staging.display(), cleanup);
        }
        return Err(e);
    }

    if target.exists() {
        fs::remove_dir_all(target)?;
    }
    fs::rename(&staging, target)?;

    Ok(())
}

/// Successes and failures of a whole dataset run
#[derive(Debug, Default)]
pub struct BatchReport {
    pub succeeded: Vec<EntryReport>,
    pub failed: Vec<(String, GrainError)>,
}

impl BatchReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Process every resolved entry; an entry that failed to resolve or to
/// process is reported without stopping the rest
pub fn run_batch(entries: Vec<(String, Result<DatasetEntry>)>, config: &Config) -> BatchReport {
    let mut report = BatchReport::default();

    let mut resolved = Vec::with_capacity(entries.len());
    for (name, entry) in entries {
        match entry {
            Ok(entry) => resolved.push(entry),
            Err(e) => {
                error!("Skipping {}: {}", name, e);
                report.failed.push((name, e));
            }
        }
    }

    let run = |entry: &DatasetEntry| {
        info!("Processing: {} ({})", entry.name, entry.path.display());
        (entry.name.clone(), process_entry(entry, config))
    };

    let results: Vec<(String, Result<EntryReport>)> = if config.use_parallel {
        resolved.par_iter().map(run).collect()
    } else {
        resolved.iter().map(run).collect()
    };

    for (name, result) in results {
        match result {
            Ok(entry_report) => report.succeeded.push(entry_report),
            Err(e) => {
                error!("Error processing {}: {}", name, e);
                report.failed.push((name, e));
            }
        }
    }

    report
}
