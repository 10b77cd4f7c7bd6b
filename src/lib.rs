// src/lib.rs - Library interface for grain_measure

pub mod boundary;
pub mod config;
pub mod crop_planner;
pub mod errors;
pub mod geometry;
pub mod image_io;
pub mod image_utils;
pub mod outlier_filter;
pub mod output;
pub mod pipeline;
pub mod render;
pub mod sampling;
pub mod shape_analysis;
pub mod simplify;

// Re-export commonly used types and functions
pub use errors::{GrainError, Result};
pub use config::{ClassParams, Config, DatasetEntry};
pub use geometry::{BoundingBox, Candidate, Circle, EnclosingCircle, Point};
pub use image_io::{InputImage, load_image, save_image};
pub use pipeline::{analyze, process_entry, run_batch, Analysis, BatchReport, EntryReport};

// Re-export the analysis stages
pub use boundary::{extract_boundaries, trace_borders, BinaryGrid, Boundary, Extraction, Hierarchy};
pub use simplify::simplify_closed;
pub use shape_analysis::{calculate_bounding_box, fit_candidate, fit_candidates, minimal_enclosing_circle};
pub use outlier_filter::{filter_candidates, FilterPolicy, FilterResult, RadiusStats};
pub use crop_planner::{plan_crops, CropRegion};
pub use sampling::{pad_image, resize_and_pad, resize_image, sample_crops, PadType};
