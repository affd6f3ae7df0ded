//! Pascal-VOC head dataset merger
//!
//! This library merges a relabelled dataset and a subsampled dataset into a
//! single store of annotations, image symlinks and split manifests.

pub mod annotation;
pub mod audit;
pub mod config;
pub mod dataset;
pub mod detection;
pub mod error;
pub mod linker;
pub mod manifest;
pub mod rewrite;
pub mod sampler;
pub mod types;
pub mod utils;

// Re-export commonly used types and functions
pub use annotation::{validate_annotation, AnnotationRecord, SourceDataset, Validity};
pub use config::{Args, CombineConfig, LabelArgs};
pub use dataset::{combine_datasets, setup_output_directories};
pub use error::{MergeError, Result};
pub use types::{CombineSummary, OutputDirs, ProcessingStats, Split, SplitSet};
