use clap::Parser;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::Result;
use crate::sampler::{SplitRatios, DEFAULT_SEED, DEFAULT_STRIDE};

/// Command-line arguments for merging two VOC head datasets.
#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
pub struct Args {
    /// Root of the relabelled dataset (has ImageSets/Main manifests)
    #[arg(long = "source_a", default_value = "./SCUT_HEAD")]
    pub source_a: PathBuf,

    /// Root of the subsampled dataset
    #[arg(long = "source_b", default_value = "./HollywoodHeads")]
    pub source_b: PathBuf,

    /// Root of the unified store to create or update
    #[arg(short = 'o', long = "output", default_value = "./COMBINED_HEAD")]
    pub output: PathBuf,

    /// Keep every Nth valid annotation of source B
    #[arg(long = "stride", default_value_t = DEFAULT_STRIDE, value_parser = validate_stride)]
    pub stride: usize,

    /// Seed for the source B shuffle
    #[arg(long = "seed", default_value_t = DEFAULT_SEED)]
    pub seed: u64,

    /// Proportion of source B assigned to training
    #[arg(long = "train_size", default_value_t = 0.7, value_parser = validate_size)]
    pub train_size: f64,

    /// Proportion of source B assigned to validation
    #[arg(long = "val_size", default_value_t = 0.15, value_parser = validate_size)]
    pub val_size: f64,

    /// Object label in source A that gets renamed
    #[arg(long = "source_label", default_value = "person")]
    pub source_label: String,

    /// Label written in place of the source label
    #[arg(long = "target_label", default_value = "head")]
    pub target_label: String,

    /// Image extension used by source A (kept as is)
    #[arg(long = "source_a_image_ext", default_value = "jpg")]
    pub source_a_image_ext: String,

    /// Image extension used by source B
    #[arg(long = "source_b_image_ext", default_value = "jpeg")]
    pub source_b_image_ext: String,

    /// Extension given to linked source B images
    #[arg(long = "image_ext", default_value = "jpg")]
    pub image_ext: String,
}

impl Args {
    pub fn to_combine_config(&self) -> Result<CombineConfig> {
        Ok(CombineConfig {
            source_a: self.source_a.clone(),
            source_b: self.source_b.clone(),
            output: self.output.clone(),
            stride: self.stride,
            seed: self.seed,
            ratios: SplitRatios::new(self.train_size, self.val_size)?,
            source_label: self.source_label.clone(),
            target_label: self.target_label.clone(),
            source_a_image_ext: trim_dot(&self.source_a_image_ext),
            source_b_image_ext: trim_dot(&self.source_b_image_ext),
            image_ext: trim_dot(&self.image_ext),
        })
    }
}

/// Everything a merge run needs, independent of the command line.
#[derive(Debug, Clone)]
pub struct CombineConfig {
    pub source_a: PathBuf,
    pub source_b: PathBuf,
    pub output: PathBuf,
    pub stride: usize,
    pub seed: u64,
    pub ratios: SplitRatios,
    pub source_label: String,
    pub target_label: String,
    pub source_a_image_ext: String,
    pub source_b_image_ext: String,
    pub image_ext: String,
}

impl Default for CombineConfig {
    fn default() -> Self {
        Self {
            source_a: PathBuf::from("./SCUT_HEAD"),
            source_b: PathBuf::from("./HollywoodHeads"),
            output: PathBuf::from("./COMBINED_HEAD"),
            stride: DEFAULT_STRIDE,
            seed: DEFAULT_SEED,
            ratios: SplitRatios::default(),
            source_label: "person".to_string(),
            target_label: "head".to_string(),
            source_a_image_ext: "jpg".to_string(),
            source_b_image_ext: "jpeg".to_string(),
            image_ext: "jpg".to_string(),
        }
    }
}

/// Command-line arguments for auditing the labels of an annotation directory.
#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
pub struct LabelArgs {
    /// Directory containing VOC annotation files
    #[arg(short = 'd', long = "annotations_dir", default_value = "./Annotations")]
    pub annotations_dir: PathBuf,

    /// Report files carrying any label other than this one
    #[arg(long = "expected")]
    pub expected: Option<String>,
}

fn trim_dot(ext: &str) -> String {
    ext.trim_start_matches('.').to_string()
}

// Validate that the size is between 0.0 and 1.0
fn validate_size(s: &str) -> std::result::Result<f64, String> {
    match f64::from_str(s) {
        Ok(val) if (0.0..=1.0).contains(&val) => Ok(val),
        _ => Err("SIZE must be between 0.0 and 1.0".to_string()),
    }
}

fn validate_stride(s: &str) -> std::result::Result<usize, String> {
    match usize::from_str(s) {
        Ok(val) if val > 0 => Ok(val),
        _ => Err("STRIDE must be a positive integer".to_string()),
    }
}
