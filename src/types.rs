use std::fmt;
use std::path::{Path, PathBuf};

use crate::annotation::Validity;
use crate::linker::LinkOutcome;

/// Directory of VOC annotations inside a dataset root.
pub const ANNOTATIONS_DIR: &str = "Annotations";
/// Directory of images inside a dataset root.
pub const IMAGES_DIR: &str = "JPEGImages";
/// Location of the pre-existing manifests inside a source A root.
pub const IMAGE_SETS_DIR: &str = "ImageSets/Main";
/// Directory of the generated manifests inside the unified store.
pub const SPLITS_DIR: &str = "Splits";
/// Name of the combined train + val manifest.
pub const TRAINVAL_MANIFEST: &str = "trainval.txt";

/// One of the three dataset partitions.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Split {
    Train,
    Val,
    Test,
}

impl Split {
    pub const ALL: [Split; 3] = [Split::Train, Split::Val, Split::Test];

    pub fn file_stem(self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Val => "val",
            Split::Test => "test",
        }
    }

    pub fn manifest_name(self) -> String {
        format!("{}.txt", self.file_stem())
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.file_stem())
    }
}

/// Identifiers assigned to each partition.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SplitSet {
    pub train: Vec<String>,
    pub val: Vec<String>,
    pub test: Vec<String>,
}

impl SplitSet {
    pub fn get(&self, split: Split) -> &[String] {
        match split {
            Split::Train => &self.train,
            Split::Val => &self.val,
            Split::Test => &self.test,
        }
    }

    pub fn get_mut(&mut self, split: Split) -> &mut Vec<String> {
        match split {
            Split::Train => &mut self.train,
            Split::Val => &mut self.val,
            Split::Test => &mut self.test,
        }
    }

    pub fn len(&self) -> usize {
        self.train.len() + self.val.len() + self.test.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Every identifier, train first, then val, then test.
    pub fn iter_all(&self) -> impl Iterator<Item = &String> {
        self.train.iter().chain(&self.val).chain(&self.test)
    }
}

/// Paths of one input dataset.
#[derive(Debug, Clone)]
pub struct SourceLayout {
    pub root: PathBuf,
    pub annotations_dir: PathBuf,
    pub images_dir: PathBuf,
}

impl SourceLayout {
    pub fn new(root: &Path) -> Self {
        Self {
            root: root.to_path_buf(),
            annotations_dir: root.join(ANNOTATIONS_DIR),
            images_dir: root.join(IMAGES_DIR),
        }
    }

    pub fn manifest_path(&self, split: Split) -> PathBuf {
        self.root.join(IMAGE_SETS_DIR).join(split.manifest_name())
    }
}

// Paths of the unified store
#[derive(Debug, Clone)]
pub struct OutputDirs {
    pub annotations_dir: PathBuf,
    pub images_dir: PathBuf,
    pub splits_dir: PathBuf,
}

// Struct to hold processing statistics
#[derive(Debug, Default, Clone)]
pub struct ProcessingStats {
    pub annotations_checked: usize,
    pub skipped_empty: usize,
    pub skipped_invalid_xml: usize,
    pub skipped_no_objects: usize,
    pub skipped_malformed: usize,
    pub rewritten: usize,
    pub labels_replaced: usize,
    pub rewrite_failures: usize,
    pub links_created: usize,
    pub links_existing: usize,
    pub missing_sources: usize,
    pub link_failures: usize,
}

impl ProcessingStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_validity(&mut self, validity: Validity) {
        self.annotations_checked += 1;
        match validity {
            Validity::Empty => self.skipped_empty += 1,
            Validity::InvalidFormat => self.skipped_invalid_xml += 1,
            Validity::NoObjects => self.skipped_no_objects += 1,
            Validity::MalformedObject => self.skipped_malformed += 1,
            Validity::Valid => {}
        }
    }

    pub fn record_link(&mut self, outcome: &LinkOutcome) {
        match outcome {
            LinkOutcome::Created => self.links_created += 1,
            LinkOutcome::AlreadyExists => self.links_existing += 1,
            LinkOutcome::MissingSource => self.missing_sources += 1,
            LinkOutcome::Failed(_) => self.link_failures += 1,
        }
    }

    pub fn total_skipped(&self) -> usize {
        self.skipped_empty + self.skipped_invalid_xml + self.skipped_no_objects + self.skipped_malformed
    }

    pub fn print_summary(&self) {
        log::info!("=== Processing Summary ===");
        log::info!("Annotations checked: {}", self.annotations_checked);
        log::info!(
            "Labels rewritten: {} across {} files",
            self.labels_replaced,
            self.rewritten
        );
        log::info!(
            "Links created: {} (already present: {})",
            self.links_created,
            self.links_existing
        );

        let total_skipped = self.total_skipped();
        if total_skipped > 0 {
            log::warn!(
                "Skipped annotations: {} (empty: {}, invalid xml: {}, no objects: {}, malformed: {})",
                total_skipped,
                self.skipped_empty,
                self.skipped_invalid_xml,
                self.skipped_no_objects,
                self.skipped_malformed
            );
        }
        if self.missing_sources + self.link_failures + self.rewrite_failures > 0 {
            log::warn!(
                "Incomplete items: missing source files: {}, failed links: {}, failed rewrites: {}",
                self.missing_sources,
                self.link_failures,
                self.rewrite_failures
            );
        }
    }
}

/// Result of a complete merge run.
#[derive(Debug, Clone)]
pub struct CombineSummary {
    pub source_a: SplitSet,
    pub source_b: SplitSet,
    pub stats: ProcessingStats,
}

impl CombineSummary {
    /// Identifiers written to the manifest of `split`.
    pub fn split_len(&self, split: Split) -> usize {
        self.source_a.get(split).len() + self.source_b.get(split).len()
    }

    pub fn print_summary(&self) {
        log::info!(
            "Source A (valid only): train={}, val={}, test={}",
            self.source_a.train.len(),
            self.source_a.val.len(),
            self.source_a.test.len()
        );
        log::info!(
            "Source B selected (valid only): total={}, train={}, val={}, test={}",
            self.source_b.len(),
            self.source_b.train.len(),
            self.source_b.val.len(),
            self.source_b.test.len()
        );
        self.stats.print_summary();
    }
}
