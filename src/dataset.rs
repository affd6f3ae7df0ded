use log::{error, info, warn};
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::annotation::{validate_annotation, SourceDataset, Validity};
use crate::config::CombineConfig;
use crate::error::{MergeError, Result};
use crate::linker::link_with_extension;
use crate::manifest::{filter_manifest, read_manifest, write_split_manifests};
use crate::rewrite::rewrite_labels;
use crate::sampler::select_source_b;
use crate::types::{
    CombineSummary, OutputDirs, ProcessingStats, SourceLayout, Split, SplitSet, ANNOTATIONS_DIR,
    IMAGES_DIR, SPLITS_DIR,
};
use crate::utils::{base_identifier, create_output_directory, create_progress_bar, list_files_with_extension};

const ANNOTATION_EXT: &str = "xml";

/// Set up the directory structure of the unified store
pub fn setup_output_directories(output: &Path) -> std::io::Result<OutputDirs> {
    Ok(OutputDirs {
        annotations_dir: create_output_directory(&output.join(ANNOTATIONS_DIR))?,
        images_dir: create_output_directory(&output.join(IMAGES_DIR))?,
        splits_dir: create_output_directory(&output.join(SPLITS_DIR))?,
    })
}

/// Validate every annotation in `dir` and return the valid ones with their
/// base identifiers, in sorted path order. Invalid files are logged.
pub fn validate_directory(
    dir: &Path,
    source: SourceDataset,
    stats: &mut ProcessingStats,
) -> Vec<(PathBuf, String)> {
    let files = list_files_with_extension(dir, ANNOTATION_EXT);
    let pb = create_progress_bar(files.len() as u64, &format!("Validate {}", source));

    // collect keeps input order, so the result matches a sequential scan
    let results: Vec<(PathBuf, Validity)> = files
        .into_par_iter()
        .map(|path| {
            let validity = validate_annotation(&path);
            pb.inc(1);
            (path, validity)
        })
        .collect();
    pb.finish_and_clear();

    let mut valid = Vec::with_capacity(results.len());
    for (path, validity) in results {
        stats.record_validity(validity);
        if !validity.is_valid() {
            warn!("Skipping {}: {}", path.display(), validity);
            continue;
        }
        match base_identifier(&path) {
            Some(id) => valid.push((path, id)),
            None => warn!("Skipping {}: file name has no usable stem", path.display()),
        }
    }
    valid
}

/// Relabel and link source A, then filter its manifests to the valid items.
///
/// `manifests` holds the raw identifiers of each pre-existing split.
pub fn process_source_a(
    layout: &SourceLayout,
    output: &OutputDirs,
    config: &CombineConfig,
    manifests: SplitSet,
    stats: &mut ProcessingStats,
) -> SplitSet {
    let valid = validate_directory(&layout.annotations_dir, SourceDataset::SourceA, stats);
    info!("Source A: {} valid annotations", valid.len());

    let pb = create_progress_bar(valid.len() as u64, "Source A");
    for (path, id) in &valid {
        let dst = output
            .annotations_dir
            .join(format!("{}.{}", id, ANNOTATION_EXT));
        match rewrite_labels(path, &dst, &config.source_label, &config.target_label) {
            Ok(report) => {
                stats.rewritten += 1;
                stats.labels_replaced += report.relabelled;
            }
            Err(e) => {
                error!("Failed to rewrite {}: {}", path.display(), e);
                stats.rewrite_failures += 1;
            }
        }

        link_with_extension(
            &layout.images_dir,
            &output.images_dir,
            id,
            &config.source_a_image_ext,
            &config.source_a_image_ext,
            stats,
        );
        pb.inc(1);
    }
    pb.finish_with_message("Source A processing complete");

    let valid_ids: HashSet<String> = valid.into_iter().map(|(_, id)| id).collect();
    let mut splits = SplitSet::default();
    for split in Split::ALL {
        let ids = manifests.get(split).to_vec();
        let before = ids.len();
        let kept = filter_manifest(ids, &valid_ids);
        if kept.len() < before {
            info!(
                "Source A {}: dropped {} identifiers without a valid annotation",
                split,
                before - kept.len()
            );
        }
        *splits.get_mut(split) = kept;
    }
    splits
}

/// Sample, split and link source B.
pub fn process_source_b(
    layout: &SourceLayout,
    output: &OutputDirs,
    config: &CombineConfig,
    stats: &mut ProcessingStats,
) -> SplitSet {
    let valid = validate_directory(&layout.annotations_dir, SourceDataset::SourceB, stats);
    let ids: Vec<String> = valid.into_iter().map(|(_, id)| id).collect();
    let selection = select_source_b(&ids, config.stride, config.ratios, config.seed);
    info!(
        "Source B: {} valid annotations, {} selected with stride {}",
        ids.len(),
        selection.len(),
        config.stride
    );

    let pb = create_progress_bar(selection.len() as u64, "Source B");
    for id in selection.iter_all() {
        link_with_extension(
            &layout.annotations_dir,
            &output.annotations_dir,
            id,
            ANNOTATION_EXT,
            ANNOTATION_EXT,
            stats,
        );
        link_with_extension(
            &layout.images_dir,
            &output.images_dir,
            id,
            &config.source_b_image_ext,
            &config.image_ext,
            stats,
        );
        pb.inc(1);
    }
    pb.finish_with_message("Source B processing complete");

    selection
}

/// Read the three source A manifests. Any missing manifest aborts the run.
pub fn read_source_a_manifests(layout: &SourceLayout) -> Result<SplitSet> {
    let mut manifests = SplitSet::default();
    for split in Split::ALL {
        *manifests.get_mut(split) = read_manifest(&layout.manifest_path(split))?;
    }
    Ok(manifests)
}

fn require_dir(path: &Path) -> Result<()> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(MergeError::MissingDirectory(path.to_path_buf()))
    }
}

/// Main merge pipeline
pub fn combine_datasets(config: &CombineConfig) -> Result<CombineSummary> {
    let source_a = SourceLayout::new(&config.source_a);
    let source_b = SourceLayout::new(&config.source_b);
    for dir in [
        &source_a.annotations_dir,
        &source_a.images_dir,
        &source_b.annotations_dir,
        &source_b.images_dir,
    ] {
        require_dir(dir)?;
    }
    // read before touching the store so a bad manifest leaves nothing behind
    let manifests = read_source_a_manifests(&source_a)?;

    let output = setup_output_directories(&config.output)?;
    let mut stats = ProcessingStats::new();

    let a_splits = process_source_a(&source_a, &output, config, manifests, &mut stats);
    let b_splits = process_source_b(&source_b, &output, config, &mut stats);

    info!("Writing split manifests to {}", output.splits_dir.display());
    write_split_manifests(&output.splits_dir, &a_splits, &b_splits)?;

    Ok(CombineSummary {
        source_a: a_splits,
        source_b: b_splits,
        stats,
    })
}
