use std::collections::HashSet;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{MergeError, Result};
use crate::types::{Split, SplitSet, TRAINVAL_MANIFEST};

/// Read a newline-delimited manifest, dropping blank lines.
pub fn read_manifest(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path).map_err(|source| MergeError::Manifest {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Keep the identifiers present in `valid`, preserving manifest order.
pub fn filter_manifest(ids: Vec<String>, valid: &HashSet<String>) -> Vec<String> {
    ids.into_iter().filter(|id| valid.contains(id)).collect()
}

/// Write identifiers one per line, replacing any existing file.
pub fn write_manifest<'a, I>(path: &Path, ids: I) -> std::io::Result<usize>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut writer = BufWriter::new(File::create(path)?);
    let mut count = 0;
    for id in ids {
        writeln!(writer, "{}", id)?;
        count += 1;
    }
    writer.flush()?;
    Ok(count)
}

/// Write `train.txt`, `val.txt`, `test.txt` and `trainval.txt`.
///
/// Source A identifiers always precede source B identifiers. The trainval
/// manifest is A train, A val, B train, B val.
pub fn write_split_manifests(
    splits_dir: &Path,
    source_a: &SplitSet,
    source_b: &SplitSet,
) -> std::io::Result<()> {
    for split in Split::ALL {
        let path = splits_dir.join(split.manifest_name());
        let count = write_manifest(
            &path,
            source_a.get(split).iter().chain(source_b.get(split)),
        )?;
        log::debug!("Wrote {} identifiers to {}", count, path.display());
    }

    let trainval = source_a
        .train
        .iter()
        .chain(&source_a.val)
        .chain(&source_b.train)
        .chain(&source_b.val);
    write_manifest(&splits_dir.join(TRAINVAL_MANIFEST), trainval)?;
    Ok(())
}
