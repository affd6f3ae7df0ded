//! Label inventory of an annotation directory.

use log::warn;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::annotation::read_annotation;
use crate::error::{MergeError, Result};
use crate::utils::list_files_with_extension;

#[derive(Debug, Default, Clone)]
pub struct LabelAudit {
    /// Object count per label, across all readable files.
    pub counts: BTreeMap<String, usize>,
    /// Files without any object.
    pub without_objects: Vec<PathBuf>,
    /// Files carrying a label other than the expected one.
    pub unexpected: Vec<(PathBuf, String)>,
    /// Files that could not be read or decoded.
    pub unreadable: Vec<PathBuf>,
}

impl LabelAudit {
    pub fn files_with_issues(&self) -> usize {
        self.without_objects.len() + self.unexpected.len() + self.unreadable.len()
    }

    pub fn print_summary(&self) {
        log::info!("Unique labels in dataset: {:?}", self.counts.keys().collect::<Vec<_>>());
        for (label, count) in &self.counts {
            log::info!("    {}: {}", label, count);
        }
        for path in &self.without_objects {
            log::warn!("{} has no objects", path.display());
        }
        for (path, label) in &self.unexpected {
            log::warn!("Found unexpected label '{}' in {}", label, path.display());
        }
        if !self.unreadable.is_empty() {
            log::warn!("{} files could not be parsed", self.unreadable.len());
        }
    }
}

/// Count object labels in every `.xml` file of `dir`. When `expected` is
/// given, the first label differing from it is recorded per file.
pub fn audit_labels(dir: &Path, expected: Option<&str>) -> Result<LabelAudit> {
    if !dir.is_dir() {
        return Err(MergeError::MissingDirectory(dir.to_path_buf()));
    }

    let mut audit = LabelAudit::default();
    for path in list_files_with_extension(dir, "xml") {
        let annotation = match read_annotation(&path) {
            Ok(annotation) => annotation,
            Err(e) => {
                warn!("Error parsing {}: {}", path.display(), e);
                audit.unreadable.push(path);
                continue;
            }
        };

        if annotation.objects.is_empty() {
            audit.without_objects.push(path);
            continue;
        }
        for obj in &annotation.objects {
            *audit.counts.entry(obj.name.clone()).or_insert(0) += 1;
        }
        if let Some(expected) = expected {
            if let Some(obj) = annotation.objects.iter().find(|obj| obj.name != expected) {
                audit.unexpected.push((path, obj.name.clone()));
            }
        }
    }
    Ok(audit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn object(name: &str) -> String {
        format!(
            "<object><name>{}</name><bndbox><xmin>1</xmin><ymin>1</ymin><xmax>5</xmax><ymax>5</ymax></bndbox></object>",
            name
        )
    }

    #[test]
    fn test_audit_labels() {
        let temp_dir = tempfile::tempdir().unwrap();
        let dir = temp_dir.path();
        fs::write(
            dir.join("a.xml"),
            format!("<annotation>{}{}</annotation>", object("person"), object("person")),
        )
        .unwrap();
        fs::write(
            dir.join("b.xml"),
            format!("<annotation>{}{}</annotation>", object("person"), object("hat")),
        )
        .unwrap();
        fs::write(
            dir.join("bb.xml"),
            format!(
                "<annotation>{}<segmented>0</segmented>{}</annotation>",
                object("person"),
                object("person")
            ),
        )
        .unwrap();
        fs::write(dir.join("c.xml"), "<annotation></annotation>").unwrap();
        fs::write(dir.join("d.xml"), "<annotation>").unwrap();

        let audit = audit_labels(dir, Some("person")).unwrap();
        assert_eq!(audit.counts.get("person"), Some(&5));
        assert_eq!(audit.counts.get("hat"), Some(&1));
        assert_eq!(audit.unexpected.len(), 1);
        assert_eq!(audit.unexpected[0].1, "hat");
        assert_eq!(audit.without_objects, vec![dir.join("c.xml")]);
        assert_eq!(audit.unreadable, vec![dir.join("d.xml")]);
        assert_eq!(audit.files_with_issues(), 3);
    }

    #[test]
    fn test_audit_missing_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(audit_labels(&temp_dir.path().join("nope"), None).is_err());
    }
}
