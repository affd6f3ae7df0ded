//! Category relabelling for annotation files.

use log::debug;
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::Path;
use xml::reader::{EventReader, ParserConfig, XmlEvent};
use xml::writer::{EmitterConfig, XmlEvent as WriterEvent};

use crate::error::{MergeError, Result};

/// What a rewrite touched.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RewriteReport {
    /// Root-level objects seen.
    pub objects: usize,
    /// Labels replaced.
    pub relabelled: usize,
}

/// Copy the annotation at `src` to `dst`, renaming every object labelled
/// `from` to `to`. Only the `name` element directly under a root-level
/// `object` is considered; everything else passes through unchanged.
///
/// `dst` is replaced unconditionally. If `dst` is a symlink it is removed
/// first so the write never lands on the file it points to.
pub fn rewrite_labels(src: &Path, dst: &Path, from: &str, to: &str) -> Result<RewriteReport> {
    let file = File::open(src)?;
    let (buffer, report) = rewrite_stream(BufReader::new(file), from, to).map_err(|reason| {
        MergeError::Xml {
            path: src.to_path_buf(),
            reason,
        }
    })?;

    if let Ok(meta) = fs::symlink_metadata(dst) {
        if meta.file_type().is_symlink() {
            debug!("Replacing symlink {} with a rewritten copy", dst.display());
            fs::remove_file(dst)?;
        }
    }
    fs::write(dst, buffer)?;
    Ok(report)
}

/// Rewrite from any reader into an in-memory document.
pub fn rewrite_stream<R: Read>(
    reader: R,
    from: &str,
    to: &str,
) -> std::result::Result<(Vec<u8>, RewriteReport), String> {
    let parser = EventReader::new_with_config(
        reader,
        ParserConfig::new()
            .ignore_comments(false)
            .coalesce_characters(true),
    );
    let mut buffer = Vec::new();
    let mut writer = EmitterConfig::new()
        .perform_indent(false)
        .normalize_empty_elements(false)
        .autopad_comments(false)
        .create_writer(&mut buffer);

    let mut path: Vec<String> = Vec::new();
    let mut report = RewriteReport::default();

    for event in parser {
        let event = event.map_err(|e| e.to_string())?;
        match &event {
            XmlEvent::StartElement { name, .. } => {
                if path.len() == 1 && name.local_name == "object" {
                    report.objects += 1;
                }
                path.push(name.local_name.clone());
            }
            XmlEvent::EndElement { .. } => {
                path.pop();
            }
            XmlEvent::Characters(text) if is_object_name(&path) && text.trim() == from => {
                writer
                    .write(WriterEvent::characters(to))
                    .map_err(|e| e.to_string())?;
                report.relabelled += 1;
                continue;
            }
            _ => {}
        }
        if let Some(out) = event.as_writer_event() {
            writer.write(out).map_err(|e| e.to_string())?;
        }
    }
    drop(writer);

    Ok((buffer, report))
}

fn is_object_name(path: &[String]) -> bool {
    path.len() == 3 && path[1] == "object" && path[2] == "name"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{validate_content, AnnotationRecord, SourceDataset, Validity};

    const SOURCE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<annotation>
    <filename>PartA_00001.jpg</filename>
    <!-- annotated by hand -->
    <size><width>640</width><height>480</height><depth>3</depth></size>
    <object>
        <name>person</name>
        <bndbox><xmin>10</xmin><ymin>20</ymin><xmax>50</xmax><ymax>70</ymax></bndbox>
    </object>
    <object>
        <name>person</name>
        <bndbox><xmin>60</xmin><ymin>20</ymin><xmax>90</xmax><ymax>70</ymax></bndbox>
    </object>
    <object>
        <name>hat</name>
        <bndbox><xmin>1</xmin><ymin>2</ymin><xmax>3</xmax><ymax>4</ymax></bndbox>
    </object>
    <name>person</name>
</annotation>"#;

    #[test]
    fn test_rewrite_replaces_only_object_names() {
        let (out, report) = rewrite_stream(SOURCE.as_bytes(), "person", "head").unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(report, RewriteReport { objects: 3, relabelled: 2 });
        assert_eq!(text.matches("<name>head</name>").count(), 2);
        assert!(text.contains("<name>hat</name>"));
        // the stray root-level <name> is not an object label
        assert!(text.contains("<name>person</name>"));
        assert!(text.contains("<xmin>60</xmin>"));
        assert!(text.contains("annotated by hand"));
        assert_eq!(validate_content(text.as_bytes()), Validity::Valid);
    }

    #[test]
    fn test_rewrite_is_idempotent() {
        let (once, _) = rewrite_stream(SOURCE.as_bytes(), "person", "head").unwrap();
        let (twice, report) = rewrite_stream(once.as_slice(), "person", "head").unwrap();
        assert_eq!(report.relabelled, 0);
        assert_eq!(report.objects, 3);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_rewrite_rejects_malformed_input() {
        assert!(rewrite_stream("<annotation><object>".as_bytes(), "person", "head").is_err());
    }

    #[test]
    fn test_rewrite_file_leaves_source_untouched() {
        let temp_dir = tempfile::tempdir().unwrap();
        let src = temp_dir.path().join("a.xml");
        let dst = temp_dir.path().join("out.xml");
        fs::write(&src, SOURCE).unwrap();
        fs::write(&dst, "stale").unwrap();

        let report = rewrite_labels(&src, &dst, "person", "head").unwrap();
        assert_eq!(report.relabelled, 2);
        assert_eq!(fs::read_to_string(&src).unwrap(), SOURCE);

        let before = AnnotationRecord::load(&src, SourceDataset::SourceA).unwrap();
        let after = AnnotationRecord::load(&dst, SourceDataset::SourceA).unwrap();
        assert_eq!(before.objects.len(), after.objects.len());
        assert_eq!(after.count_label("person"), 0);
        assert_eq!(after.count_label("head"), 2);
        assert_eq!(after.objects[0].bndbox, before.objects[0].bndbox);
    }

    #[cfg(unix)]
    #[test]
    fn test_rewrite_does_not_write_through_symlink() {
        let temp_dir = tempfile::tempdir().unwrap();
        let src = temp_dir.path().join("a.xml");
        let dst = temp_dir.path().join("linked.xml");
        fs::write(&src, SOURCE).unwrap();
        std::os::unix::fs::symlink(&src, &dst).unwrap();

        rewrite_labels(&src, &dst, "person", "head").unwrap();
        assert_eq!(fs::read_to_string(&src).unwrap(), SOURCE);
        assert!(!fs::symlink_metadata(&dst).unwrap().file_type().is_symlink());
    }
}
