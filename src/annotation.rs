//! Pascal-VOC annotation model and validation.
//!
//! Validation runs in two stages: a streaming pass with `xml-rs` checks that
//! the document is well formed and cuts out every `object` child of the root
//! element, then each object is decoded on its own with `serde-xml-rs` to
//! check that it carries a label and a numeric bounding box. Objects need not
//! be adjacent; any other element may sit between them.

use log::debug;
use serde::Deserialize;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::Path;
use xml::reader::{EventReader, ParserConfig, XmlEvent};
use xml::writer::{EmitterConfig, EventWriter};

use crate::error::{MergeError, Result};
use crate::utils::base_identifier;

/// The two datasets being merged.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SourceDataset {
    /// Relabelled dataset with pre-existing split manifests.
    SourceA,
    /// Subsampled dataset whose splits are drawn at merge time.
    SourceB,
}

impl fmt::Display for SourceDataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceDataset::SourceA => f.write_str("source A"),
            SourceDataset::SourceB => f.write_str("source B"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct BoundingBox {
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

impl BoundingBox {
    pub fn width(&self) -> f64 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f64 {
        self.ymax - self.ymin
    }
}

/// A labelled object inside an annotation.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnnotatedObject {
    pub name: String,
    pub bndbox: BoundingBox,
}

/// The subset of a VOC annotation the merge cares about. Unknown elements
/// (`size`, `source`, `segmented`, ...) are ignored on read.
#[derive(Debug, Clone, PartialEq)]
pub struct VocAnnotation {
    pub filename: Option<String>,
    pub objects: Vec<AnnotatedObject>,
}

/// Ground truth for one image, tagged with the dataset it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationRecord {
    pub id: String,
    pub source: SourceDataset,
    pub objects: Vec<AnnotatedObject>,
}

impl AnnotationRecord {
    /// Load a record; the base identifier is the file stem.
    pub fn load(path: &Path, source: SourceDataset) -> Result<Self> {
        let id = base_identifier(path).ok_or_else(|| MergeError::Xml {
            path: path.to_path_buf(),
            reason: "file name has no usable stem".to_string(),
        })?;
        let annotation = read_annotation(path)?;
        Ok(Self {
            id,
            source,
            objects: annotation.objects,
        })
    }

    pub fn is_valid(&self) -> bool {
        !self.objects.is_empty()
    }

    /// Number of objects carrying `label`.
    pub fn count_label(&self, label: &str) -> usize {
        self.objects.iter().filter(|obj| obj.name == label).count()
    }
}

/// Outcome of [`validate_annotation`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Validity {
    Empty,
    InvalidFormat,
    NoObjects,
    /// An object is missing its label or bounding box, or a coordinate is
    /// not numeric.
    MalformedObject,
    Valid,
}

impl Validity {
    pub fn is_valid(self) -> bool {
        self == Validity::Valid
    }

    pub fn reason(self) -> &'static str {
        match self {
            Validity::Empty => "Empty file",
            Validity::InvalidFormat => "Invalid XML",
            Validity::NoObjects => "No objects found",
            Validity::MalformedObject => "Malformed object",
            Validity::Valid => "Valid with objects",
        }
    }
}

impl fmt::Display for Validity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason())
    }
}

/// Check that an annotation file is well formed and has at least one
/// complete object. Never fails: anything unreadable is reported as invalid.
pub fn validate_annotation(path: &Path) -> Validity {
    let content = match fs::read(path) {
        Ok(content) => content,
        Err(e) => {
            debug!("Failed to read {}: {}", path.display(), e);
            return Validity::Empty;
        }
    };
    validate_content(&content)
}

/// Validation over in-memory bytes, shared by [`validate_annotation`].
pub fn validate_content(content: &[u8]) -> Validity {
    if content.iter().all(|b| b.is_ascii_whitespace()) {
        return Validity::Empty;
    }

    let scan = match scan_root(content) {
        Ok(scan) => scan,
        Err(_) => return Validity::InvalidFormat,
    };
    if scan.objects.is_empty() {
        return Validity::NoObjects;
    }
    if scan.objects.iter().all(|object| decode_object(object).is_ok()) {
        Validity::Valid
    } else {
        Validity::MalformedObject
    }
}

/// Read and decode an annotation file.
pub fn read_annotation(path: &Path) -> Result<VocAnnotation> {
    let xml_error = |reason: String| MergeError::Xml {
        path: path.to_path_buf(),
        reason,
    };

    let file = File::open(path)?;
    let scan = scan_root(BufReader::new(file)).map_err(xml_error)?;
    let objects = scan
        .objects
        .iter()
        .map(|object| decode_object(object).map_err(|e| xml_error(e.to_string())))
        .collect::<Result<Vec<_>>>()?;

    Ok(VocAnnotation {
        filename: scan.filename,
        objects,
    })
}

/// Root-level content gathered in one streaming pass.
struct RootScan {
    filename: Option<String>,
    /// Every root-level `object` element, serialized on its own.
    objects: Vec<Vec<u8>>,
}

fn scan_root<R: Read>(reader: R) -> std::result::Result<RootScan, String> {
    let parser = EventReader::new_with_config(reader, ParserConfig::new().coalesce_characters(true));
    let mut scan = RootScan {
        filename: None,
        objects: Vec::new(),
    };
    let mut depth = 0usize;
    let mut in_filename = false;
    let mut object: Option<EventWriter<Vec<u8>>> = None;

    for event in parser {
        let event = event.map_err(|e| e.to_string())?;
        match &event {
            XmlEvent::StartElement { name, .. } => {
                depth += 1;
                if depth == 2 {
                    match name.local_name.as_str() {
                        "object" => object = Some(fragment_writer()),
                        "filename" => in_filename = true,
                        _ => {}
                    }
                }
            }
            XmlEvent::Characters(text) if in_filename && depth == 2 => {
                scan.filename.get_or_insert_with(String::new).push_str(text);
            }
            _ => {}
        }

        if let Some(writer) = object.as_mut() {
            if !matches!(event, XmlEvent::Whitespace(_)) {
                if let Some(out) = event.as_writer_event() {
                    writer.write(out).map_err(|e| e.to_string())?;
                }
            }
        }

        if let XmlEvent::EndElement { .. } = &event {
            if depth == 2 {
                in_filename = false;
                if let Some(writer) = object.take() {
                    scan.objects.push(writer.into_inner());
                }
            }
            depth = depth.saturating_sub(1);
        }
    }
    Ok(scan)
}

fn fragment_writer() -> EventWriter<Vec<u8>> {
    EmitterConfig::new()
        .write_document_declaration(false)
        .perform_indent(false)
        .normalize_empty_elements(false)
        .create_writer(Vec::new())
}

fn decode_object(fragment: &[u8]) -> std::result::Result<AnnotatedObject, serde_xml_rs::Error> {
    serde_xml_rs::from_reader(fragment)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const VALID: &str = r#"<annotation>
    <folder>JPEGImages</folder>
    <filename>PartA_00001.jpg</filename>
    <size><width>640</width><height>480</height><depth>3</depth></size>
    <object>
        <name>person</name>
        <difficult>0</difficult>
        <bndbox><xmin>10</xmin><ymin>20</ymin><xmax>50</xmax><ymax>70</ymax></bndbox>
    </object>
    <object>
        <name>person</name>
        <bndbox><xmin>100.5</xmin><ymin>20</ymin><xmax>150</xmax><ymax>80</ymax></bndbox>
    </object>
</annotation>"#;

    #[test]
    fn test_validate_valid_annotation() {
        assert_eq!(validate_content(VALID.as_bytes()), Validity::Valid);
    }

    #[test]
    fn test_validate_empty_and_whitespace() {
        assert_eq!(validate_content(b""), Validity::Empty);
        assert_eq!(validate_content(b"  \n\t "), Validity::Empty);
    }

    #[test]
    fn test_validate_invalid_xml() {
        assert_eq!(
            validate_content(b"<annotation><object></annotation>"),
            Validity::InvalidFormat
        );
        assert_eq!(validate_content(b"not xml at all"), Validity::InvalidFormat);
    }

    #[test]
    fn test_validate_no_objects() {
        let xml = "<annotation><filename>a.jpg</filename></annotation>";
        assert_eq!(validate_content(xml.as_bytes()), Validity::NoObjects);
    }

    #[test]
    fn test_nested_object_is_not_counted() {
        let xml = "<annotation><part><object><name>head</name></object></part></annotation>";
        assert_eq!(validate_content(xml.as_bytes()), Validity::NoObjects);
    }

    #[test]
    fn test_validate_malformed_object() {
        let missing_box = "<annotation><object><name>head</name></object></annotation>";
        assert_eq!(
            validate_content(missing_box.as_bytes()),
            Validity::MalformedObject
        );

        let bad_coord = "<annotation><object><name>head</name>\
            <bndbox><xmin>a</xmin><ymin>1</ymin><xmax>2</xmax><ymax>3</ymax></bndbox>\
            </object></annotation>";
        assert_eq!(
            validate_content(bad_coord.as_bytes()),
            Validity::MalformedObject
        );
    }

    const SEPARATED: &str = "<annotation><filename>b.jpg</filename>\
        <object><name>head</name><bndbox><xmin>1</xmin><ymin>2</ymin><xmax>3</xmax><ymax>4</ymax></bndbox></object>\
        <segmented>0</segmented>\
        <object><name>head</name><bndbox><xmin>5</xmin><ymin>6</ymin><xmax>7</xmax><ymax>8</ymax></bndbox></object>\
        </annotation>";

    const SEPARATED_PRETTY: &str = r#"<annotation>
    <filename>c.jpg</filename>
    <object>
        <name>head</name>
        <bndbox><xmin>1</xmin><ymin>2</ymin><xmax>3</xmax><ymax>4</ymax></bndbox>
    </object>
    <size><width>640</width><height>480</height><depth>3</depth></size>
    <!-- second head -->
    <object>
        <name>head</name>
        <pose>Unknown</pose>
        <bndbox><xmin>5</xmin><ymin>6</ymin><xmax>7</xmax><ymax>8</ymax></bndbox>
    </object>
</annotation>"#;

    #[test]
    fn test_validate_objects_separated_by_other_elements() {
        assert_eq!(validate_content(SEPARATED.as_bytes()), Validity::Valid);
        assert_eq!(validate_content(SEPARATED_PRETTY.as_bytes()), Validity::Valid);
    }

    #[test]
    fn test_malformed_object_after_separator() {
        let xml = "<annotation>\
            <object><name>head</name><bndbox><xmin>1</xmin><ymin>2</ymin><xmax>3</xmax><ymax>4</ymax></bndbox></object>\
            <size><width>10</width></size>\
            <object><name>head</name></object>\
            </annotation>";
        assert_eq!(validate_content(xml.as_bytes()), Validity::MalformedObject);
    }

    #[test]
    fn test_read_separated_objects() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("separated.xml");
        fs::write(&path, SEPARATED_PRETTY).unwrap();

        let annotation = read_annotation(&path).unwrap();
        assert_eq!(annotation.filename.as_deref(), Some("c.jpg"));
        assert_eq!(annotation.objects.len(), 2);
        assert_eq!(annotation.objects[1].bndbox.xmin, 5.0);
        assert_eq!(annotation.objects[1].bndbox.ymax, 8.0);
    }

    #[test]
    fn test_validate_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            validate_annotation(&dir.path().join("missing.xml")),
            Validity::Empty
        );
    }

    #[test]
    fn test_load_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("PartA_00001.xml");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(VALID.as_bytes()).unwrap();

        let record = AnnotationRecord::load(&path, SourceDataset::SourceA).unwrap();
        assert_eq!(record.id, "PartA_00001");
        assert!(record.is_valid());
        assert_eq!(record.objects.len(), 2);
        assert_eq!(record.count_label("person"), 2);
        assert_eq!(record.objects[1].bndbox.xmin, 100.5);
        assert_eq!(record.objects[0].bndbox.width(), 40.0);
    }

    #[test]
    fn test_reason_strings() {
        assert_eq!(Validity::NoObjects.to_string(), "No objects found");
        assert!(!Validity::Empty.is_valid());
        assert!(Validity::Valid.is_valid());
    }
}
