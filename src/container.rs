//! ZIP container abstraction for OOXML packages.

use crate::error::DocumentError;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::Path;

type Result<T> = std::result::Result<T, DocumentError>;

/// Package relationship type pointing at the document thumbnail.
pub const THUMBNAIL_REL_TYPE: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships/metadata/thumbnail";

/// A relationship entry from a .rels file.
#[derive(Debug, Clone)]
pub struct Relationship {
    /// Relationship ID (e.g., "rId1")
    pub id: String,
    /// Relationship type URI
    pub rel_type: String,
    /// Target path (relative or absolute)
    pub target: String,
    /// Whether the target is external
    pub external: bool,
}

/// Relationships parsed from a single .rels part.
#[derive(Debug, Clone, Default)]
pub struct Relationships {
    entries: Vec<Relationship>,
    by_id: HashMap<String, usize>,
}

impl Relationships {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a relationship by ID.
    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.by_id.get(id).map(|&i| &self.entries[i])
    }

    /// First internal relationship of the given type, in document order.
    pub fn first_of_type(&self, rel_type: &str) -> Option<&Relationship> {
        self.entries
            .iter()
            .find(|r| !r.external && r.rel_type == rel_type)
    }

    /// Add a relationship. A duplicate ID replaces the earlier lookup entry.
    pub fn add(&mut self, rel: Relationship) {
        self.by_id.insert(rel.id.clone(), self.entries.len());
        self.entries.push(rel);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// OOXML package backed by an in-memory ZIP archive.
///
/// The whole package is read into memory on open, so no file handle stays
/// open for the lifetime of the container.
pub struct OoxmlContainer {
    archive: RefCell<zip::ZipArchive<Cursor<Vec<u8>>>>,
}

impl OoxmlContainer {
    /// Open a package from a file path.
    ///
    /// I/O failures (missing or unreadable file) come back as
    /// [`DocumentError::Io`]; a readable file that is not a ZIP archive comes
    /// back as [`DocumentError::ZipArchive`].
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let data = read_file(path.as_ref())?;
        Self::from_bytes(data)
    }

    /// Create a package from a byte vector.
    pub fn from_bytes(data: Vec<u8>) -> Result<Self> {
        let archive = zip::ZipArchive::new(Cursor::new(data))?;
        Ok(Self {
            archive: RefCell::new(archive),
        })
    }

    /// Create a package from any reader.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes(data)
    }

    /// Read an XML part as a string, handling UTF-8 and UTF-16 encodings.
    pub fn read_xml(&self, path: &str) -> Result<String> {
        let bytes = self.read_binary(path)?;
        decode_xml_bytes(&bytes)
    }

    /// Read a binary part.
    ///
    /// Only an absent part is reported as [`DocumentError::MissingComponent`];
    /// damaged or unsupported entries come back as archive errors.
    pub fn read_binary(&self, path: &str) -> Result<Vec<u8>> {
        let mut archive = self.archive.borrow_mut();
        let mut file = archive.by_name(path).map_err(|e| match e {
            zip::result::ZipError::FileNotFound => DocumentError::MissingComponent(path.to_string()),
            other => other.into(),
        })?;
        // The declared size comes from the archive header and is not trusted
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        Ok(data)
    }

    /// Check if a part exists.
    pub fn exists(&self, path: &str) -> bool {
        self.archive.borrow().index_for_name(path).is_some()
    }

    /// Read package-level relationships (`_rels/.rels`).
    pub fn read_package_relationships(&self) -> Result<Relationships> {
        self.parse_relationships("_rels/.rels")
    }

    /// Read the relationships of a part, e.g. `word/document.xml`.
    pub fn read_relationships(&self, part_path: &str) -> Result<Relationships> {
        let (dir, name) = match part_path.rsplit_once('/') {
            Some((dir, name)) => (dir, name),
            None => ("", part_path),
        };
        let rels_path = if dir.is_empty() {
            format!("_rels/{}.rels", name)
        } else {
            format!("{}/_rels/{}.rels", dir, name)
        };
        self.parse_relationships(&rels_path)
    }

    /// Read `dc:title` from `docProps/core.xml`, if present.
    pub fn core_title(&self) -> Option<String> {
        let xml = self.read_xml("docProps/core.xml").ok()?;
        let mut reader = quick_xml::Reader::from_str(&xml);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        let mut in_title = false;
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(quick_xml::events::Event::Start(e)) => {
                    in_title = e.name().local_name().as_ref() == b"title";
                }
                Ok(quick_xml::events::Event::Text(e)) if in_title => {
                    let text = e.unescape().ok()?.trim().to_string();
                    return (!text.is_empty()).then_some(text);
                }
                Ok(quick_xml::events::Event::End(_)) => in_title = false,
                Ok(quick_xml::events::Event::Eof) | Err(_) => return None,
                _ => {}
            }
            buf.clear();
        }
    }

    /// Parse a .rels part. A missing or empty part yields no relationships.
    fn parse_relationships(&self, rels_path: &str) -> Result<Relationships> {
        let content = match self.read_xml(rels_path) {
            Ok(c) => c,
            Err(DocumentError::MissingComponent(_)) => return Ok(Relationships::new()),
            Err(e) => return Err(e),
        };

        let mut rels = Relationships::new();
        let mut reader = quick_xml::Reader::from_str(&content);
        reader.config_mut().trim_text(true);

        let mut buf = Vec::new();
        loop {
            match reader.read_event_into(&mut buf) {
                Ok(quick_xml::events::Event::Empty(e)) | Ok(quick_xml::events::Event::Start(e))
                    if e.name().local_name().as_ref() == b"Relationship" =>
                {
                    let mut rel = Relationship {
                        id: String::new(),
                        rel_type: String::new(),
                        target: String::new(),
                        external: false,
                    };
                    for attr in e.attributes().flatten() {
                        let value = String::from_utf8_lossy(&attr.value).to_string();
                        match attr.key.as_ref() {
                            b"Id" => rel.id = value,
                            b"Type" => rel.rel_type = value,
                            b"Target" => rel.target = value,
                            b"TargetMode" => rel.external = value.eq_ignore_ascii_case("external"),
                            _ => {}
                        }
                    }
                    if !rel.id.is_empty() {
                        rels.add(rel);
                    }
                }
                Ok(quick_xml::events::Event::Eof) => break,
                Err(e) => return Err(e.into()),
                _ => {}
            }
            buf.clear();
        }

        Ok(rels)
    }

    /// Resolve a relationship target against the part that owns it.
    ///
    /// Absolute targets (leading `/`) are package-rooted. Package-level
    /// relationships use an empty `base`.
    pub fn resolve_path(base: &str, relative: &str) -> String {
        if let Some(stripped) = relative.strip_prefix('/') {
            return stripped.to_string();
        }

        let mut parts: Vec<&str> = match base.rsplit_once('/') {
            Some((dir, _)) => dir.split('/').filter(|p| !p.is_empty()).collect(),
            None => Vec::new(),
        };
        for segment in relative.split(['/', '\\']) {
            match segment {
                "" | "." => {}
                ".." => {
                    parts.pop();
                }
                s => parts.push(s),
            }
        }
        parts.join("/")
    }
}

impl std::fmt::Debug for OoxmlContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OoxmlContainer")
            .field("files", &self.archive.borrow().len())
            .finish()
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    Ok(data)
}

/// Decode XML bytes to a string.
///
/// OOXML parts are normally UTF-8, but some producers write UTF-16. After
/// transcoding, the XML declaration is rewritten to say UTF-8 so quick-xml
/// does not try to decode the string a second time.
pub fn decode_xml_bytes(bytes: &[u8]) -> Result<String> {
    let invalid = |e: &dyn std::fmt::Display| {
        DocumentError::Io(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            e.to_string(),
        ))
    };

    match bytes {
        [0xEF, 0xBB, 0xBF, rest @ ..] => String::from_utf8(rest.to_vec()).map_err(|e| invalid(&e)),
        [0xFF, 0xFE, rest @ ..] => decode_utf16(rest, u16::from_le_bytes)
            .map(|s| utf8_declaration(&s))
            .map_err(|e| invalid(&e)),
        [0xFE, 0xFF, rest @ ..] => decode_utf16(rest, u16::from_be_bytes)
            .map(|s| utf8_declaration(&s))
            .map_err(|e| invalid(&e)),
        _ => match std::str::from_utf8(bytes) {
            Ok(s) => Ok(s.to_string()),
            // ASCII in UTF-16 without a BOM leaves NULs in alternating bytes
            Err(_) if bytes.len() >= 4 && bytes[1] == 0 && bytes[3] == 0 => {
                decode_utf16(bytes, u16::from_le_bytes).map_err(|e| invalid(&e))
            }
            Err(_) if bytes.len() >= 4 && bytes[0] == 0 && bytes[2] == 0 => {
                decode_utf16(bytes, u16::from_be_bytes).map_err(|e| invalid(&e))
            }
            Err(_) => Ok(String::from_utf8_lossy(bytes).into_owned()),
        },
    }
}

fn decode_utf16(
    bytes: &[u8],
    unit: fn([u8; 2]) -> u16,
) -> std::result::Result<String, std::char::DecodeUtf16Error> {
    let units = bytes.chunks_exact(2).map(|pair| unit([pair[0], pair[1]]));
    char::decode_utf16(units).collect()
}

fn utf8_declaration(content: &str) -> String {
    if !content.starts_with("<?xml") {
        return content.to_string();
    }
    match content.find("?>") {
        Some(end) => {
            let (decl, rest) = content.split_at(end + 2);
            let mut fixed = decl.to_string();
            for quote in ['"', '\''] {
                for name in ["UTF-16", "utf-16"] {
                    fixed = fixed.replace(
                        &format!("encoding={q}{name}{q}", q = quote),
                        &format!("encoding={q}UTF-8{q}", q = quote),
                    );
                }
            }
            fixed + rest
        }
        None => content.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn package(parts: &[(&str, &[u8])]) -> Vec<u8> {
        let mut buffer = Vec::new();
        let mut zip = zip::ZipWriter::new(Cursor::new(&mut buffer));
        let options = SimpleFileOptions::default();
        for (name, data) in parts {
            zip.start_file(*name, options).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap();
        buffer
    }

    #[test]
    fn test_resolve_path() {
        assert_eq!(
            OoxmlContainer::resolve_path("word/document.xml", "../media/image1.png"),
            "media/image1.png"
        );
        assert_eq!(
            OoxmlContainer::resolve_path("word/document.xml", "media/image1.png"),
            "word/media/image1.png"
        );
        assert_eq!(
            OoxmlContainer::resolve_path("", "docProps/thumbnail.jpeg"),
            "docProps/thumbnail.jpeg"
        );
        assert_eq!(
            OoxmlContainer::resolve_path("word/document.xml", "/docProps/thumbnail.png"),
            "docProps/thumbnail.png"
        );
    }

    #[test]
    fn test_package_relationships() {
        let data = package(&[(
            "_rels/.rels",
            br#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
  <Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>
  <Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/thumbnail" Target="docProps/thumbnail.jpeg"/>
</Relationships>"#,
        )]);
        let container = OoxmlContainer::from_bytes(data).unwrap();
        let rels = container.read_package_relationships().unwrap();

        assert_eq!(rels.len(), 2);
        assert_eq!(rels.get("rId1").unwrap().target, "word/document.xml");
        assert_eq!(
            rels.first_of_type(THUMBNAIL_REL_TYPE).unwrap().target,
            "docProps/thumbnail.jpeg"
        );
    }

    #[test]
    fn test_missing_rels_is_empty() {
        let data = package(&[("word/document.xml", b"<w:document/>")]);
        let container = OoxmlContainer::from_bytes(data).unwrap();
        assert!(container.read_relationships("word/document.xml").unwrap().is_empty());
        assert!(container.exists("word/document.xml"));
        assert!(!container.exists("word/styles.xml"));
    }

    #[test]
    fn test_missing_part() {
        let data = package(&[("a.xml", b"<a/>")]);
        let container = OoxmlContainer::from_bytes(data).unwrap();
        assert!(matches!(
            container.read_binary("b.xml"),
            Err(DocumentError::MissingComponent(_))
        ));
    }

    /// Byte offset of the local file header for `name`.
    fn local_header(data: &[u8], name: &str) -> usize {
        data.windows(4)
            .enumerate()
            .find(|&(i, w)| {
                w == b"PK\x03\x04"
                    && data
                        .get(i + 30..)
                        .is_some_and(|rest| rest.starts_with(name.as_bytes()))
            })
            .map(|(i, _)| i)
            .unwrap()
    }

    #[test]
    fn test_damaged_rels_is_an_error() {
        let mut data = package(&[
            ("word/document.xml", b"<w:document/>"),
            ("_rels/.rels", b"<Relationships/>"),
        ]);
        let offset = local_header(&data, "_rels/.rels");
        data[offset..offset + 4].copy_from_slice(b"XXXX");

        let container = OoxmlContainer::from_bytes(data).unwrap();
        let err = container.read_package_relationships().unwrap_err();
        assert!(!matches!(err, DocumentError::MissingComponent(_)), "{err:?}");
    }

    #[test]
    fn test_oversized_declared_length() {
        let mut buffer = Vec::new();
        let mut zip = zip::ZipWriter::new(Cursor::new(&mut buffer));
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        zip.start_file("docProps/thumbnail.png", options).unwrap();
        zip.write_all(b"data").unwrap();
        zip.finish().unwrap();

        // Claim ~4 GB of uncompressed data in the central directory
        let central = buffer
            .windows(4)
            .position(|w| w == b"PK\x01\x02")
            .unwrap();
        buffer[central + 24..central + 28].copy_from_slice(&0xF000_0000u32.to_le_bytes());

        let container = OoxmlContainer::from_bytes(buffer).unwrap();
        match container.read_binary("docProps/thumbnail.png") {
            Ok(data) => assert_eq!(data, b"data"),
            Err(e) => assert!(!matches!(e, DocumentError::MissingComponent(_)), "{e:?}"),
        }
    }

    #[test]
    fn test_not_a_zip() {
        let err = OoxmlContainer::from_bytes(b"plain text".to_vec()).unwrap_err();
        assert!(matches!(err, DocumentError::ZipArchive(_)));
    }

    #[test]
    fn test_open_missing_file() {
        let err = OoxmlContainer::open("does/not/exist.docx").unwrap_err();
        assert!(matches!(err, DocumentError::Io(ref e) if e.kind() == std::io::ErrorKind::NotFound));
    }

    #[test]
    fn test_core_title() {
        let data = package(&[(
            "docProps/core.xml",
            br#"<cp:coreProperties xmlns:cp="c" xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:title>Quarterly Report</dc:title><dc:creator>me</dc:creator></cp:coreProperties>"#,
        )]);
        let container = OoxmlContainer::from_bytes(data).unwrap();
        assert_eq!(container.core_title().as_deref(), Some("Quarterly Report"));
    }

    #[test]
    fn test_decode_xml_bytes() {
        let utf16_le = b"\xFF\xFE<\0?\0x\0m\0l\0>\0";
        assert_eq!(decode_xml_bytes(utf16_le).unwrap(), "<?xml>");

        let utf16_be = b"\xFE\xFF\0<\0?\0x\0m\0l\0>";
        assert_eq!(decode_xml_bytes(utf16_be).unwrap(), "<?xml>");

        assert_eq!(decode_xml_bytes(b"\xEF\xBB\xBF<a/>").unwrap(), "<a/>");
        assert_eq!(decode_xml_bytes(b"<a/>").unwrap(), "<a/>");
    }

    #[test]
    fn test_utf16_declaration_rewritten() {
        let xml = "<?xml version=\"1.0\" encoding=\"UTF-16\"?><a/>";
        let mut bytes = vec![0xFF, 0xFE];
        for unit in xml.encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        assert_eq!(
            decode_xml_bytes(&bytes).unwrap(),
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?><a/>"
        );
    }
}
