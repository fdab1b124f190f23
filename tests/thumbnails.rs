//! End-to-end thumbnail tests over DOCX packages built in memory.

use docthumb::{
    thumbnails_from_bytes, thumbnails_from_path, thumbnails_from_reader, Cause, Dimensions,
    DocumentSource, DocxDocument, Error, RasterImage, Stage,
};
use image::{ImageFormat, Rgba, RgbaImage};
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;

const THUMBNAIL_REL: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships/metadata/thumbnail";
const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Builder for minimal Word packages.
#[derive(Default)]
struct Fixture {
    body: String,
    page: Option<(u32, u32)>,
    title: Option<&'static str>,
    preview: Option<(&'static str, Vec<u8>)>,
}

impl Fixture {
    fn new() -> Self {
        Self {
            body: String::from(
                r#"<w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>Quarterly Report</w:t></w:r></w:p>"#,
            ),
            ..Default::default()
        }
    }

    fn paragraphs(mut self, count: usize) -> Self {
        for i in 0..count {
            self.body.push_str(&format!(
                "<w:p><w:r><w:t>Paragraph {} has enough words to wrap across the page width.</w:t></w:r></w:p>",
                i
            ));
        }
        self
    }

    fn page(mut self, width_twips: u32, height_twips: u32) -> Self {
        self.page = Some((width_twips, height_twips));
        self
    }

    fn title(mut self, title: &'static str) -> Self {
        self.title = Some(title);
        self
    }

    fn preview(mut self, part: &'static str, data: Vec<u8>) -> Self {
        self.preview = Some((part, data));
        self
    }

    fn build(&self) -> Vec<u8> {
        let mut buffer = Vec::new();
        let mut zip = zip::ZipWriter::new(Cursor::new(&mut buffer));
        let options = SimpleFileOptions::default();

        zip.start_file("[Content_Types].xml", options).unwrap();
        zip.write_all(
            br#"<?xml version="1.0" encoding="UTF-8"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
  <Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
  <Default Extension="xml" ContentType="application/xml"/>
</Types>"#,
        )
        .unwrap();

        let mut rels = String::from(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">
<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/>"#,
        );
        if let Some((part, _)) = &self.preview {
            rels.push_str(&format!(
                r#"<Relationship Id="rId2" Type="{}" Target="{}"/>"#,
                THUMBNAIL_REL, part
            ));
        }
        if self.title.is_some() {
            rels.push_str(r#"<Relationship Id="rId3" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>"#);
        }
        rels.push_str("</Relationships>");
        zip.start_file("_rels/.rels", options).unwrap();
        zip.write_all(rels.as_bytes()).unwrap();

        let sect_pr = match self.page {
            Some((w, h)) => format!(r#"<w:sectPr><w:pgSz w:w="{}" w:h="{}"/></w:sectPr>"#, w, h),
            None => String::new(),
        };
        let document = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}{}</w:body></w:document>"#,
            self.body, sect_pr
        );
        zip.start_file("word/document.xml", options).unwrap();
        zip.write_all(document.as_bytes()).unwrap();

        if let Some(title) = self.title {
            zip.start_file("docProps/core.xml", options).unwrap();
            zip.write_all(
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/"><dc:title>{}</dc:title></cp:coreProperties>"#,
                    title
                )
                .as_bytes(),
            )
            .unwrap();
        }

        if let Some((part, data)) = &self.preview {
            zip.start_file(part.to_string(), options).unwrap();
            zip.write_all(data).unwrap();
        }

        zip.finish().unwrap();
        buffer
    }
}

fn png(image: &RgbaImage) -> Vec<u8> {
    let mut bytes = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}

fn has_ink(image: &RasterImage) -> bool {
    image.pixels().any(|p| *p != WHITE)
}

#[test]
fn test_embedded_preview_is_used() {
    let preview = RgbaImage::from_pixel(120, 160, Rgba([200, 30, 30, 255]));
    let data = Fixture::new()
        .page(12240, 15840)
        .preview("docProps/thumbnail.png", png(&preview))
        .build();

    let thumbs = thumbnails_from_bytes(
        "preview.docx",
        data,
        &[Dimensions::new(60, 80), Dimensions::new(32, 32)],
    )
    .unwrap();

    assert_eq!(thumbs.len(), 2);
    assert_eq!(thumbs[0].dimensions(), (60, 80));
    assert_eq!(thumbs[1].dimensions(), (32, 32));
    // Thumbnail comes from the red preview, not from rendering the page
    assert!(thumbs
        .iter()
        .all(|t| t.pixels().all(|p| p.0[0] > 180 && p.0[1] < 60)));
}

#[test]
fn test_rendered_when_no_preview() {
    let data = Fixture::new().page(12240, 15840).paragraphs(30).build();
    let targets = [Dimensions::new(128, 128), Dimensions::new(102, 132)];

    let thumbs = thumbnails_from_bytes("plain.docx", data, &targets).unwrap();
    assert_eq!(thumbs[0].dimensions(), (128, 128));
    assert_eq!(thumbs[1].dimensions(), (102, 132));
    assert!(thumbs.iter().all(has_ink));
    // Page corners are margin
    assert_eq!(*thumbs[1].get_pixel(0, 0), WHITE);
}

#[test]
fn test_rendered_at_first_target_without_page_size() {
    let data = Fixture::new().paragraphs(5).build();
    let doc = DocxDocument::from_bytes("nopage.docx", data).unwrap();
    assert_eq!(doc.native_page_size().unwrap(), None);

    let thumbs = docthumb::ThumbnailResolver::new()
        .resolve(&doc, &[Dimensions::new(408, 528), Dimensions::new(50, 50)])
        .unwrap();
    assert_eq!(thumbs[0].dimensions(), (408, 528));
    assert_eq!(thumbs[1].dimensions(), (50, 50));
    assert!(has_ink(&thumbs[0]));
}

#[test]
fn test_metafile_preview_falls_back_to_rendering() {
    let data = Fixture::new()
        .page(11906, 16838)
        .paragraphs(3)
        .preview("docProps/thumbnail.wmf", vec![0xD7, 0xCD, 0xC6, 0x9A])
        .build();

    let thumbs = thumbnails_from_bytes("meta.docx", data, &[Dimensions::new(64, 64)]).unwrap();
    assert_eq!(thumbs[0].dimensions(), (64, 64));
}

#[test]
fn test_corrupt_preview_fails() {
    let data = Fixture::new()
        .preview("docProps/thumbnail.jpeg", b"\xFF\xD8 truncated".to_vec())
        .build();

    let err = thumbnails_from_bytes("corrupt.docx", data, &[Dimensions::new(64, 64)]).unwrap_err();
    match err {
        Error::ThumbnailGenerationFailed {
            document,
            stage,
            source,
        } => {
            assert_eq!(document, "corrupt.docx");
            assert_eq!(stage, Stage::DecodePreview);
            assert!(matches!(source, Cause::Decode(_)));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_invalid_target() {
    let data = Fixture::new().build();
    let err = thumbnails_from_bytes("x.docx", data, &[Dimensions::new(64, 0)]).unwrap_err();
    assert!(matches!(err, Error::InvalidDimensions { width: 64, height: 0 }));
}

#[test]
fn test_zero_page_size() {
    let data = Fixture::new().page(0, 15840).build();
    let err = thumbnails_from_bytes("x.docx", data, &[Dimensions::new(64, 64)]).unwrap_err();
    assert!(matches!(err, Error::InvalidDimensions { width: 0, .. }));
}

#[test]
fn test_oversized_page_fails_at_rasterization() {
    // 200000 px square, and the largest page a u32 can declare
    for (width, height) in [(3_000_000, 3_000_000), (u32::MAX, u32::MAX)] {
        let data = Fixture::new().page(width, height).build();
        let err = thumbnails_from_bytes("huge.docx", data, &[Dimensions::new(64, 64)]).unwrap_err();
        assert_eq!(err.stage(), Some(Stage::RasterizeMarkup), "{err:?}");
    }
}

#[test]
fn test_extreme_aspect_preview() {
    let sliver = RgbaImage::from_pixel(1, 20_000, Rgba([30, 30, 200, 255]));
    let data = Fixture::new()
        .preview("docProps/thumbnail.png", png(&sliver))
        .build();

    let thumbs = thumbnails_from_bytes("sliver.docx", data, &[Dimensions::new(400, 400)]).unwrap();
    assert_eq!(thumbs[0].dimensions(), (400, 400));
}

#[test]
fn test_damaged_relationships_part_is_reported() {
    let mut data = Fixture::new()
        .preview("docProps/thumbnail.png", png(&RgbaImage::new(4, 4)))
        .build();
    // Break the local header of the package relationships entry
    let offset = data
        .windows(4)
        .enumerate()
        .find(|&(i, w)| {
            w == b"PK\x03\x04"
                && data
                    .get(i + 30..)
                    .is_some_and(|rest| rest.starts_with(b"_rels/.rels"))
        })
        .map(|(i, _)| i)
        .unwrap();
    data[offset..offset + 4].copy_from_slice(b"XXXX");

    let err = thumbnails_from_bytes("damaged.docx", data, &[Dimensions::new(64, 64)]).unwrap_err();
    assert!(matches!(
        err,
        Error::ThumbnailGenerationFailed {
            stage: Stage::OpenDocument,
            source: Cause::Document(_),
            ..
        }
    ));
}

#[test]
fn test_empty_targets() {
    let data = Fixture::new().build();
    assert!(thumbnails_from_bytes("x.docx", data, &[]).unwrap().is_empty());
}

#[test]
fn test_file_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("memo.docx");
    std::fs::write(&path, Fixture::new().page(12240, 15840).paragraphs(3).build()).unwrap();

    let thumbs = thumbnails_from_path(&path, &[Dimensions::new(96, 96)]).unwrap();
    assert_eq!(thumbs[0].dimensions(), (96, 96));

    let doc = DocxDocument::open(&path).unwrap();
    assert!(doc.identifier().ends_with("memo.docx"));
}

#[test]
fn test_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gone.docx");

    let err = thumbnails_from_path(&path, &[Dimensions::new(96, 96)]).unwrap_err();
    match err {
        Error::SourceUnavailable { document, source } => {
            assert!(document.ends_with("gone.docx"));
            assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_reader_entry_point() {
    let data = Fixture::new().page(12240, 15840).title("Memo").build();
    let thumbs = thumbnails_from_reader("reader.docx", Cursor::new(data), &[Dimensions::new(40, 40)])
        .unwrap();
    assert_eq!(thumbs[0].dimensions(), (40, 40));
}

#[test]
fn test_repeated_calls_are_identical() {
    let data = Fixture::new().page(12240, 15840).paragraphs(10).build();
    let doc = DocxDocument::from_bytes("same.docx", data).unwrap();
    let resolver = docthumb::ThumbnailResolver::new();
    let targets = [Dimensions::new(80, 100)];

    assert_eq!(
        resolver.resolve(&doc, &targets).unwrap(),
        resolver.resolve(&doc, &targets).unwrap()
    );
}

#[test]
fn test_markup_carries_title_and_structure() {
    let data = Fixture::new().page(12240, 15840).title("Board Minutes").build();
    let doc = DocxDocument::from_bytes("minutes.docx", data).unwrap();
    let markup = String::from_utf8(doc.render_markup().unwrap()).unwrap();

    assert!(markup.contains("<title>Board Minutes</title>"));
    assert!(markup.contains("<h1>Quarterly Report</h1>"));
}

#[cfg(feature = "async")]
#[tokio::test]
async fn test_async_entry_point() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("async.docx");
    std::fs::write(&path, Fixture::new().page(12240, 15840).build()).unwrap();

    let thumbs = docthumb::thumbnails_from_path_async(&path, &[Dimensions::new(48, 48)])
        .await
        .unwrap();
    assert_eq!(thumbs[0].dimensions(), (48, 48));

    let err = docthumb::thumbnails_from_path_async(dir.path().join("nope.docx"), &[Dimensions::new(48, 48)])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::SourceUnavailable { .. }));
}
