//! Thumbnail resolution pipeline.

use std::io::Read;

use crate::dimensions::Dimensions;
use crate::error::{DocumentError, Error, Result, Stage};
use crate::raster::{ImageCrateCodec, PageRasterizer};
use crate::scale::ImageScaler;
use crate::traits::{DocumentSource, EmbeddedPreview, ImageCodec, MarkupRenderer, RasterImage};

/// Produces thumbnails for a document at one or more target sizes.
///
/// An embedded preview is preferred when the document has one. Otherwise
/// the document content is rendered to markup and rasterized at the
/// document's page size, or at the first requested size when the document
/// declares none. In that case the render canvas takes the first listed
/// size's aspect, so later targets are cropped from a page shaped like the
/// first one (a known quirk).
///
/// The resolver holds no per-call state and may be shared across threads.
#[derive(Debug, Clone, Default)]
pub struct ThumbnailResolver<C = ImageCrateCodec, R = PageRasterizer> {
    codec: C,
    renderer: R,
    scaler: ImageScaler,
}

impl ThumbnailResolver {
    /// Create a resolver with the bundled codec and rasterizer.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<C: ImageCodec, R: MarkupRenderer> ThumbnailResolver<C, R> {
    /// Create a resolver with custom collaborators.
    pub fn with_collaborators(codec: C, renderer: R) -> Self {
        Self {
            codec,
            renderer,
            scaler: ImageScaler::default(),
        }
    }

    /// Replace the scaler.
    pub fn with_scaler(mut self, scaler: ImageScaler) -> Self {
        self.scaler = scaler;
        self
    }

    /// Codec used for embedded previews.
    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Renderer used when there is no embedded preview.
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Scaler applied to every target.
    pub fn scaler(&self) -> &ImageScaler {
        &self.scaler
    }

    /// Produce one thumbnail per target, in target order.
    ///
    /// Duplicate targets each get their own image. All targets are checked
    /// before the document is touched; an empty target list returns an
    /// empty vector without reading the document.
    pub fn resolve<D>(&self, document: &D, targets: &[Dimensions]) -> Result<Vec<RasterImage>>
    where
        D: DocumentSource + ?Sized,
    {
        for target in targets {
            target.validate()?;
        }
        let Some(&first) = targets.first() else {
            return Ok(Vec::new());
        };

        let source = self.source_image(document, first)?;

        targets
            .iter()
            .map(|target| self.scaler.scale(&source, *target))
            .collect()
    }

    /// Decode the embedded preview, or rasterize the content when there is
    /// none.
    fn source_image<D>(&self, document: &D, first: Dimensions) -> Result<RasterImage>
    where
        D: DocumentSource + ?Sized,
    {
        let id = document.identifier();

        let preview = document
            .embedded_preview()
            .map_err(|e| Error::generation(id, Stage::ReadPreview, e))?;

        if let EmbeddedPreview::Present(mut reader) = preview {
            let mut bytes = Vec::new();
            reader
                .read_to_end(&mut bytes)
                .map_err(|e| Error::generation(id, Stage::ReadPreview, DocumentError::Io(e)))?;
            drop(reader);
            return self
                .codec
                .decode(&bytes)
                .map_err(|e| Error::generation(id, Stage::DecodePreview, e));
        }

        let canvas = document
            .native_page_size()
            .map_err(|e| Error::generation(id, Stage::ReadPageSize, e))?
            .unwrap_or(first)
            .validate()?;
        let markup = document
            .render_markup()
            .map_err(|e| Error::generation(id, Stage::RenderMarkup, e))?;
        self.renderer
            .render(&markup, canvas)
            .map_err(|e| Error::generation(id, Stage::RasterizeMarkup, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Cause, DecodeError, RenderError};
    use image::Rgba;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Document double that counts collaborator calls.
    #[derive(Default)]
    struct FakeDocument {
        preview: Option<Vec<u8>>,
        page: Option<Dimensions>,
        failing: Option<Stage>,
        /// The preview stream errors when read.
        broken_stream: bool,
        preview_calls: AtomicUsize,
        page_calls: AtomicUsize,
        markup_calls: AtomicUsize,
    }

    impl FakeDocument {
        fn with_preview(bytes: &[u8]) -> Self {
            Self {
                preview: Some(bytes.to_vec()),
                ..Default::default()
            }
        }

        fn with_page(page: Option<Dimensions>) -> Self {
            Self {
                page,
                ..Default::default()
            }
        }

        fn failing_at(stage: Stage) -> Self {
            Self {
                failing: Some(stage),
                ..Default::default()
            }
        }

        fn calls(&self) -> usize {
            self.preview_calls.load(Ordering::SeqCst)
                + self.page_calls.load(Ordering::SeqCst)
                + self.markup_calls.load(Ordering::SeqCst)
        }

        fn fail(&self, stage: Stage) -> std::result::Result<(), DocumentError> {
            if self.failing == Some(stage) {
                return Err(DocumentError::MissingComponent(format!("{:?}", stage)));
            }
            Ok(())
        }
    }

    struct BrokenReader;

    impl Read for BrokenReader {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            Err(std::io::Error::other("stream reset"))
        }
    }

    impl DocumentSource for FakeDocument {
        fn identifier(&self) -> &str {
            "fake.docx"
        }

        fn embedded_preview(&self) -> std::result::Result<EmbeddedPreview<'_>, DocumentError> {
            self.preview_calls.fetch_add(1, Ordering::SeqCst);
            self.fail(Stage::ReadPreview)?;
            if self.broken_stream {
                return Ok(EmbeddedPreview::Present(Box::new(BrokenReader)));
            }
            Ok(match &self.preview {
                Some(bytes) => EmbeddedPreview::Present(Box::new(Cursor::new(bytes.clone()))),
                None => EmbeddedPreview::Absent,
            })
        }

        fn native_page_size(&self) -> std::result::Result<Option<Dimensions>, DocumentError> {
            self.page_calls.fetch_add(1, Ordering::SeqCst);
            self.fail(Stage::ReadPageSize)?;
            Ok(self.page)
        }

        fn render_markup(&self) -> std::result::Result<Vec<u8>, DocumentError> {
            self.markup_calls.fetch_add(1, Ordering::SeqCst);
            self.fail(Stage::RenderMarkup)?;
            Ok(b"<p>fake</p>".to_vec())
        }
    }

    /// Decodes `[width, height]` into a solid image; anything else is corrupt.
    #[derive(Default)]
    struct FakeCodec {
        calls: AtomicUsize,
    }

    impl ImageCodec for FakeCodec {
        fn decode(&self, bytes: &[u8]) -> std::result::Result<RasterImage, DecodeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match bytes {
                [w, h] => Ok(RasterImage::from_pixel(
                    u32::from(*w),
                    u32::from(*h),
                    Rgba([0, 0, 255, 255]),
                )),
                _ => Err(DecodeError::Empty {
                    width: 0,
                    height: 0,
                }),
            }
        }
    }

    #[derive(Default)]
    struct FakeRenderer {
        canvases: Mutex<Vec<Dimensions>>,
        fail: bool,
    }

    impl FakeRenderer {
        fn canvases(&self) -> Vec<Dimensions> {
            self.canvases.lock().unwrap().clone()
        }
    }

    impl MarkupRenderer for FakeRenderer {
        fn render(
            &self,
            markup: &[u8],
            canvas: Dimensions,
        ) -> std::result::Result<RasterImage, RenderError> {
            assert_eq!(markup, b"<p>fake</p>");
            self.canvases.lock().unwrap().push(canvas);
            if self.fail {
                return Err(RenderError::Markup("unexpected end".into()));
            }
            Ok(RasterImage::from_pixel(
                canvas.width,
                canvas.height,
                Rgba([255, 255, 255, 255]),
            ))
        }
    }

    fn resolver() -> ThumbnailResolver<FakeCodec, FakeRenderer> {
        ThumbnailResolver::with_collaborators(FakeCodec::default(), FakeRenderer::default())
    }

    fn sizes(images: &[RasterImage]) -> Vec<(u32, u32)> {
        images.iter().map(|i| i.dimensions()).collect()
    }

    #[test]
    fn test_embedded_preview_is_decoded_once() {
        let resolver = resolver();
        let doc = FakeDocument::with_preview(&[64, 48]);
        let targets = [
            Dimensions::new(32, 32),
            Dimensions::new(16, 12),
            Dimensions::new(32, 32),
        ];

        let images = resolver.resolve(&doc, &targets).unwrap();
        assert_eq!(sizes(&images), vec![(32, 32), (16, 12), (32, 32)]);
        assert_eq!(images[0], images[2]);
        assert_eq!(resolver.codec().calls.load(Ordering::SeqCst), 1);
        assert!(resolver.renderer().canvases().is_empty());
        assert_eq!(doc.page_calls.load(Ordering::SeqCst), 0);
        assert_eq!(doc.markup_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_fallback_renders_at_page_size() {
        let resolver = resolver();
        let doc = FakeDocument::with_page(Some(Dimensions::new(816, 1056)));
        let targets = [Dimensions::new(100, 100), Dimensions::new(200, 150)];

        let images = resolver.resolve(&doc, &targets).unwrap();
        assert_eq!(sizes(&images), vec![(100, 100), (200, 150)]);
        assert_eq!(
            resolver.renderer().canvases(),
            vec![Dimensions::new(816, 1056)]
        );
        assert_eq!(resolver.codec().calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_fallback_uses_first_target_without_page_size() {
        let resolver = resolver();
        let doc = FakeDocument::with_page(None);
        let targets = [Dimensions::new(120, 90), Dimensions::new(30, 40)];

        let images = resolver.resolve(&doc, &targets).unwrap();
        assert_eq!(sizes(&images), vec![(120, 90), (30, 40)]);
        assert_eq!(resolver.renderer().canvases(), vec![Dimensions::new(120, 90)]);
    }

    #[test]
    fn test_empty_targets() {
        let resolver = resolver();
        let doc = FakeDocument::with_preview(&[4, 4]);
        assert!(resolver.resolve(&doc, &[]).unwrap().is_empty());
        assert_eq!(doc.calls(), 0);
    }

    #[test]
    fn test_invalid_target_fails_before_any_work() {
        let resolver = resolver();
        let doc = FakeDocument::with_preview(&[4, 4]);
        let targets = [Dimensions::new(10, 10), Dimensions::new(10, 0)];

        let err = resolver.resolve(&doc, &targets).unwrap_err();
        assert!(matches!(err, Error::InvalidDimensions { width: 10, height: 0 }));
        assert_eq!(doc.calls(), 0);
        assert_eq!(resolver.codec().calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_zero_page_size_is_rejected() {
        let resolver = resolver();
        let doc = FakeDocument::with_page(Some(Dimensions::new(0, 1056)));

        let err = resolver
            .resolve(&doc, &[Dimensions::new(10, 10)])
            .unwrap_err();
        assert!(matches!(err, Error::InvalidDimensions { width: 0, .. }));
        assert!(resolver.renderer().canvases().is_empty());
    }

    #[test]
    fn test_corrupt_preview() {
        let resolver = resolver();
        let doc = FakeDocument::with_preview(b"garbage");

        let err = resolver
            .resolve(&doc, &[Dimensions::new(10, 10)])
            .unwrap_err();
        match err {
            Error::ThumbnailGenerationFailed {
                document,
                stage,
                source,
            } => {
                assert_eq!(document, "fake.docx");
                assert_eq!(stage, Stage::DecodePreview);
                assert!(matches!(source, Cause::Decode(DecodeError::Empty { .. })));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_failure_stages() {
        for stage in [Stage::ReadPreview, Stage::ReadPageSize, Stage::RenderMarkup] {
            let doc = FakeDocument::failing_at(stage);
            let err = resolver()
                .resolve(&doc, &[Dimensions::new(10, 10)])
                .unwrap_err();
            assert_eq!(err.stage(), Some(stage));
        }

        let doc = FakeDocument {
            broken_stream: true,
            ..Default::default()
        };
        let err = resolver()
            .resolve(&doc, &[Dimensions::new(10, 10)])
            .unwrap_err();
        assert!(matches!(
            err,
            Error::ThumbnailGenerationFailed {
                stage: Stage::ReadPreview,
                source: Cause::Document(DocumentError::Io(_)),
                ..
            }
        ));
    }

    #[test]
    fn test_rasterize_failure() {
        let resolver = ThumbnailResolver::with_collaborators(
            FakeCodec::default(),
            FakeRenderer {
                fail: true,
                ..Default::default()
            },
        );
        let doc = FakeDocument::with_page(None);

        let err = resolver
            .resolve(&doc, &[Dimensions::new(10, 10)])
            .unwrap_err();
        assert_eq!(err.stage(), Some(Stage::RasterizeMarkup));
        assert!(matches!(
            err,
            Error::ThumbnailGenerationFailed {
                source: Cause::Render(RenderError::Markup(_)),
                ..
            }
        ));
    }

    #[test]
    fn test_repeated_calls_are_identical() {
        let resolver = resolver();
        let doc = FakeDocument::with_page(Some(Dimensions::new(300, 400)));
        let targets = [Dimensions::new(60, 80)];

        let first = resolver.resolve(&doc, &targets).unwrap();
        let second = resolver.resolve(&doc, &targets).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_shared_across_threads() {
        let resolver = resolver();
        let doc = FakeDocument::with_preview(&[40, 20]);

        std::thread::scope(|scope| {
            for size in 1..=4u32 {
                let (resolver, doc) = (&resolver, &doc);
                scope.spawn(move || {
                    let target = Dimensions::new(size * 5, size * 5);
                    let images = resolver.resolve(doc, &[target]).unwrap();
                    assert_eq!(images[0].dimensions(), (size * 5, size * 5));
                });
            }
        });
        assert_eq!(resolver.codec().calls.load(Ordering::SeqCst), 4);
    }
}
