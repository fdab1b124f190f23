//! Raster collaborators: preview decoding and page rasterization.
//!
//! [`ImageCrateCodec`] decodes embedded previews and [`PageRasterizer`]
//! draws XHTML markup as a greeked page when a document has none.
//!
//! # Example
//!
//! ```
//! use docthumb::raster::PageRasterizer;
//! use docthumb::{Dimensions, MarkupRenderer};
//!
//! let markup = b"<html><body><h1>Title</h1><p>Body text</p></body></html>";
//! let page = PageRasterizer::new().render(markup, Dimensions::new(204, 264))?;
//! assert_eq!(page.dimensions(), (204, 264));
//! # Ok::<(), docthumb::RenderError>(())
//! ```

mod codec;
mod layout;
mod options;
mod renderer;

pub use codec::ImageCrateCodec;
pub use options::RasterOptions;
pub use renderer::PageRasterizer;
