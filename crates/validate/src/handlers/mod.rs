//! The standard handler set, one module per supported file kind.

mod archive;
mod image;
mod pdf;
mod pstex;
mod xml;

pub use self::archive::ArchiveHandler;
pub use self::image::ImageHandler;
pub use self::pdf::PdfHandler;
pub use self::pstex::PsTexHandler;
pub use self::xml::XmlHandler;
