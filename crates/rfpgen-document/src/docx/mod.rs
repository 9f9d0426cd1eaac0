//! Minimal WordprocessingML support: the zip package and a tag scanner over
//! `word/document.xml`. Only body-level paragraphs and tables are modelled;
//! every other element is carried through byte-for-byte.

pub mod package;
pub mod xml;

pub use package::DocxPackage;
pub use xml::{BlockKind, BlockSpan};

/// Path of the main document part inside the package.
pub const DOCUMENT_PART: &str = "word/document.xml";
