//! Text extraction from uploaded RFPs and DOCX proposal assembly.

pub mod assemble;
pub mod docx;
pub mod error;
pub mod extract;
#[cfg(any(test, feature = "test-util"))]
pub mod fixture;
pub mod loader;
pub mod markup;
pub mod read;
pub mod render;

pub use assemble::{Binding, DocumentAssembler};
pub use error::DocumentError;
pub use extract::{SourceDocument, SourceFormat, extract_text};
pub use loader::{DEFAULT_MAX_FILE_SIZE, Document, DocumentLoader, DocumentMetadata, FileLoader};
pub use markup::{Block, Table};
pub use read::{DocBlock, ProposalDocument};
pub use render::StyleSheet;
