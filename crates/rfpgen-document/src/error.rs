#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("file too large: {0} bytes")]
    FileTooLarge(u64),

    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("invalid DOCX archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("DOCX package has no {0}")]
    MissingPart(&'static str),

    #[error("malformed WordprocessingML: {0}")]
    Xml(String),
}
