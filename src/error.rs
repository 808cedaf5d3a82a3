//! Error types for the annotator.
//!
//! Only structural problems surface here. Malformed mapping files, pages
//! without a table and unreadable content streams degrade to documented
//! fallbacks instead of producing an error.

/// Result type alias for annotator operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can abort a merge run.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The PDF could not be loaded, traversed or saved
    #[error("PDF error: {0}")]
    Pdf(String),

    /// The PDF loaded but its structure is unusable (broken page tree etc.)
    #[error("Invalid PDF: {0}")]
    InvalidPdf(String),

    /// A page has no MediaBox anywhere in its page-tree ancestry
    #[error("Page {page} has no usable MediaBox")]
    MissingMediaBox {
        /// Zero-based page index
        page: usize,
    },

    /// Row sets and document pages are not index-aligned
    #[error("Page count mismatch: document has {pages} pages, extractor produced {row_sets} row sets")]
    PageCountMismatch {
        /// Number of pages in the document being annotated
        pages: usize,
        /// Number of row sets supplied for it
        row_sets: usize,
    },

    /// Annotation font could not be prepared
    #[error("Font error: {0}")]
    Font(String),

    /// CSV serialization error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        Error::Pdf(err.to_string())
    }
}
