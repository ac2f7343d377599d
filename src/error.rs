use thiserror::Error;

/// Errors raised while reading card content and fonts.
#[derive(Debug, Error)]
pub enum CardError {
    #[error("invalid page book XML: {0}")]
    PageXml(#[from] roxmltree::Error),
    #[error("page book root must be <card>, found <{0}>")]
    UnexpectedRoot(String),
    #[error("page book contains no pages")]
    EmptyBook,
    #[error("page {page} has {count} lines, expected 1 or 2")]
    LineCount { page: usize, count: usize },
    #[error("page {page} contains an empty line")]
    EmptyLine { page: usize },
    #[error("invalid font JSON: {0}")]
    FontJson(#[from] serde_json::Error),
    #[error("font resolution must be positive, got {0}")]
    FontResolution(f32),
    #[error("glyph {glyph:?} has a malformed outline: {message}")]
    Outline { glyph: char, message: String },
}
