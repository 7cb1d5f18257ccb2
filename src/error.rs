use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReleveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[cfg(feature = "xlsx")]
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    #[error("Sheet '{sheet}' should have {expected} columns, found {found}. Check the file layout.")]
    Layout {
        sheet: String,
        expected: String,
        found: usize,
    },

    #[error("Sheet '{0}' has no data rows")]
    EmptySheet(String),

    #[error("Missing {0}")]
    MissingSheet(String),

    #[error("Unsupported file: {0}")]
    UnsupportedFile(String),

    #[error("Settings error: {0}")]
    Settings(String),
}

pub type Result<T> = std::result::Result<T, ReleveError>;
