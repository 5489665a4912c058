#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("transport error: {0}")]
    Transport(String),

    /// An operation that needs session tokens was called before login.
    #[error("{operation}: login tokens are empty, login first")]
    NotAuthenticated { operation: &'static str },

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("report archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("report archive {0} contains no CSV file")]
    MissingCsv(String),

    #[error("report file name '{0}' cannot be used as a local file name")]
    InvalidFileName(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid date '{0}': expected YYYY-MM-DD or a day offset")]
    InvalidDate(String),

    #[error("day offset {0} is outside the supported calendar")]
    DateOutOfRange(i64),

    #[error("unknown report type '{0}'")]
    UnknownReportType(String),

    #[error("no app matching '{0}'")]
    UnknownApp(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
