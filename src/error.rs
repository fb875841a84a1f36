use std::path::PathBuf;

use thiserror::Error;

use crate::billing::table::Column;

/// Failure of a single measurement code of a single site.
///
/// Not fatal on its own: the dependent fields of the site's records become undefined.
#[derive(Clone, Debug, Error)]
#[error("source unavailable for `{pod}` / `{code}`: {reason}")]
pub struct SourceUnavailable {
    pub pod: String,
    pub code: String,
    pub reason: String,
}

/// Per-site failure kinds. None of them aborts processing of the other sites.
#[derive(Debug, Error)]
pub enum SiteError {
    /// Every measurement code of the site failed to fetch.
    #[error(transparent)]
    SourceUnavailable(#[from] SourceUnavailable),

    /// The sources answered, but there is not a single reading in the period.
    #[error("no readings for `{pod}` in the requested period")]
    NoReadings { pod: String },

    /// An aggregation rule refers to a column the rows do not have.
    #[error("missing column `{0:?}`")]
    MissingColumn(Column),

    #[error("failed to write `{path}`")]
    OutputWriteFailure {
        path: PathBuf,

        #[source]
        source: anyhow::Error,
    },
}

impl SiteError {
    /// Short failure kind for the run summary.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::SourceUnavailable(_) => "SourceUnavailable",
            Self::NoReadings { .. } => "NoReadings",
            Self::MissingColumn(_) => "MissingColumn",
            Self::OutputWriteFailure { .. } => "OutputWriteFailure",
        }
    }

    pub fn output_write_failure(
        path: impl Into<PathBuf>,
        source: impl Into<anyhow::Error>,
    ) -> Self {
        Self::OutputWriteFailure { path: path.into(), source: source.into() }
    }
}
