use crate::variants::schema::{Category, VariantType};

/// Errors raised while loading and querying variants.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("no {variant_type} {category} variant file registered for case {case_id}")]
    MissingSourceFile {
        case_id: String,
        variant_type: VariantType,
        category: Category,
    },
    #[error("invalid region: {0}")]
    InvalidRegion(String),
    #[error("variant {0} is already loaded")]
    DuplicateIdentity(String),
    #[error("could not parse record at {locus}: {reason}")]
    RecordParseFailure { locus: String, reason: String },
    #[error("ingestion of case {case_id} failed, loaded variants were removed")]
    IngestionFailure {
        case_id: String,
        #[source]
        source: Box<Error>,
    },
    #[error("exactly one of case or institute must be given")]
    InvalidScope,
    #[error("storage error: {0}")]
    Store(#[from] crate::store::Error),
    #[error("catalog error: {0}")]
    Catalog(#[source] anyhow::Error),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Build a `RecordParseFailure` for the given locus.
    pub fn parse_failure<L: std::fmt::Display, R: std::fmt::Display>(locus: L, reason: R) -> Self {
        Error::RecordParseFailure {
            locus: locus.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Whether the error only affects the current record.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::DuplicateIdentity(_) | Error::RecordParseFailure { .. }
        )
    }
}
