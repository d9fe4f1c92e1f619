use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    #[error("catalog has no communities")]
    Empty,

    #[error("malformed catalog at '{path}': {message}")]
    Malformed { path: String, message: String },

    #[error("duplicate identifier '{id}' under '{parent}'")]
    Duplicate { parent: String, id: String },

    #[error("invalid identifier '{0}': must be non-empty and free of '|', ':' and newlines")]
    InvalidId(String),

    #[error("community '{0}' offers no application")]
    Unreachable(String),
}

/// A step cannot be left because required input is missing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("select a community")]
    MissingCommunity,

    #[error("select at least one platform")]
    MissingPlatform,

    #[error("select at least one application type")]
    MissingAppType,

    #[error("select at least one application")]
    NoApplications,

    #[error("enter a version for {0}")]
    MissingVersion(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("expected 4 '|'-separated fields, found {0}")]
    FieldCount(usize),

    #[error("empty {0} field")]
    EmptyField(&'static str),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WizardError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("unknown community '{0}'")]
    UnknownCommunity(String),

    #[error("'{0}' is not offered by the current selection")]
    NotOffered(String),

    #[error("only one {0} can be selected")]
    SingleChoice(&'static str),

    #[error("application '{0}' is not selected")]
    AppNotSelected(String),

    #[error("unknown tree node {0}")]
    UnknownNode(usize),

    #[error("{field} cannot contain {forbidden}")]
    InvalidValue {
        field: &'static str,
        forbidden: &'static str,
    },

    #[error("already on the last step")]
    NoNextStep,

    #[error("submission is only possible from the summary step")]
    NotOnSummary,

    #[error("a submission is in progress")]
    SubmissionInProgress,

    #[error("the wizard has already been submitted")]
    AlreadySubmitted,
}

#[derive(Error, Debug)]
pub enum SubmitError {
    #[error("submission rejected: {0}")]
    Rejected(String),

    #[error("submission failed: {0}")]
    Transport(String),

    #[error(transparent)]
    Store(#[from] stackdeck_core::AppError),
}
