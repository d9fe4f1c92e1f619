//! Stack composition wizard.
//!
//! A community picks which catalog subtree applies; the operator then
//! narrows it down to platforms, application types and finally the
//! applications to deploy, each with a version and an optional archive.
//! Everything here is synchronous and owned by one [`WizardSession`].

pub mod catalog;
pub mod codec;
pub mod error;
pub mod record;
pub mod resolver;
pub mod selection;
pub mod session;
pub mod steps;
pub mod submit;
pub mod tree;

pub use catalog::{Catalog, Community, Origin};
pub use codec::SkippedToken;
pub use error::{CatalogError, CodecError, SubmitError, ValidationError, WizardError};
pub use record::{ApplicationRecord, ComponentRecord, PlatformRecord, StackRecord};
pub use selection::{SelectedApp, Selection};
pub use session::{SelectMode, SessionPhase, Summary, SummaryApp, WizardAction, WizardSession, WizardView};
pub use steps::{Step, StepStatus};
pub use submit::{FileSink, SubmissionPayload, SubmissionSink};
pub use tree::{CheckState, CheckboxTree, NodeId};
