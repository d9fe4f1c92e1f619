use crate::error::SubmitError;
use crate::record::StackRecord;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// What a finished wizard hands to a sink.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload {
    pub community: String,
    #[serde(default)]
    pub platforms: Vec<String>,
    #[serde(default)]
    pub app_types: Vec<String>,
    pub selections: Vec<String>,
}

impl SubmissionPayload {
    /// Repeated form pairs, one per value.
    pub fn form_fields(&self) -> Vec<(&'static str, String)> {
        let mut fields = vec![("community", self.community.clone())];
        fields.extend(self.platforms.iter().map(|p| ("platforms", p.clone())));
        fields.extend(self.app_types.iter().map(|t| ("appTypes", t.clone())));
        fields.extend(self.selections.iter().map(|s| ("selections", s.clone())));
        fields
    }

    /// Inverse of [`form_fields`](Self::form_fields). Unknown keys are
    /// ignored. A community and at least one selection are required.
    pub fn from_form_fields<K, V>(pairs: &[(K, V)]) -> Result<Self, SubmitError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut payload = Self::default();
        for (key, value) in pairs {
            let value = value.as_ref().trim();
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                "community" => payload.community = value.to_string(),
                "platforms" => payload.platforms.push(value.to_string()),
                "appTypes" => payload.app_types.push(value.to_string()),
                "selections" => payload.selections.push(value.to_string()),
                _ => {}
            }
        }
        if payload.community.is_empty() {
            return Err(SubmitError::Rejected("a community is required".into()));
        }
        if payload.selections.is_empty() {
            return Err(SubmitError::Rejected("at least one application must be selected".into()));
        }
        Ok(payload)
    }
}

#[async_trait]
pub trait SubmissionSink: Send + Sync {
    async fn submit(&self, payload: &SubmissionPayload) -> Result<(), SubmitError>;

    fn describe(&self) -> String;
}

/// Stores the submission as the local stack record.
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.core/stack.json`.
    pub fn default_location() -> Result<Self, SubmitError> {
        Ok(Self::new(stackdeck_core::config::stack_path()?))
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }
}

#[async_trait]
impl SubmissionSink for FileSink {
    async fn submit(&self, payload: &SubmissionPayload) -> Result<(), SubmitError> {
        let (record, skipped) = StackRecord::from_payload(payload);
        if !skipped.is_empty() {
            tracing::warn!(count = skipped.len(), "unparseable selections left out of the record");
        }
        record.save(&self.path)?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> SubmissionPayload {
        SubmissionPayload {
            community: "fr".into(),
            platforms: vec!["core".into()],
            app_types: vec!["ihm".into(), "flux".into()],
            selections: vec!["core|ihm|plf|1.0.0:".into(), "core|flux|core-xchg|2.0:".into()],
        }
    }

    #[test]
    fn form_fields_repeat_each_value() {
        let fields = payload().form_fields();
        let keys: Vec<_> = fields.iter().map(|(k, _)| *k).collect();
        assert_eq!(
            keys,
            ["community", "platforms", "appTypes", "appTypes", "selections", "selections"]
        );
        assert_eq!(
            SubmissionPayload::from_form_fields(&fields).expect("parse"),
            payload()
        );
    }

    #[test]
    fn form_without_selections_is_rejected() {
        let fields = [("community", "be"), ("selections", "  ")];
        assert!(matches!(
            SubmissionPayload::from_form_fields(&fields),
            Err(SubmitError::Rejected(_))
        ));
    }

    #[test]
    fn payload_json_uses_camel_case() {
        let json = serde_json::to_value(payload()).expect("json");
        assert!(json.get("appTypes").is_some());
    }

    #[tokio::test]
    async fn file_sink_writes_the_stack_record() {
        let dir = tempfile::tempdir().expect("tempdir");
        let sink = FileSink::new(dir.path().join("nested").join("stack.json"));
        sink.submit(&payload()).await.expect("submit");

        let record = StackRecord::load(sink.path())
            .expect("load")
            .expect("record present");
        assert_eq!(record.community, "fr");
        assert_eq!(record.selections(), payload().selections);
    }
}
