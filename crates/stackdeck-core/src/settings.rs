//! Credential store backed by a `KEY=value` file (`~/.core/monitor.conf`).

use crate::error::AppError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

const GIT_LOGIN: &str = "GIT_LOGIN";
const GIT_PASSWORD: &str = "GIT_PASSWORD";
const HARBOR_LOGIN: &str = "HARBOR_LOGIN";
const HARBOR_PASSWORD: &str = "HARBOR_PASSWORD";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub git_login: String,
    #[serde(default)]
    pub git_password: String,
    #[serde(default)]
    pub harbor_login: String,
    #[serde(default)]
    pub harbor_password: String,
}

impl Settings {
    /// True when the file exists and holds anything besides whitespace.
    pub fn is_configured(path: &Path) -> bool {
        std::fs::read_to_string(path)
            .map(|content| !content.trim().is_empty())
            .unwrap_or(false)
    }

    /// Load settings; a missing or blank file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        if !Self::is_configured(path) {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let mut entries = parse_properties(&content);
        let mut take = |key: &str| entries.remove(key).unwrap_or_default();
        Ok(Self {
            git_login: take(GIT_LOGIN),
            git_password: take(GIT_PASSWORD),
            harbor_login: take(HARBOR_LOGIN),
            harbor_password: take(HARBOR_PASSWORD),
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), AppError> {
        for value in [
            &self.git_login,
            &self.git_password,
            &self.harbor_login,
            &self.harbor_password,
        ] {
            if value.contains('\n') {
                return Err(AppError::Config("credential values cannot span lines".into()));
            }
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = format!(
            "{GIT_LOGIN}={}\n{GIT_PASSWORD}={}\n{HARBOR_LOGIN}={}\n{HARBOR_PASSWORD}={}\n",
            self.git_login, self.git_password, self.harbor_login, self.harbor_password
        );
        std::fs::write(path, content)?;
        tracing::info!(path = %path.display(), "credentials saved");
        Ok(())
    }
}

/// Split each line on the first `=`; lines without one are ignored.
fn parse_properties(content: &str) -> HashMap<String, String> {
    content
        .lines()
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> Settings {
        Settings {
            git_login: "ops".into(),
            git_password: "s3cr=t".into(),
            harbor_login: "robot$ci".into(),
            harbor_password: "hunter2".into(),
        }
    }

    #[test]
    fn missing_file_is_not_configured_and_loads_defaults() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("monitor.conf");
        assert!(!Settings::is_configured(&path));
        assert_eq!(Settings::load(&path).expect("load"), Settings::default());
    }

    #[test]
    fn whitespace_only_file_is_not_configured() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("monitor.conf");
        std::fs::write(&path, "  \n\n").expect("write");
        assert!(!Settings::is_configured(&path));
    }

    #[test]
    fn save_creates_parent_and_load_reads_values_back() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join(".core").join("monitor.conf");
        sample().save(&path).expect("save");

        assert!(Settings::is_configured(&path));
        assert_eq!(Settings::load(&path).expect("load"), sample());
        let raw = std::fs::read_to_string(&path).expect("read");
        assert!(raw.starts_with("GIT_LOGIN=ops\n"));
    }

    #[test]
    fn values_keep_everything_after_the_first_equals_sign() {
        let parsed = parse_properties("GIT_PASSWORD = a=b=c \nnot a pair\n");
        assert_eq!(parsed.get("GIT_PASSWORD").map(String::as_str), Some("a=b=c"));
        assert_eq!(parsed.len(), 1);
    }

    #[test]
    fn multiline_values_are_rejected() {
        let dir = tempdir().expect("tempdir");
        let mut settings = sample();
        settings.git_login = "a\nHARBOR_LOGIN=x".into();
        let err = settings
            .save(&dir.path().join("monitor.conf"))
            .expect_err("reject");
        assert!(matches!(err, AppError::Config(_)));
    }
}
