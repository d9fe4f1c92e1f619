//! The stored stack configuration, grouped the way operators read it.

use crate::codec::{self, SkippedToken};
use crate::selection::SelectedApp;
use crate::submit::SubmissionPayload;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stackdeck_core::AppError;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRecord {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub archive_file: String,
}

/// One application type under a platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentRecord {
    pub name: String,
    pub applications: Vec<ApplicationRecord>,
}

/// The name is empty for communities without platforms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformRecord {
    pub name: String,
    pub components: Vec<ComponentRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StackRecord {
    pub community: String,
    pub created_at: DateTime<Utc>,
    pub platforms: Vec<PlatformRecord>,
}

impl StackRecord {
    /// Group the payload's tokens by platform then component, in the
    /// order they first appear. Unparseable tokens are returned aside.
    pub fn from_payload(payload: &SubmissionPayload) -> (Self, Vec<SkippedToken>) {
        let mut record = Self {
            community: payload.community.clone(),
            created_at: Utc::now(),
            platforms: Vec::new(),
        };
        let mut skipped = Vec::new();
        for token in &payload.selections {
            match codec::parse_token(token) {
                Ok(app) => record.push(app),
                Err(e) => skipped.push(SkippedToken {
                    token: token.clone(),
                    reason: e.to_string(),
                }),
            }
        }
        (record, skipped)
    }

    fn push(&mut self, app: SelectedApp) {
        let platform_name = app.platform.unwrap_or_default();
        let platform = match self.platforms.iter().position(|p| p.name == platform_name) {
            Some(i) => &mut self.platforms[i],
            None => {
                self.platforms.push(PlatformRecord {
                    name: platform_name,
                    components: Vec::new(),
                });
                let last = self.platforms.len() - 1;
                &mut self.platforms[last]
            }
        };
        let component = match platform.components.iter().position(|c| c.name == app.app_type) {
            Some(i) => &mut platform.components[i],
            None => {
                platform.components.push(ComponentRecord {
                    name: app.app_type,
                    applications: Vec::new(),
                });
                let last = platform.components.len() - 1;
                &mut platform.components[last]
            }
        };
        component.applications.push(ApplicationRecord {
            name: app.app,
            version: app.version,
            archive_file: app.archive,
        });
    }

    /// Flatten back to wire tokens, the input a wizard hydrates from.
    pub fn selections(&self) -> Vec<String> {
        self.apps().iter().map(codec::encode_app).collect()
    }

    pub fn apps(&self) -> Vec<SelectedApp> {
        let mut out = Vec::new();
        for platform in &self.platforms {
            for component in &platform.components {
                for app in &component.applications {
                    out.push(SelectedApp {
                        app: app.name.clone(),
                        platform: (!platform.name.is_empty()).then(|| platform.name.clone()),
                        app_type: component.name.clone(),
                        version: app.version.clone(),
                        archive: app.archive_file.clone(),
                    });
                }
            }
        }
        out
    }

    pub fn application_count(&self) -> usize {
        self.platforms
            .iter()
            .flat_map(|p| &p.components)
            .map(|c| c.applications.len())
            .sum()
    }

    pub fn save(&self, path: &Path) -> Result<(), AppError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        tracing::info!(
            path = %path.display(),
            community = %self.community,
            apps = self.application_count(),
            "stack record saved"
        );
        Ok(())
    }

    /// `None` when nothing was stored yet.
    pub fn load(path: &Path) -> Result<Option<Self>, AppError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        if content.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(&content)?))
    }
}
