//! Linear step machine with per-step validation.

use crate::catalog::Catalog;
use crate::error::{ValidationError, WizardError};
use crate::selection::Selection;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Community,
    Platform,
    AppType,
    Applications,
    Summary,
}

impl Step {
    pub const ALL: [Step; 5] = [
        Step::Community,
        Step::Platform,
        Step::AppType,
        Step::Applications,
        Step::Summary,
    ];

    /// 1-based position shown in the progress indicator.
    pub fn number(self) -> usize {
        self as usize + 1
    }

    pub fn title(self) -> &'static str {
        match self {
            Step::Community => "Community",
            Step::Platform => "Platform",
            Step::AppType => "Application type",
            Step::Applications => "Applications",
            Step::Summary => "Summary",
        }
    }

    fn following(self) -> Option<Step> {
        Step::ALL.get(self as usize + 1).copied()
    }

    fn preceding(self) -> Option<Step> {
        (self as usize).checked_sub(1).map(|i| Step::ALL[i])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Active,
    Completed,
    NotApplicable,
}

/// Whether the selection's community skips the platform step.
pub fn skips_platform(catalog: &Catalog, selection: &Selection) -> bool {
    selection
        .community
        .as_deref()
        .and_then(|id| catalog.community(id))
        .is_some_and(|c| c.is_flat())
}

pub fn validate(step: Step, catalog: &Catalog, selection: &Selection) -> Result<(), ValidationError> {
    match step {
        Step::Community => {
            if selection.community.is_none() {
                return Err(ValidationError::MissingCommunity);
            }
        }
        Step::Platform => {
            if !skips_platform(catalog, selection) && selection.platforms.is_empty() {
                return Err(ValidationError::MissingPlatform);
            }
        }
        Step::AppType => {
            if selection.app_types.is_empty() {
                return Err(ValidationError::MissingAppType);
            }
        }
        Step::Applications => {
            if selection.apps.is_empty() {
                return Err(ValidationError::NoApplications);
            }
            if let Some(app) = selection.apps.iter().find(|a| a.version.trim().is_empty()) {
                return Err(ValidationError::MissingVersion(app.app.clone()));
            }
        }
        Step::Summary => {}
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepController {
    current: Step,
    completed: Vec<Step>,
}

impl Default for StepController {
    fn default() -> Self {
        Self::new()
    }
}

impl StepController {
    pub fn new() -> Self {
        Self {
            current: Step::Community,
            completed: Vec::new(),
        }
    }

    pub fn current(&self) -> Step {
        self.current
    }

    pub fn is_completed(&self, step: Step) -> bool {
        self.completed.contains(&step)
    }

    /// Validate the current step and move forward, jumping over the
    /// platform step for flat communities.
    pub fn next(&mut self, catalog: &Catalog, selection: &Selection) -> Result<Step, WizardError> {
        let following = self.current.following().ok_or(WizardError::NoNextStep)?;
        validate(self.current, catalog, selection)?;
        if !self.completed.contains(&self.current) {
            self.completed.push(self.current);
        }
        self.current = if following == Step::Platform && skips_platform(catalog, selection) {
            Step::AppType
        } else {
            following
        };
        tracing::debug!(step = ?self.current, "wizard advanced");
        Ok(self.current)
    }

    /// Move back one step. Nothing is cleared.
    pub fn previous(&mut self, catalog: &Catalog, selection: &Selection) -> Step {
        if let Some(preceding) = self.current.preceding() {
            self.current = if preceding == Step::Platform && skips_platform(catalog, selection) {
                Step::Community
            } else {
                preceding
            };
        }
        self.current
    }

    /// Forget completion of `step` and everything after it, after the
    /// data those steps validated was invalidated. A wizard already past
    /// `step` is moved back onto it (onto the app-type step when `step`
    /// is a platform step the community does not have).
    pub fn invalidate_from(&mut self, step: Step, catalog: &Catalog, selection: &Selection) {
        self.completed.retain(|s| *s < step);
        let target = if step == Step::Platform && skips_platform(catalog, selection) {
            Step::AppType
        } else {
            step
        };
        if self.current > target {
            tracing::debug!(from = ?self.current, to = ?target, "wizard rewound");
            self.current = target;
        }
    }

    /// Advance as far as the selection allows, stopping on the first step
    /// that does not validate or on the summary.
    pub fn resume(&mut self, catalog: &Catalog, selection: &Selection) -> Step {
        while self.current != Step::Summary && self.next(catalog, selection).is_ok() {}
        self.current
    }

    pub fn progress(&self, catalog: &Catalog, selection: &Selection) -> Vec<(Step, StepStatus)> {
        let skip = skips_platform(catalog, selection);
        Step::ALL
            .iter()
            .map(|&step| {
                let status = if step == Step::Platform && skip {
                    StepStatus::NotApplicable
                } else if step == self.current {
                    StepStatus::Active
                } else if self.completed.contains(&step) {
                    StepStatus::Completed
                } else {
                    StepStatus::Pending
                };
                (step, status)
            })
            .collect()
    }
}
