//! One operator's pass through the wizard.
//!
//! The session owns its selection, checkbox tree and step controller and
//! is mutated only through its methods (or [`WizardAction`]s), each of
//! which re-derives what the levels below may still hold.

use crate::catalog::{Catalog, Origin};
use crate::codec::{self, SkippedToken};
use crate::error::WizardError;
use crate::resolver::{prune, resolve_visible};
use crate::selection::Selection;
use crate::steps::{self, Step, StepController, StepStatus};
use crate::submit::SubmissionPayload;
use crate::tree::{CheckboxTree, Node, NodeId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// How many platforms / app-types may be chosen.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectMode {
    Single,
    #[default]
    Multi,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Editing,
    Submitting,
    Submitted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum WizardAction {
    SelectCommunity {
        community: String,
    },
    TogglePlatform {
        platform: String,
    },
    SetPlatforms {
        platforms: Vec<String>,
    },
    ToggleAppType {
        app_type: String,
    },
    SetAppTypes {
        app_types: Vec<String>,
    },
    SetApp {
        #[serde(default)]
        platform: Option<String>,
        app_type: String,
        app: String,
        checked: bool,
    },
    SetNode {
        node: NodeId,
        checked: bool,
    },
    SetVersion {
        #[serde(default)]
        platform: Option<String>,
        app_type: String,
        app: String,
        version: String,
    },
    SetArchive {
        #[serde(default)]
        platform: Option<String>,
        app_type: String,
        app: String,
        archive: String,
    },
    Next,
    Previous,
    Reset,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryApp {
    pub name: String,
    pub platform: Option<String>,
    pub app_type: String,
    pub version: String,
    pub archive: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub community: String,
    pub platforms: Vec<String>,
    pub app_types: Vec<String>,
    pub apps: Vec<SummaryApp>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressEntry {
    pub step: Step,
    pub number: usize,
    pub title: &'static str,
    pub status: StepStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionView {
    pub id: String,
    pub label: String,
    pub selected: bool,
}

/// Everything a renderer needs to draw the current step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WizardView {
    pub step: Step,
    pub phase: SessionPhase,
    pub mode: SelectMode,
    pub progress: Vec<ProgressEntry>,
    pub community: Option<String>,
    pub options: Vec<OptionView>,
    pub tree: Vec<Node>,
    pub summary: Option<Summary>,
    pub selections: Vec<String>,
    pub blocked_by: Option<String>,
    pub can_go_back: bool,
    pub can_submit: bool,
}

#[derive(Debug, Clone)]
pub struct WizardSession {
    catalog: Arc<Catalog>,
    mode: SelectMode,
    phase: SessionPhase,
    selection: Selection,
    tree: CheckboxTree,
    steps: StepController,
}

impl WizardSession {
    pub fn new(catalog: Arc<Catalog>, mode: SelectMode) -> Self {
        Self {
            catalog,
            mode,
            phase: SessionPhase::Editing,
            selection: Selection::default(),
            tree: CheckboxTree::new(""),
            steps: StepController::new(),
        }
    }

    /// Start from a previously stored token sequence. The session lands on
    /// the summary when the stored selection is still complete, otherwise
    /// on the first step needing input.
    pub fn hydrate<S: AsRef<str>>(
        catalog: Arc<Catalog>,
        mode: SelectMode,
        community: Option<&str>,
        tokens: &[S],
    ) -> (Self, Vec<SkippedToken>) {
        let decoded = codec::decode(&catalog, community, tokens);
        let mut skipped = decoded.skipped;
        let mut session = Self::new(catalog, mode);
        session.selection = decoded.selection;
        let stored = session.selection.apps.clone();
        if mode == SelectMode::Single {
            session.selection.platforms.truncate(1);
            session.selection.app_types.truncate(1);
        }
        session.rebuild_tree();

        for app in stored {
            if session.selection.find_app(&app.origin(), &app.app).is_some() {
                continue;
            }
            let reason = match &app.platform {
                Some(p) if !session.selection.platforms.contains(p) => format!(
                    "single-select keeps only platform '{}'",
                    session.selection.platforms.join("")
                ),
                _ => format!(
                    "single-select keeps only application type '{}'",
                    session.selection.app_types.join("")
                ),
            };
            tracing::warn!(app = %app.app, %reason, "stored selection dropped");
            skipped.push(SkippedToken {
                token: codec::encode_app(&app),
                reason,
            });
        }

        let step = session.steps.resume(&session.catalog, &session.selection);
        tracing::debug!(?step, apps = session.selection.apps.len(), "session hydrated");
        (session, skipped)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn tree(&self) -> &CheckboxTree {
        &self.tree
    }

    pub fn current_step(&self) -> Step {
        self.steps.current()
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn mode(&self) -> SelectMode {
        self.mode
    }

    fn ensure_editable(&self) -> Result<(), WizardError> {
        match self.phase {
            SessionPhase::Editing => Ok(()),
            SessionPhase::Submitting => Err(WizardError::SubmissionInProgress),
            SessionPhase::Submitted => Err(WizardError::AlreadySubmitted),
        }
    }

    pub fn select_community(&mut self, community: &str) -> Result<(), WizardError> {
        self.ensure_editable()?;
        if self.catalog.community(community).is_none() {
            return Err(WizardError::UnknownCommunity(community.to_string()));
        }
        if self.selection.set_community(community) {
            tracing::debug!(community, "community changed");
            self.steps.invalidate_from(Step::Platform, &self.catalog, &self.selection);
            self.rebuild_tree();
        }
        Ok(())
    }

    pub fn toggle_platform(&mut self, platform: &str) -> Result<(), WizardError> {
        let next = toggled(&self.selection.platforms, platform, self.mode);
        self.set_platforms(next)
    }

    pub fn set_platforms(&mut self, platforms: Vec<String>) -> Result<(), WizardError> {
        self.ensure_editable()?;
        if self.mode == SelectMode::Single && platforms.len() > 1 {
            return Err(WizardError::SingleChoice("platform"));
        }
        let visible = resolve_visible(&self.catalog, &self.selection);
        if let Some(unknown) = platforms.iter().find(|p| !visible.platforms.contains(p)) {
            return Err(WizardError::NotOffered(unknown.clone()));
        }
        if self.selection.set_platforms(platforms) {
            tracing::debug!(platforms = ?self.selection.platforms, "platforms changed");
            self.steps.invalidate_from(Step::AppType, &self.catalog, &self.selection);
            self.rebuild_tree();
        }
        Ok(())
    }

    pub fn toggle_app_type(&mut self, app_type: &str) -> Result<(), WizardError> {
        let next = toggled(&self.selection.app_types, app_type, self.mode);
        self.set_app_types(next)
    }

    pub fn set_app_types(&mut self, app_types: Vec<String>) -> Result<(), WizardError> {
        self.ensure_editable()?;
        if self.mode == SelectMode::Single && app_types.len() > 1 {
            return Err(WizardError::SingleChoice("application type"));
        }
        let visible = resolve_visible(&self.catalog, &self.selection);
        if let Some(unknown) = app_types.iter().find(|t| !visible.app_types.contains(t)) {
            return Err(WizardError::NotOffered(unknown.clone()));
        }
        if self.selection.set_app_types(app_types) {
            tracing::debug!(app_types = ?self.selection.app_types, "app types changed");
            self.steps.invalidate_from(Step::Applications, &self.catalog, &self.selection);
            self.rebuild_tree();
        }
        Ok(())
    }

    pub fn set_app_checked(&mut self, origin: &Origin, app: &str, checked: bool) -> Result<(), WizardError> {
        let leaf = self.leaf(origin, app)?;
        self.set_node_checked(leaf, checked)
    }

    pub fn set_node_checked(&mut self, node: NodeId, checked: bool) -> Result<(), WizardError> {
        self.ensure_editable()?;
        self.tree.set_checked(node, checked)?;
        self.after_app_change();
        Ok(())
    }

    pub fn set_version(&mut self, origin: &Origin, app: &str, version: &str) -> Result<(), WizardError> {
        self.ensure_editable()?;
        let version = version.trim();
        if version.contains([codec::FIELD_DELIMITER, codec::DETAIL_DELIMITER, '\n']) {
            return Err(WizardError::InvalidValue {
                field: "version",
                forbidden: "'|', ':' or line breaks",
            });
        }
        let leaf = self.leaf(origin, app)?;
        self.tree.set_version(leaf, version)?;
        self.after_app_change();
        Ok(())
    }

    pub fn set_archive(&mut self, origin: &Origin, app: &str, archive: &str) -> Result<(), WizardError> {
        self.ensure_editable()?;
        let archive = archive.trim();
        if archive.contains('\n') {
            return Err(WizardError::InvalidValue {
                field: "archive",
                forbidden: "line breaks",
            });
        }
        let leaf = self.leaf(origin, app)?;
        self.tree.set_archive(leaf, archive)?;
        self.after_app_change();
        Ok(())
    }

    /// Validate the current step, advance, and prepare the new step's
    /// options from the current selection.
    pub fn next(&mut self) -> Result<Step, WizardError> {
        self.ensure_editable()?;
        let step = self.steps.next(&self.catalog, &self.selection)?;
        self.prepare();
        Ok(step)
    }

    pub fn previous(&mut self) -> Result<Step, WizardError> {
        self.ensure_editable()?;
        Ok(self.steps.previous(&self.catalog, &self.selection))
    }

    /// Discard everything and start over. Not allowed mid-submission.
    pub fn reset(&mut self) -> Result<(), WizardError> {
        if self.phase == SessionPhase::Submitting {
            return Err(WizardError::SubmissionInProgress);
        }
        *self = Self::new(Arc::clone(&self.catalog), self.mode);
        Ok(())
    }

    pub fn apply(&mut self, action: WizardAction) -> Result<(), WizardError> {
        match action {
            WizardAction::SelectCommunity { community } => self.select_community(&community),
            WizardAction::TogglePlatform { platform } => self.toggle_platform(&platform),
            WizardAction::SetPlatforms { platforms } => self.set_platforms(platforms),
            WizardAction::ToggleAppType { app_type } => self.toggle_app_type(&app_type),
            WizardAction::SetAppTypes { app_types } => self.set_app_types(app_types),
            WizardAction::SetApp {
                platform,
                app_type,
                app,
                checked,
            } => self.set_app_checked(&Origin::new(platform.as_deref(), &app_type), &app, checked),
            WizardAction::SetNode { node, checked } => self.set_node_checked(node, checked),
            WizardAction::SetVersion {
                platform,
                app_type,
                app,
                version,
            } => self.set_version(&Origin::new(platform.as_deref(), &app_type), &app, &version),
            WizardAction::SetArchive {
                platform,
                app_type,
                app,
                archive,
            } => self.set_archive(&Origin::new(platform.as_deref(), &app_type), &app, &archive),
            WizardAction::Next => self.next().map(|_| ()),
            WizardAction::Previous => self.previous().map(|_| ()),
            WizardAction::Reset => self.reset(),
        }
    }

    /// Lock the session and hand out what should be submitted.
    pub fn begin_submit(&mut self) -> Result<SubmissionPayload, WizardError> {
        self.ensure_editable()?;
        if self.steps.current() != Step::Summary {
            return Err(WizardError::NotOnSummary);
        }
        for step in Step::ALL {
            steps::validate(step, &self.catalog, &self.selection)?;
        }
        self.phase = SessionPhase::Submitting;
        Ok(self.payload())
    }

    /// Unlock after the sink answered. A failure leaves the selection as
    /// it was so the operator can retry.
    pub fn finish_submit(&mut self, succeeded: bool) {
        if self.phase != SessionPhase::Submitting {
            return;
        }
        self.phase = if succeeded {
            tracing::info!(
                community = ?self.selection.community,
                apps = self.selection.apps.len(),
                "stack selection submitted"
            );
            SessionPhase::Submitted
        } else {
            tracing::warn!("stack submission failed; selection kept for retry");
            SessionPhase::Editing
        };
    }

    pub fn payload(&self) -> SubmissionPayload {
        SubmissionPayload {
            community: self.selection.community.clone().unwrap_or_default(),
            platforms: self.selection.platforms.clone(),
            app_types: self.selection.app_types.clone(),
            selections: codec::encode(&self.selection),
        }
    }

    pub fn summary(&self) -> Summary {
        Summary {
            community: self
                .selection
                .community
                .as_deref()
                .unwrap_or_default()
                .to_uppercase(),
            platforms: self.selection.platforms.iter().map(|p| p.to_uppercase()).collect(),
            app_types: self.selection.app_types.iter().map(|t| t.to_uppercase()).collect(),
            apps: self
                .selection
                .apps
                .iter()
                .map(|a| SummaryApp {
                    name: a.app.clone(),
                    platform: a.platform.clone(),
                    app_type: a.app_type.clone(),
                    version: a.version.clone(),
                    archive: (!a.archive.is_empty()).then(|| a.archive.clone()),
                })
                .collect(),
        }
    }

    pub fn view(&self) -> WizardView {
        let step = self.steps.current();
        let visible = resolve_visible(&self.catalog, &self.selection);
        let option = |id: &str, selected: bool| OptionView {
            id: id.to_string(),
            label: id.to_uppercase(),
            selected,
        };
        let options = match step {
            Step::Community => self
                .catalog
                .communities()
                .iter()
                .map(|c| option(&c.id, self.selection.community.as_deref() == Some(c.id.as_str())))
                .collect(),
            Step::Platform => visible
                .platforms
                .iter()
                .map(|p| option(p, self.selection.platforms.contains(p)))
                .collect(),
            Step::AppType => visible
                .app_types
                .iter()
                .map(|t| option(t, self.selection.app_types.contains(t)))
                .collect(),
            Step::Applications | Step::Summary => Vec::new(),
        };
        let on_summary = step == Step::Summary;

        WizardView {
            step,
            phase: self.phase,
            mode: self.mode,
            progress: self
                .steps
                .progress(&self.catalog, &self.selection)
                .into_iter()
                .map(|(step, status)| ProgressEntry {
                    step,
                    number: step.number(),
                    title: step.title(),
                    status,
                })
                .collect(),
            community: self.selection.community.clone(),
            options,
            tree: if step == Step::Applications {
                self.tree.nodes().to_vec()
            } else {
                Vec::new()
            },
            summary: on_summary.then(|| self.summary()),
            selections: if on_summary {
                codec::encode(&self.selection)
            } else {
                Vec::new()
            },
            blocked_by: steps::validate(step, &self.catalog, &self.selection)
                .err()
                .map(|e| e.to_string()),
            can_go_back: step != Step::Community && self.phase == SessionPhase::Editing,
            can_submit: on_summary && self.phase == SessionPhase::Editing,
        }
    }

    fn leaf(&self, origin: &Origin, app: &str) -> Result<NodeId, WizardError> {
        self.tree
            .leaf(origin, app)
            .ok_or_else(|| WizardError::NotOffered(app.to_string()))
    }

    fn after_app_change(&mut self) {
        self.selection.apps = self.tree.checked_apps();
        self.steps.invalidate_from(Step::Applications, &self.catalog, &self.selection);
    }

    /// Re-derive the options of the step just entered, keeping whatever
    /// earlier choices are still compatible.
    fn prepare(&mut self) {
        prune(&self.catalog, &mut self.selection);
        self.rebuild_tree();
    }

    fn rebuild_tree(&mut self) {
        self.tree = CheckboxTree::from_selection(&self.catalog, &self.selection);
        self.selection.apps = self.tree.checked_apps();
    }
}

fn toggled(current: &[String], value: &str, mode: SelectMode) -> Vec<String> {
    let present = current.iter().any(|v| v == value);
    match (mode, present) {
        (SelectMode::Single, true) => Vec::new(),
        (SelectMode::Single, false) => vec![value.to_string()],
        (SelectMode::Multi, true) => current.iter().filter(|v| *v != value).cloned().collect(),
        (SelectMode::Multi, false) => {
            let mut next = current.to_vec();
            next.push(value.to_string());
            next
        }
    }
}
