use crate::catalog::Origin;
use serde::{Deserialize, Serialize};

/// An application picked in the applications step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedApp {
    pub app: String,
    pub platform: Option<String>,
    pub app_type: String,
    pub version: String,
    #[serde(default)]
    pub archive: String,
}

impl SelectedApp {
    pub fn new(origin: &Origin, app: &str) -> Self {
        Self {
            app: app.to_string(),
            platform: origin.platform.clone(),
            app_type: origin.app_type.clone(),
            version: String::new(),
            archive: String::new(),
        }
    }

    pub fn origin(&self) -> Origin {
        Origin::new(self.platform.as_deref(), &self.app_type)
    }

    pub fn is_at(&self, origin: &Origin, app: &str) -> bool {
        self.app == app && self.platform == origin.platform && self.app_type == origin.app_type
    }
}

/// Everything chosen so far in one wizard session.
///
/// Platform and app-type lists behave as ordered sets. Setters clear the
/// levels below the one that changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub community: Option<String>,
    pub platforms: Vec<String>,
    pub app_types: Vec<String>,
    pub apps: Vec<SelectedApp>,
}

impl Selection {
    /// Returns true when the community actually changed (and everything
    /// below it was cleared).
    pub fn set_community(&mut self, community: &str) -> bool {
        if self.community.as_deref() == Some(community) {
            return false;
        }
        self.community = Some(community.to_string());
        self.platforms.clear();
        self.app_types.clear();
        self.apps.clear();
        true
    }

    /// Returns true when the platform set changed; app-types and apps are
    /// then cleared in full.
    pub fn set_platforms(&mut self, platforms: Vec<String>) -> bool {
        let platforms = dedup(platforms);
        if same_set(&self.platforms, &platforms) {
            self.platforms = platforms;
            return false;
        }
        self.platforms = platforms;
        self.app_types.clear();
        self.apps.clear();
        true
    }

    /// Replaces the app-type set. Apps whose type is no longer chosen are
    /// dropped; the others are kept.
    pub fn set_app_types(&mut self, app_types: Vec<String>) -> bool {
        let app_types = dedup(app_types);
        let changed = !same_set(&self.app_types, &app_types);
        self.app_types = app_types;
        if changed {
            let kept = &self.app_types;
            self.apps.retain(|a| kept.contains(&a.app_type));
        }
        changed
    }

    pub fn find_app(&self, origin: &Origin, app: &str) -> Option<&SelectedApp> {
        self.apps.iter().find(|a| a.is_at(origin, app))
    }

    pub fn is_complete(&self) -> bool {
        !self.apps.is_empty() && self.apps.iter().all(|a| !a.version.trim().is_empty())
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

fn dedup(values: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for value in values {
        if !out.contains(&value) {
            out.push(value);
        }
    }
    out
}

fn same_set(a: &[String], b: &[String]) -> bool {
    a.len() == b.len() && a.iter().all(|v| b.contains(v))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn populated() -> Selection {
        let mut selection = Selection::default();
        selection.set_community("fr");
        selection.set_platforms(vec!["core".into()]);
        selection.set_app_types(vec!["ihm".into(), "flux".into()]);
        selection.apps.push(SelectedApp::new(&Origin::new(Some("core"), "ihm"), "plf"));
        selection.apps.push(SelectedApp::new(&Origin::new(Some("core"), "flux"), "core-xchg"));
        selection
    }

    #[test]
    fn changing_community_clears_every_level() {
        let mut selection = populated();
        assert!(selection.set_community("be"));
        assert!(selection.platforms.is_empty());
        assert!(selection.app_types.is_empty());
        assert!(selection.apps.is_empty());
    }

    #[test]
    fn reselecting_the_same_community_keeps_choices() {
        let mut selection = populated();
        assert!(!selection.set_community("fr"));
        assert_eq!(selection.apps.len(), 2);
    }

    #[test]
    fn changing_platforms_clears_types_and_apps() {
        let mut selection = populated();
        assert!(selection.set_platforms(vec!["core".into(), "acore".into()]));
        assert!(selection.app_types.is_empty());
        assert!(selection.apps.is_empty());
    }

    #[test]
    fn platform_order_alone_is_not_a_change() {
        let mut selection = populated();
        selection.set_platforms(vec!["core".into(), "acore".into()]);
        selection.set_app_types(vec!["ihm".into()]);
        assert!(!selection.set_platforms(vec!["acore".into(), "core".into(), "core".into()]));
        assert_eq!(selection.platforms, ["acore", "core"]);
        assert_eq!(selection.app_types, ["ihm"]);
    }

    #[test]
    fn narrowing_app_types_keeps_compatible_apps() {
        let mut selection = populated();
        assert!(selection.set_app_types(vec!["flux".into()]));
        assert_eq!(selection.apps.len(), 1);
        assert_eq!(selection.apps[0].app, "core-xchg");
    }

    #[test]
    fn completeness_requires_a_version_everywhere() {
        let mut selection = populated();
        assert!(!selection.is_complete());
        selection.apps[0].version = "1.0.0".into();
        assert!(!selection.is_complete());
        selection.apps[1].version = "2.0".into();
        assert!(selection.is_complete());
    }
}
