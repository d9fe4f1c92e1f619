//! Derives which options each level offers from the levels above it.

use crate::catalog::{Catalog, Origin};
use crate::selection::Selection;
use serde::Serialize;

/// Applications offered under one (platform, app-type) origin. The same
/// application name may appear in several groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppGroup {
    pub origin: Origin,
    pub apps: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Visible {
    pub platforms: Vec<String>,
    pub app_types: Vec<String>,
    pub apps: Vec<AppGroup>,
}

impl Visible {
    pub fn offers_app(&self, origin: &Origin, app: &str) -> bool {
        self.apps
            .iter()
            .any(|g| &g.origin == origin && g.apps.iter().any(|a| a == app))
    }
}

pub fn resolve_visible(catalog: &Catalog, selection: &Selection) -> Visible {
    let Some(community) = selection
        .community
        .as_deref()
        .and_then(|id| catalog.community(id))
    else {
        return Visible::default();
    };

    let platforms: Vec<String> = community
        .platform_ids()
        .into_iter()
        .map(str::to_string)
        .collect();

    // Sources of app-types: the chosen platforms, or the community itself.
    let sources: Vec<Option<&str>> = if community.is_flat() {
        vec![None]
    } else {
        platforms
            .iter()
            .filter(|p| selection.platforms.contains(p))
            .map(|p| Some(p.as_str()))
            .collect()
    };

    let mut app_types: Vec<String> = Vec::new();
    let mut apps = Vec::new();
    for source in sources {
        let Some(types) = community.app_types(source) else {
            continue;
        };
        for entry in types {
            if !app_types.contains(&entry.id) {
                app_types.push(entry.id.clone());
            }
            if selection.app_types.contains(&entry.id) {
                apps.push(AppGroup {
                    origin: Origin::new(source, &entry.id),
                    apps: entry.apps.clone(),
                });
            }
        }
    }

    Visible {
        platforms,
        app_types,
        apps,
    }
}

/// Counts of values removed by [`prune`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Pruned {
    pub community: bool,
    pub platforms: usize,
    pub app_types: usize,
    pub apps: usize,
}

impl Pruned {
    pub fn is_empty(&self) -> bool {
        !self.community && self.platforms == 0 && self.app_types == 0 && self.apps == 0
    }
}

/// Drop every choice the catalog no longer offers given the levels above.
///
/// Applied top-down so a removed platform also removes the app-types and
/// applications it alone was offering.
pub fn prune(catalog: &Catalog, selection: &mut Selection) -> Pruned {
    let mut pruned = Pruned::default();

    if let Some(id) = selection.community.as_deref() {
        if catalog.community(id).is_none() {
            pruned.community = true;
            pruned.platforms = selection.platforms.len();
            pruned.app_types = selection.app_types.len();
            pruned.apps = selection.apps.len();
            selection.clear();
            return pruned;
        }
    }

    let visible = resolve_visible(catalog, selection);
    let before = selection.platforms.len();
    selection.platforms.retain(|p| visible.platforms.contains(p));
    pruned.platforms = before - selection.platforms.len();

    let visible = resolve_visible(catalog, selection);
    let before = selection.app_types.len();
    selection.app_types.retain(|t| visible.app_types.contains(t));
    pruned.app_types = before - selection.app_types.len();

    let visible = resolve_visible(catalog, selection);
    let before = selection.apps.len();
    selection
        .apps
        .retain(|a| visible.offers_app(&a.origin(), &a.app));
    pruned.apps = before - selection.apps.len();

    if !pruned.is_empty() {
        tracing::debug!(?pruned, "dropped choices no longer offered");
    }
    pruned
}
