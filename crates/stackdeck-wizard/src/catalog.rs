//! Static catalog of what can be deployed, per community.
//!
//! A community is either *flat* (app-type → applications) or *nested*
//! (platform → app-type → applications). The catalog is read-only once
//! loaded; sessions share it behind an `Arc`.

use crate::error::CatalogError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Where an application is offered: an app-type, under a platform for
/// nested communities.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Origin {
    pub platform: Option<String>,
    pub app_type: String,
}

impl Origin {
    pub fn new(platform: Option<&str>, app_type: &str) -> Self {
        Self {
            platform: platform.map(str::to_string),
            app_type: app_type.to_string(),
        }
    }

    /// Platform as it appears on the wire: empty for flat communities.
    pub fn platform_str(&self) -> &str {
        self.platform.as_deref().unwrap_or("")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppTypeEntry {
    pub id: String,
    pub apps: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Platform {
    pub id: String,
    pub app_types: Vec<AppTypeEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layout {
    Flat(Vec<AppTypeEntry>),
    Nested(Vec<Platform>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Community {
    pub id: String,
    pub layout: Layout,
}

impl Community {
    pub fn is_flat(&self) -> bool {
        matches!(self.layout, Layout::Flat(_))
    }

    /// Platform ids in catalog order; empty for flat communities.
    pub fn platform_ids(&self) -> Vec<&str> {
        match &self.layout {
            Layout::Flat(_) => Vec::new(),
            Layout::Nested(platforms) => platforms.iter().map(|p| p.id.as_str()).collect(),
        }
    }

    /// App-types offered by `platform`, or by the community itself when flat.
    pub fn app_types(&self, platform: Option<&str>) -> Option<&[AppTypeEntry]> {
        match (&self.layout, platform) {
            (Layout::Flat(types), None) => Some(types),
            (Layout::Nested(platforms), Some(id)) => platforms
                .iter()
                .find(|p| p.id == id)
                .map(|p| p.app_types.as_slice()),
            _ => None,
        }
    }

    pub fn apps(&self, origin: &Origin) -> Option<&[String]> {
        self.app_types(origin.platform.as_deref())?
            .iter()
            .find(|t| t.id == origin.app_type)
            .map(|t| t.apps.as_slice())
    }

    pub fn offers(&self, origin: &Origin, app: &str) -> bool {
        self.apps(origin)
            .is_some_and(|apps| apps.iter().any(|a| a == app))
    }

    /// Every (origin, applications) pair of the community, in catalog order.
    pub fn groups(&self) -> Vec<(Origin, &[String])> {
        match &self.layout {
            Layout::Flat(types) => types
                .iter()
                .map(|t| (Origin::new(None, &t.id), t.apps.as_slice()))
                .collect(),
            Layout::Nested(platforms) => platforms
                .iter()
                .flat_map(|p| {
                    p.app_types
                        .iter()
                        .map(move |t| (Origin::new(Some(&p.id), &t.id), t.apps.as_slice()))
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    communities: Vec<Community>,
}

impl Catalog {
    /// The menu shipped with the dashboard.
    pub fn builtin() -> Self {
        let ihm = |apps: &[&str]| AppTypeEntry {
            id: "ihm".into(),
            apps: apps.iter().map(|a| a.to_string()).collect(),
        };
        let flux = |apps: &[&str]| AppTypeEntry {
            id: "flux".into(),
            apps: apps.iter().map(|a| a.to_string()).collect(),
        };
        let core_ihm = ["webapp-plf", "webapp-plbinf", "plf", "webservice-a2a"];

        Self {
            communities: vec![
                Community {
                    id: "fr".into(),
                    layout: Layout::Nested(vec![
                        Platform {
                            id: "core".into(),
                            app_types: vec![ihm(&core_ihm), flux(&["core-xchg"])],
                        },
                        Platform {
                            id: "acore".into(),
                            app_types: vec![ihm(&["pilad"]), flux(&["acore"])],
                        },
                    ]),
                },
                Community {
                    id: "be".into(),
                    layout: Layout::Flat(vec![ihm(&core_ihm), flux(&["core-xchg"])]),
                },
            ],
        }
    }

    /// Build and validate a catalog from already-parsed communities.
    pub fn new(communities: Vec<Community>) -> Result<Self, CatalogError> {
        let catalog = Self { communities };
        catalog.validate()?;
        Ok(catalog)
    }

    /// Parse the nested JSON mapping form; document key order is kept.
    pub fn from_json(text: &str) -> Result<Self, CatalogError> {
        let value: Value = serde_json::from_str(text).map_err(|e| CatalogError::Malformed {
            path: "$".into(),
            message: e.to_string(),
        })?;
        let root = as_object(&value, "$")?;
        let mut communities = Vec::with_capacity(root.len());
        for (id, body) in root {
            let path = format!("$.{id}");
            let entries = as_object(body, &path)?;
            let layout = if !entries.is_empty() && entries.values().all(Value::is_array) {
                Layout::Flat(parse_app_types(entries, &path)?)
            } else if !entries.is_empty() && entries.values().all(Value::is_object) {
                let mut platforms = Vec::with_capacity(entries.len());
                for (platform_id, types) in entries {
                    let platform_path = format!("{path}.{platform_id}");
                    platforms.push(Platform {
                        id: platform_id.clone(),
                        app_types: parse_app_types(as_object(types, &platform_path)?, &platform_path)?,
                    });
                }
                Layout::Nested(platforms)
            } else {
                return Err(CatalogError::Malformed {
                    path,
                    message: "expected either app-type lists or platform objects".into(),
                });
            };
            communities.push(Community {
                id: id.clone(),
                layout,
            });
        }
        Self::new(communities)
    }

    /// Inverse of [`Catalog::from_json`].
    pub fn to_json(&self) -> Value {
        let types_json = |types: &[AppTypeEntry]| {
            Value::Object(
                types
                    .iter()
                    .map(|t| (t.id.clone(), Value::from(t.apps.clone())))
                    .collect::<Map<_, _>>(),
            )
        };
        Value::Object(
            self.communities
                .iter()
                .map(|c| {
                    let body = match &c.layout {
                        Layout::Flat(types) => types_json(types),
                        Layout::Nested(platforms) => Value::Object(
                            platforms
                                .iter()
                                .map(|p| (p.id.clone(), types_json(&p.app_types)))
                                .collect(),
                        ),
                    };
                    (c.id.clone(), body)
                })
                .collect(),
        )
    }

    pub fn communities(&self) -> &[Community] {
        &self.communities
    }

    pub fn community(&self, id: &str) -> Option<&Community> {
        self.communities.iter().find(|c| c.id == id)
    }

    /// Reverse lookup: the first community offering `app` under `origin`.
    pub fn community_offering(&self, origin: &Origin, app: &str) -> Option<&Community> {
        self.communities.iter().find(|c| c.offers(origin, app))
    }

    fn validate(&self) -> Result<(), CatalogError> {
        if self.communities.is_empty() {
            return Err(CatalogError::Empty);
        }
        unique(self.communities.iter().map(|c| c.id.as_str()), "catalog")?;
        for community in &self.communities {
            match &community.layout {
                Layout::Flat(types) => validate_types(types, &community.id)?,
                Layout::Nested(platforms) => {
                    unique(platforms.iter().map(|p| p.id.as_str()), &community.id)?;
                    for platform in platforms {
                        validate_types(&platform.app_types, &format!("{}/{}", community.id, platform.id))?;
                    }
                }
            }
            if community.groups().iter().all(|(_, apps)| apps.is_empty()) {
                return Err(CatalogError::Unreachable(community.id.clone()));
            }
        }
        Ok(())
    }
}

fn validate_types(types: &[AppTypeEntry], parent: &str) -> Result<(), CatalogError> {
    unique(types.iter().map(|t| t.id.as_str()), parent)?;
    for entry in types {
        unique(entry.apps.iter().map(String::as_str), &format!("{parent}/{}", entry.id))?;
    }
    Ok(())
}

fn unique<'a>(ids: impl Iterator<Item = &'a str>, parent: &str) -> Result<(), CatalogError> {
    let mut seen = HashSet::new();
    for id in ids {
        if id.is_empty() || id.contains(['|', ':', '\n']) {
            return Err(CatalogError::InvalidId(id.to_string()));
        }
        if !seen.insert(id) {
            return Err(CatalogError::Duplicate {
                parent: parent.to_string(),
                id: id.to_string(),
            });
        }
    }
    Ok(())
}

fn as_object<'a>(value: &'a Value, path: &str) -> Result<&'a Map<String, Value>, CatalogError> {
    value.as_object().ok_or_else(|| CatalogError::Malformed {
        path: path.to_string(),
        message: "expected an object".into(),
    })
}

fn parse_app_types(entries: &Map<String, Value>, path: &str) -> Result<Vec<AppTypeEntry>, CatalogError> {
    entries
        .iter()
        .map(|(id, apps)| {
            let apps_path = format!("{path}.{id}");
            let list = apps.as_array().ok_or_else(|| CatalogError::Malformed {
                path: apps_path.clone(),
                message: "expected a list of application names".into(),
            })?;
            let apps = list
                .iter()
                .map(|app| {
                    app.as_str().map(str::to_string).ok_or_else(|| CatalogError::Malformed {
                        path: apps_path.clone(),
                        message: "application names must be strings".into(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(AppTypeEntry {
                id: id.clone(),
                apps,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_catalog_keeps_menu_order() {
        let catalog = Catalog::builtin();
        let ids: Vec<_> = catalog.communities().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["fr", "be"]);

        let fr = catalog.community("fr").expect("fr");
        assert!(!fr.is_flat());
        assert_eq!(fr.platform_ids(), ["core", "acore"]);

        let be = catalog.community("be").expect("be");
        assert!(be.is_flat());
        assert!(be.platform_ids().is_empty());
        assert_eq!(
            be.apps(&Origin::new(None, "ihm")).expect("be ihm"),
            ["webapp-plf", "webapp-plbinf", "plf", "webservice-a2a"]
        );
    }

    #[test]
    fn nested_lookups_require_a_platform() {
        let catalog = Catalog::builtin();
        let fr = catalog.community("fr").expect("fr");
        assert!(fr.apps(&Origin::new(None, "ihm")).is_none());
        assert!(fr.offers(&Origin::new(Some("acore"), "flux"), "acore"));
        assert!(!fr.offers(&Origin::new(Some("core"), "flux"), "acore"));
    }

    #[test]
    fn reverse_lookup_finds_the_offering_community() {
        let catalog = Catalog::builtin();
        let found = catalog
            .community_offering(&Origin::new(Some("acore"), "ihm"), "pilad")
            .expect("offered");
        assert_eq!(found.id, "fr");
        let flat = catalog
            .community_offering(&Origin::new(None, "flux"), "core-xchg")
            .expect("offered");
        assert_eq!(flat.id, "be");
    }

    #[test]
    fn json_form_preserves_document_order() {
        let catalog = Catalog::from_json(
            r#"{ "lu": { "zeta": ["z1"], "alpha": ["a1", "a2"] },
                 "ch": { "p2": { "ihm": ["x"] }, "p1": { "flux": [] , "ihm": ["y"] } } }"#,
        )
        .expect("parse");

        let lu = catalog.community("lu").expect("lu");
        let types: Vec<_> = lu.groups().into_iter().map(|(o, _)| o.app_type).collect();
        assert_eq!(types, ["zeta", "alpha"]);

        let ch = catalog.community("ch").expect("ch");
        assert_eq!(ch.platform_ids(), ["p2", "p1"]);
    }

    #[test]
    fn builtin_catalog_survives_json_export() {
        let catalog = Catalog::builtin();
        let text = catalog.to_json().to_string();
        assert_eq!(Catalog::from_json(&text).expect("reparse"), catalog);
    }

    #[test]
    fn mixed_community_shapes_are_malformed() {
        let err = Catalog::from_json(r#"{ "fr": { "core": { "ihm": ["a"] }, "ihm": ["b"] } }"#)
            .expect_err("mixed");
        assert!(matches!(err, CatalogError::Malformed { path, .. } if path == "$.fr"));
    }

    #[test]
    fn community_without_applications_is_rejected() {
        let err = Catalog::from_json(r#"{ "be": { "ihm": [], "flux": [] } }"#).expect_err("empty");
        assert_eq!(err, CatalogError::Unreachable("be".into()));
    }

    #[test]
    fn delimiters_in_identifiers_are_rejected() {
        let err = Catalog::from_json(r#"{ "be": { "ihm": ["web|app"] } }"#).expect_err("delimiter");
        assert_eq!(err, CatalogError::InvalidId("web|app".into()));
    }

    #[test]
    fn duplicate_applications_are_rejected() {
        let err = Catalog::from_json(r#"{ "be": { "ihm": ["plf", "plf"] } }"#).expect_err("dup");
        assert!(matches!(err, CatalogError::Duplicate { id, .. } if id == "plf"));
    }

    #[test]
    fn empty_catalog_is_rejected() {
        assert_eq!(Catalog::from_json("{}").expect_err("empty"), CatalogError::Empty);
    }
}
