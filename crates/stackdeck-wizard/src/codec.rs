//! Flat wire form of a selection: one `platform|appType|app|version:archive`
//! token per selected application. The platform is empty for flat
//! communities and the archive may be empty.

use crate::catalog::{Catalog, Community};
use crate::error::CodecError;
use crate::resolver::resolve_visible;
use crate::selection::{SelectedApp, Selection};
use serde::Serialize;

pub const FIELD_DELIMITER: char = '|';
pub const DETAIL_DELIMITER: char = ':';

pub fn encode_app(app: &SelectedApp) -> String {
    format!(
        "{}{FIELD_DELIMITER}{}{FIELD_DELIMITER}{}{FIELD_DELIMITER}{}{DETAIL_DELIMITER}{}",
        app.platform.as_deref().unwrap_or(""),
        app.app_type,
        app.app,
        app.version,
        app.archive
    )
}

pub fn encode(selection: &Selection) -> Vec<String> {
    selection.apps.iter().map(encode_app).collect()
}

/// Parse one token. Everything after the first `:` of the last field is
/// the archive, so archive paths may contain either delimiter.
pub fn parse_token(token: &str) -> Result<SelectedApp, CodecError> {
    let fields: Vec<&str> = token.trim().splitn(4, FIELD_DELIMITER).collect();
    let [platform, app_type, app, details] = fields[..] else {
        return Err(CodecError::FieldCount(fields.len()));
    };
    if app_type.is_empty() {
        return Err(CodecError::EmptyField("app type"));
    }
    if app.is_empty() {
        return Err(CodecError::EmptyField("application"));
    }
    let (version, archive) = details.split_once(DETAIL_DELIMITER).unwrap_or((details, ""));
    Ok(SelectedApp {
        app: app.to_string(),
        platform: (!platform.is_empty()).then(|| platform.to_string()),
        app_type: app_type.to_string(),
        version: version.to_string(),
        archive: archive.to_string(),
    })
}

/// Split a stored payload into tokens, one per non-blank line.
pub fn split_tokens(input: &str) -> Vec<&str> {
    input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect()
}

/// A token left out of a hydrated selection, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedToken {
    pub token: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Decoded {
    pub selection: Selection,
    pub skipped: Vec<SkippedToken>,
}

/// Rebuild a selection from stored tokens.
///
/// The community is taken from `community` when the catalog knows it,
/// otherwise it is looked up from the first token the catalog offers.
/// Platforms and app-types are derived from the kept entries. Tokens that
/// do not parse, are not in the catalog, or repeat an earlier entry are
/// skipped; blank input yields an empty selection.
pub fn decode<S: AsRef<str>>(catalog: &Catalog, community: Option<&str>, tokens: &[S]) -> Decoded {
    let mut skipped = Vec::new();
    let mut parsed = Vec::new();
    for token in tokens.iter().map(|t| t.as_ref()) {
        if token.trim().is_empty() {
            continue;
        }
        match parse_token(token) {
            Ok(entry) => parsed.push((token, entry)),
            Err(e) => skipped.push(SkippedToken {
                token: token.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    let resolved: Option<&Community> = community
        .and_then(|id| catalog.community(id))
        .or_else(|| {
            parsed
                .iter()
                .find_map(|(_, e)| catalog.community_offering(&e.origin(), &e.app))
        });

    let mut selection = Selection::default();
    let Some(resolved) = resolved else {
        skipped.extend(parsed.into_iter().map(|(token, _)| SkippedToken {
            token: token.to_string(),
            reason: "no community offers this application".into(),
        }));
        warn_skipped(&skipped);
        return Decoded { selection, skipped };
    };
    selection.community = Some(resolved.id.clone());

    for (token, entry) in parsed {
        let reason = if !resolved.offers(&entry.origin(), &entry.app) {
            Some(format!("not offered by community '{}'", resolved.id))
        } else if selection.find_app(&entry.origin(), &entry.app).is_some() {
            Some("duplicate entry".to_string())
        } else {
            None
        };
        match reason {
            Some(reason) => skipped.push(SkippedToken {
                token: token.to_string(),
                reason,
            }),
            None => selection.apps.push(entry),
        }
    }

    selection.platforms = resolved
        .platform_ids()
        .into_iter()
        .filter(|p| selection.apps.iter().any(|a| a.platform.as_deref() == Some(*p)))
        .map(str::to_string)
        .collect();
    selection.app_types = resolve_visible(catalog, &selection)
        .app_types
        .into_iter()
        .filter(|t| selection.apps.iter().any(|a| &a.app_type == t))
        .collect();

    warn_skipped(&skipped);
    Decoded { selection, skipped }
}

fn warn_skipped(skipped: &[SkippedToken]) {
    for entry in skipped {
        tracing::warn!(token = %entry.token, reason = %entry.reason, "skipping stored selection");
    }
}
