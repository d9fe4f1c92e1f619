pub mod configure;
#[cfg(feature = "web-ui")]
pub mod serve;
pub mod show;
pub mod status;
pub mod wizard;

use anyhow::Context;
use stackdeck_wizard::Catalog;
use std::path::Path;

/// The built-in catalog, or the JSON file at `path`.
pub fn load_catalog(path: Option<&Path>) -> anyhow::Result<Catalog> {
    let Some(path) = path else {
        return Ok(Catalog::builtin());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading catalog {}", path.display()))?;
    let catalog =
        Catalog::from_json(&text).with_context(|| format!("invalid catalog {}", path.display()))?;
    tracing::info!(path = %path.display(), communities = catalog.communities().len(), "catalog loaded");
    Ok(catalog)
}
