//! # Bundled Assets
//!
//! Maps the cache keys of bundled offline resources to the files shipped
//! with the application. The table is resolved once per site and consulted
//! for every key of a migration batch.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use url::Url;

use crate::article::BundledResource;

/// A bundled file standing in for a downloadable resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetSource {
    pub path: PathBuf,
    pub mime_type: String,
}

/// Configuration: where bundled resources live and which ones exist
#[derive(Debug, Clone)]
pub struct BundledAssets {
    dir: PathBuf,
    resources: Vec<BundledResource>,
}

impl BundledAssets {
    /// All known bundled resources under `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            resources: BundledResource::ALL.to_vec(),
        }
    }

    /// Restrict the table to a subset of resources
    pub fn with_resources(mut self, resources: impl IntoIterator<Item = BundledResource>) -> Self {
        self.resources = resources.into_iter().collect();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Build the key → asset table for `site`
    pub fn resolve(&self, site: &Url) -> AssetTable {
        let entries = self
            .resources
            .iter()
            .filter_map(|resource| {
                let key = resource.cache_key(site)?;
                Some((
                    key.to_string(),
                    AssetSource {
                        path: self.dir.join(resource.file_name()),
                        mime_type: resource.mime_type().to_string(),
                    },
                ))
            })
            .collect();
        AssetTable { entries }
    }
}

/// Bundled assets resolved for one site
#[derive(Debug, Clone, Default)]
pub struct AssetTable {
    entries: HashMap<String, AssetSource>,
}

impl AssetTable {
    pub fn get(&self, key: &str) -> Option<&AssetSource> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_for_site() {
        let assets = BundledAssets::new("/app/assets/pcs-html-converter");
        let site = Url::parse("https://en.wikipedia.org/").unwrap();
        let table = assets.resolve(&site);

        assert_eq!(table.len(), 4);
        let site_css = table
            .get("https://en.wikipedia.org/api/rest_v1/data/css/mobile/site")
            .unwrap();
        assert_eq!(
            site_css.path,
            PathBuf::from("/app/assets/pcs-html-converter/siteCSS.css")
        );
        assert_eq!(site_css.mime_type, "text/css");

        let js = table
            .get("https://meta.wikimedia.org/api/rest_v1/data/javascript/mobile/pcs")
            .unwrap();
        assert_eq!(js.mime_type, "application/javascript");
        assert!(table.get("https://en.wikipedia.org/wiki/Dog").is_none());
    }

    #[test]
    fn test_subset_of_resources() {
        let assets =
            BundledAssets::new("/assets").with_resources([BundledResource::BaseCss]);
        let table = assets.resolve(&Url::parse("https://fr.wikipedia.org/").unwrap());
        assert_eq!(table.len(), 1);
        assert!(
            table
                .get("https://fr.wikipedia.org/api/rest_v1/data/css/mobile/site")
                .is_none()
        );
    }
}
