//! # Article URLs
//!
//! Conversions between desktop article URLs, their site, and the REST
//! endpoints the offline cache downloads from.

use url::Url;

const WIKI_PATH_PREFIX: &str = "/wiki/";
const MOBILE_HTML_PATH: &str = "/api/rest_v1/page/mobile-html/";
const SHARED_RESOURCE_HOST: &str = "https://meta.wikimedia.org";

/// The site (scheme and host) an article URL belongs to.
///
/// Only `http`/`https` URLs with a host have a site.
pub fn site_url(url: &Url) -> Option<Url> {
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.host_str()?;
    Url::parse(&url.origin().ascii_serialization()).ok()
}

/// Rewrite a desktop article URL (`/wiki/<title>`) to its mobile-html endpoint.
///
/// Returns `None` for URLs that are not desktop article URLs.
pub fn mobile_html_url(desktop_url: &Url) -> Option<Url> {
    let title = desktop_url.path().strip_prefix(WIKI_PATH_PREFIX)?;
    if title.is_empty() {
        return None;
    }
    let host = desktop_url.host_str()?;
    Url::parse(&format!("https://{host}{MOBILE_HTML_PATH}{title}")).ok()
}

/// Static resources every offline article page depends on, shipped with the
/// application so they never need downloading during migration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BundledResource {
    BaseCss,
    SiteCss,
    PcsCss,
    PcsJs,
}

impl BundledResource {
    pub const ALL: [BundledResource; 4] = [
        BundledResource::BaseCss,
        BundledResource::SiteCss,
        BundledResource::PcsCss,
        BundledResource::PcsJs,
    ];

    /// File name inside the bundled assets directory
    pub fn file_name(&self) -> &'static str {
        match self {
            BundledResource::BaseCss => "baseCSS.css",
            BundledResource::SiteCss => "siteCSS.css",
            BundledResource::PcsCss => "pcsCSS.css",
            BundledResource::PcsJs => "pcsJS.js",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            BundledResource::PcsJs => "application/javascript",
            _ => "text/css",
        }
    }

    /// The cache key (resource URL) this resource is stored under for `site`.
    /// Site stylesheets are per-site; the rest are shared across sites.
    pub fn cache_key(&self, site: &Url) -> Option<Url> {
        let url = match self {
            BundledResource::BaseCss => {
                format!("{SHARED_RESOURCE_HOST}/api/rest_v1/data/css/mobile/base")
            }
            BundledResource::SiteCss => {
                let origin = site.origin().ascii_serialization();
                format!("{origin}/api/rest_v1/data/css/mobile/site")
            }
            BundledResource::PcsCss => {
                format!("{SHARED_RESOURCE_HOST}/api/rest_v1/data/css/mobile/pcs")
            }
            BundledResource::PcsJs => {
                format!("{SHARED_RESOURCE_HOST}/api/rest_v1/data/javascript/mobile/pcs")
            }
        };
        Url::parse(&url).ok()
    }
}
