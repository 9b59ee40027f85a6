//! Site catalog loading and validation.
//!
//! The catalog is a JSON mapping of site name to probe configuration,
//! loaded once at run start and read-only thereafter. All optional keys get
//! their defaults here, and every entry is validated at load time so the
//! workers never need to defend against a malformed site.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use crate::config::{DEFAULT_CONFIDENCE_WEIGHT, DEFAULT_MIN_CONTENT_LENGTH};
use crate::error_handling::CatalogError;

/// HTTP method used for the probe request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProbeMethod {
    #[default]
    Get,
    Head,
}

/// Content-verification rules embedded in a catalog entry.
///
/// All string matching is case-insensitive. `regex` patterns must all match
/// for the response to pass; an unparseable pattern degrades to a plain
/// substring check at verification time rather than failing the load.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentRules {
    /// Phrases that must all appear in the body.
    #[serde(default)]
    pub must_contain: Vec<String>,

    /// Phrases whose presence rejects the response.
    #[serde(default)]
    pub must_not_contain: Vec<String>,

    /// Regex patterns that must all match the body.
    #[serde(default)]
    pub regex: Vec<String>,

    /// Bodies shorter than this are rejected as placeholders.
    #[serde(default = "default_min_content_length")]
    pub min_content_length: usize,

    /// When true, the username is not required to appear in the body.
    #[serde(default)]
    pub allow_no_username_match: bool,

    /// When true, the universal soft-404 phrase scan is skipped for this
    /// site (for sites whose legitimate pages trip the phrase list).
    #[serde(default)]
    pub ignore_global_soft_404: bool,
}

impl Default for ContentRules {
    fn default() -> Self {
        ContentRules {
            must_contain: Vec::new(),
            must_not_contain: Vec::new(),
            regex: Vec::new(),
            min_content_length: DEFAULT_MIN_CONTENT_LENGTH,
            allow_no_username_match: false,
            ignore_global_soft_404: false,
        }
    }
}

/// One immutable catalog entry: where to probe and how to judge the answer.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteConfig {
    /// Site name (the catalog map key; filled in after deserialization).
    #[serde(skip)]
    pub name: String,

    /// URL template containing exactly one `{}` slot for the username.
    pub url: String,

    /// HTTP method (default GET).
    #[serde(default)]
    pub method: ProbeMethod,

    /// Status codes accepted as a potential hit (default `[200]`).
    #[serde(default = "default_valid_status")]
    pub valid_status: Vec<u16>,

    /// Reporting category.
    #[serde(default = "default_category")]
    pub category: String,

    /// Base confidence weight in [0, 1] (default 0.6).
    #[serde(default = "default_confidence_weight")]
    pub confidence_weight: f64,

    /// Content-verification rules (all keys optional).
    #[serde(flatten)]
    pub rules: ContentRules,
}

fn default_valid_status() -> Vec<u16> {
    vec![200]
}

fn default_category() -> String {
    "Uncategorized".to_string()
}

fn default_confidence_weight() -> f64 {
    DEFAULT_CONFIDENCE_WEIGHT
}

fn default_min_content_length() -> usize {
    DEFAULT_MIN_CONTENT_LENGTH
}

impl SiteConfig {
    /// Substitutes the username into the URL template.
    pub fn probe_url(&self, username: &str) -> String {
        self.url.replacen("{}", username, 1)
    }

    fn validate(&self) -> Result<(), CatalogError> {
        let slots = self.url.matches("{}").count();
        if slots != 1 {
            return Err(CatalogError::InvalidSite {
                site: self.name.clone(),
                problem: format!("url template must contain exactly one {{}} slot, found {slots}"),
            });
        }
        if !(0.0..=1.0).contains(&self.confidence_weight) {
            return Err(CatalogError::InvalidSite {
                site: self.name.clone(),
                problem: format!(
                    "confidence_weight must be in [0, 1], got {}",
                    self.confidence_weight
                ),
            });
        }
        if self.valid_status.is_empty() {
            return Err(CatalogError::InvalidSite {
                site: self.name.clone(),
                problem: "valid_status must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Loads and validates the site catalog from a JSON file.
///
/// Sites are returned in name order so a run visits them deterministically.
///
/// # Errors
///
/// Returns a [`CatalogError`] if the file is unreadable, not valid JSON,
/// empty, or contains an invalid entry. Any of these is fatal to the run.
pub fn load_catalog(path: &Path) -> Result<Vec<SiteConfig>, CatalogError> {
    let raw = std::fs::read_to_string(path)?;
    let entries: BTreeMap<String, SiteConfig> = serde_json::from_str(&raw)?;

    if entries.is_empty() {
        return Err(CatalogError::Empty);
    }

    let mut sites = Vec::with_capacity(entries.len());
    for (name, mut site) in entries {
        site.name = name;
        site.validate()?;
        sites.push(site);
    }

    log::info!("Loaded {} sites from {}", sites.len(), path.display());
    Ok(sites)
}
