// src/model.rs
//
// Normalized record types shared by the scrapers, the asset pipeline and
// dataset assembly. Records are immutable once constructed; ids are derived
// from display names and deduplicated by the parsers.

use chrono::Utc;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassRecord {
    pub id: String,
    pub name: String,
    pub icon_url: String,
    pub page_url: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRecord {
    pub id: String,
    pub name: String,
    pub icon_url: String,
    pub page_url: String,
    pub item_type: Option<String>,
    pub tier: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRecord {
    pub id: String,
    pub source_url: String,
    pub local_path: String,
    pub checksum_sha256: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementRule {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub required_items: Vec<String>,
    #[serde(default)]
    pub required_classes: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RequirementsDataset {
    pub generated_at: String,
    pub source_urls: Vec<String>,
    pub classes: Vec<ClassRecord>,
    pub items: Vec<ItemRecord>,
    pub assets: Vec<AssetRecord>,
    pub requirements: Vec<RequirementRule>,
}

impl RequirementsDataset {
    pub fn new(
        source_urls: Vec<String>,
        classes: Vec<ClassRecord>,
        items: Vec<ItemRecord>,
        assets: Vec<AssetRecord>,
        requirements: Vec<RequirementRule>,
    ) -> Self {
        Self {
            generated_at: Utc::now().to_rfc3339(),
            source_urls,
            classes,
            items,
            assets,
            requirements,
        }
    }
}

/// Anything with an id and a downloadable icon. The asset pipeline works
/// against this seam so classes and items go through the same code path.
pub trait HasIcon {
    fn id(&self) -> &str;
    fn icon_url(&self) -> &str;
}

impl HasIcon for ClassRecord {
    fn id(&self) -> &str { &self.id }
    fn icon_url(&self) -> &str { &self.icon_url }
}

impl HasIcon for ItemRecord {
    fn id(&self) -> &str { &self.id }
    fn icon_url(&self) -> &str { &self.icon_url }
}

/// Lowercased display name with every non-alphanumeric run collapsed to a
/// single hyphen, leading/trailing hyphens stripped.
pub fn slugify(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut prev_hyphen = false;
    for ch in value.chars() {
        if ch.is_alphanumeric() {
            out.extend(ch.to_lowercase());
            prev_hyphen = false;
        } else if !prev_hyphen {
            out.push('-');
            prev_hyphen = true;
        }
    }
    out.trim_matches('-').to_string()
}

/// Resolve a possibly-relative href or image source against the base origin.
pub fn absolutize(base_url: &str, path_or_url: &str) -> String {
    if path_or_url.starts_with("http") {
        return s!(path_or_url);
    }
    if path_or_url.starts_with("//") {
        return format!("https:{path_or_url}");
    }
    if path_or_url.starts_with('/') {
        format!("{base_url}{path_or_url}")
    } else {
        format!("{base_url}/{path_or_url}")
    }
}
