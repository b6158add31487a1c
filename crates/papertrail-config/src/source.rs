//! Source descriptors.
//!
//! `SourceEntry` is one `[[sources]]` row kept as raw TOML, so a row with
//! a wrong-typed field does not reject the whole file.
//! `SourceEntry::validate` decodes it into a typed `SourceSpec` or a
//! per-source `ConfigError`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ConfigError;

/// One `[[sources]]` row as written in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SourceEntry(toml::Value);

impl From<toml::Value> for SourceEntry {
    fn from(value: toml::Value) -> Self {
        Self(value)
    }
}

impl SourceEntry {
    fn field(&self, key: &str) -> Option<&toml::Value> {
        self.0.as_table().and_then(|t| t.get(key))
    }

    /// Name used in logs and reports; unnamed entries get a positional label.
    pub fn display_name(&self, index: usize) -> String {
        match self.field("name").and_then(toml::Value::as_str).map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("<source #{}>", index + 1),
        }
    }

    /// Only an explicit `enabled = false` disables a source. A wrong-typed
    /// flag leaves it enabled so `validate` reports it.
    pub fn is_enabled(&self) -> bool {
        self.field("enabled").and_then(toml::Value::as_bool).unwrap_or(true)
    }

    pub fn is_institutional(&self) -> bool {
        self.field("institutional").and_then(toml::Value::as_bool).unwrap_or(false)
    }

    /// Validate the descriptor at position `index` of the source list.
    pub fn validate(&self, index: usize) -> Result<SourceSpec, ConfigError> {
        let name = self.display_name(index);
        let fields: SourceFields = self.0.clone().try_into().map_err(|e: toml::de::Error| {
            ConfigError::InvalidValue { source_name: name.clone(), message: e.message().to_string() }
        })?;
        fields.validate(name)
    }
}

/// Typed view of a row. Every field is optional; `validate` checks what
/// each kind needs.
#[derive(Debug, Clone, Deserialize)]
struct SourceFields {
    #[serde(default)]
    name: Option<String>,
    /// "feed", "scrape" or "listing".
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    url: Option<String>,
    /// Scrape only: which institution's page rules to apply.
    #[serde(default)]
    layout: Option<String>,
    /// Scrape only: series path for the `repec` layout, e.g. "ind/igiwpp".
    #[serde(default)]
    series: Option<String>,
    #[serde(default)]
    category: Option<String>,
    /// Decoded so a wrong-typed flag is reported; `SourceEntry::is_enabled`
    /// is what the planner reads.
    #[serde(default = "bool_true")]
    #[allow(dead_code)]
    enabled: bool,
    #[serde(default)]
    institutional: bool,
    #[serde(default)]
    accept_invalid_certs: bool,
    #[serde(default)]
    listing: Option<ListingRules>,
}

fn bool_true() -> bool { true }

impl SourceFields {
    fn validate(&self, name: String) -> Result<SourceSpec, ConfigError> {
        if self.name.as_deref().map_or(true, |n| n.trim().is_empty()) {
            return Err(ConfigError::MissingField { source_name: name, field: "name" });
        }

        let kind_str = self
            .kind
            .as_deref()
            .map(|k| k.trim().to_ascii_lowercase())
            .ok_or_else(|| ConfigError::MissingField { source_name: name.clone(), field: "kind" })?;

        let kind = match kind_str.as_str() {
            "feed" | "rss" => SourceKind::Feed {
                url: self.required_url(&name)?,
            },
            "scrape" => {
                let raw = self
                    .layout
                    .as_deref()
                    .ok_or_else(|| ConfigError::MissingField { source_name: name.clone(), field: "layout" })?;
                let layout: ScrapeLayout = raw.parse().map_err(|_| ConfigError::UnknownLayout {
                    source_name: name.clone(),
                    layout: raw.to_string(),
                })?;
                if layout == ScrapeLayout::Repec && self.series.as_deref().map_or(true, str::is_empty) {
                    return Err(ConfigError::MissingField { source_name: name, field: "series" });
                }
                let url = match &self.url {
                    Some(u) => Some(check_http_url(&name, u)?),
                    None => None,
                };
                SourceKind::Scrape { layout, url, series: self.series.clone() }
            }
            "listing" => {
                let url = self.required_url(&name)?;
                let rules = self
                    .listing
                    .clone()
                    .ok_or_else(|| ConfigError::MissingField { source_name: name.clone(), field: "listing" })?;
                if rules.max_pages == 0 {
                    return Err(ConfigError::InvalidValue {
                        source_name: name,
                        message: "listing.max_pages must be at least 1".to_string(),
                    });
                }
                SourceKind::Listing { url, rules }
            }
            other => {
                return Err(ConfigError::UnknownKind { source_name: name, kind: other.to_string() });
            }
        };

        let category = self
            .category
            .clone()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| match &kind {
                SourceKind::Scrape { layout, .. } => layout.default_category().to_string(),
                _ => "economics".to_string(),
            });

        Ok(SourceSpec {
            name,
            kind,
            category,
            institutional: self.institutional,
            accept_invalid_certs: self.accept_invalid_certs,
        })
    }

    fn required_url(&self, name: &str) -> Result<String, ConfigError> {
        let url = self
            .url
            .as_deref()
            .ok_or_else(|| ConfigError::MissingField { source_name: name.to_string(), field: "url" })?;
        check_http_url(name, url)
    }
}

fn check_http_url(name: &str, url: &str) -> Result<String, ConfigError> {
    let url = url.trim();
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(url.to_string())
    } else {
        Err(ConfigError::InvalidValue {
            source_name: name.to_string(),
            message: format!("'{}' is not an http(s) URL", url),
        })
    }
}

/// A validated source descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSpec {
    pub name: String,
    pub kind: SourceKind,
    pub category: String,
    pub institutional: bool,
    pub accept_invalid_certs: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SourceKind {
    Feed { url: String },
    Scrape { layout: ScrapeLayout, url: Option<String>, series: Option<String> },
    Listing { url: String, rules: ListingRules },
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Feed { .. }    => "feed",
            SourceKind::Scrape { .. }  => "scrape",
            SourceKind::Listing { .. } => "listing",
        }
    }
}

/// Per-institution page rules understood by the scrape fetcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScrapeLayout {
    Rbi,
    Sebi,
    Nipfp,
    Ncaer,
    Icrier,
    Cpr,
    Repec,
    Xkdr,
    Cag,
    Kiel,
    Unctad,
    Ashoka,
    Iima,
}

impl ScrapeLayout {
    pub const ALL: [ScrapeLayout; 13] = [
        ScrapeLayout::Rbi,
        ScrapeLayout::Sebi,
        ScrapeLayout::Nipfp,
        ScrapeLayout::Ncaer,
        ScrapeLayout::Icrier,
        ScrapeLayout::Cpr,
        ScrapeLayout::Repec,
        ScrapeLayout::Xkdr,
        ScrapeLayout::Cag,
        ScrapeLayout::Kiel,
        ScrapeLayout::Unctad,
        ScrapeLayout::Ashoka,
        ScrapeLayout::Iima,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScrapeLayout::Rbi    => "rbi",
            ScrapeLayout::Sebi   => "sebi",
            ScrapeLayout::Nipfp  => "nipfp",
            ScrapeLayout::Ncaer  => "ncaer",
            ScrapeLayout::Icrier => "icrier",
            ScrapeLayout::Cpr    => "cpr",
            ScrapeLayout::Repec  => "repec",
            ScrapeLayout::Xkdr   => "xkdr",
            ScrapeLayout::Cag    => "cag",
            ScrapeLayout::Kiel   => "kiel",
            ScrapeLayout::Unctad => "unctad",
            ScrapeLayout::Ashoka => "ashoka",
            ScrapeLayout::Iima   => "iima",
        }
    }

    pub fn default_category(&self) -> &'static str {
        match self {
            ScrapeLayout::Rbi | ScrapeLayout::Nipfp | ScrapeLayout::Cpr | ScrapeLayout::Cag => "policy",
            ScrapeLayout::Sebi => "finance",
            ScrapeLayout::Iima => "management",
            _ => "economics",
        }
    }
}

impl fmt::Display for ScrapeLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScrapeLayout {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_ascii_lowercase();
        ScrapeLayout::ALL.into_iter().find(|l| l.as_str() == s).ok_or(())
    }
}

/// Field mapping for a paginated JSON listing endpoint. All paths are
/// JSON pointers (RFC 6901) relative to the page body or to one record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRules {
    /// Pointer to the record array; empty means the body is the array.
    #[serde(default)]
    pub items: String,
    #[serde(default = "default_title_ptr")]
    pub title: String,
    #[serde(default = "default_link_ptr")]
    pub link: String,
    #[serde(default)]
    pub date: Option<String>,
    /// Either an array of strings, an array of objects with `name`, or a
    /// single delimited string.
    #[serde(default)]
    pub authors: Option<String>,
    #[serde(default, rename = "abstract")]
    pub abstract_text: Option<String>,
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    #[serde(default = "default_first_page")]
    pub first_page: u32,
    /// Query parameter used when the URL has no `{page}` placeholder.
    #[serde(default = "default_page_param")]
    pub page_param: String,
}

fn default_title_ptr()  -> String { "/title".to_string() }
fn default_link_ptr()   -> String { "/url".to_string() }
fn default_max_pages()  -> u32    { 5 }
fn default_first_page() -> u32    { 1 }
fn default_page_param() -> String { "page".to_string() }

impl Default for ListingRules {
    fn default() -> Self {
        Self {
            items: String::new(),
            title: default_title_ptr(),
            link: default_link_ptr(),
            date: None,
            authors: None,
            abstract_text: None,
            max_pages: default_max_pages(),
            first_page: default_first_page(),
            page_param: default_page_param(),
        }
    }
}
