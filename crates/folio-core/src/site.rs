//! Site configuration model.
//!
//! The site is described by a single JSON document (`site.config.json`)
//! holding hero text, links, keywords, projects, experience, certifications
//! and page metadata. Field names follow the JSON (camelCase).

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteConfig {
    pub name: String,
    pub role: String,
    pub summary: TextOrList,
    pub links: Links,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub keyword_links: HashMap<String, String>,
    #[serde(default)]
    pub projects: Vec<Project>,
    #[serde(default)]
    pub experience: Vec<Experience>,
    pub certifications: Option<Vec<Certification>>,
    pub meta: Meta,
}

/// A field that may be a paragraph or a list of bullet points.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TextOrList {
    Text(String),
    List(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResumeFormats {
    pub pdf: Option<String>,
    pub docx: Option<String>,
}

/// Value of one entry under `links`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum LinkValue {
    Url(String),
    Formats(ResumeFormats),
    Empty,
}

impl LinkValue {
    /// The URL to use when a single link is needed. Multi-format values
    /// prefer the PDF.
    pub fn primary_url(&self) -> Option<&str> {
        match self {
            LinkValue::Url(url) if !url.is_empty() => Some(url),
            LinkValue::Formats(formats) => formats
                .pdf
                .as_deref()
                .or(formats.docx.as_deref())
                .filter(|u| !u.is_empty()),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.primary_url().is_none()
    }
}

/// Links in document order. Contact rendering depends on the order, so this
/// is a list of pairs rather than a hash map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Links {
    entries: Vec<(String, LinkValue)>,
}

impl Links {
    pub fn get(&self, key: &str) -> Option<&LinkValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn url(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(LinkValue::primary_url)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LinkValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, LinkValue)> for Links {
    fn from_iter<I: IntoIterator<Item = (String, LinkValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl<'de> Deserialize<'de> for Links {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct LinksVisitor;

        impl<'de> Visitor<'de> for LinksVisitor {
            type Value = Links;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of link names to URLs")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Links, A::Error> {
                let mut entries = Vec::new();
                while let Some((key, value)) = map.next_entry::<String, LinkValue>()? {
                    entries.push((key, value));
                }
                Ok(Links { entries })
            }
        }

        deserializer.deserialize_map(LinksVisitor)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Project {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub stack: Vec<String>,
    pub links: ProjectLinks,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProjectLinks {
    pub repo: String,
    pub demo: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Experience {
    pub company: String,
    pub title: String,
    pub period: String,
    pub highlights: TextOrList,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Certification {
    pub name: String,
    pub issuer: String,
    pub date: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Meta {
    pub title: String,
    pub description: String,
}

impl SiteConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse site config")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read site config: {}", path.display()))?;
        Self::from_json(&contents)
            .with_context(|| format!("Invalid site config: {}", path.display()))
    }

    /// URL for a keyword tag, `#` when none is configured.
    pub fn keyword_link(&self, keyword: &str) -> &str {
        self.keyword_links
            .get(keyword)
            .map(String::as_str)
            .unwrap_or("#")
    }
}

/// Read and parse a site config file.
pub fn load_site_config(path: impl AsRef<Path>) -> Result<SiteConfig> {
    SiteConfig::load(path.as_ref())
}
