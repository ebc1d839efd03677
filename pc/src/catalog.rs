//! Template catalog
//!
//! The fixed, ordered registry of prompt templates. Identifiers are open
//! strings so that callers can carry ids the catalog does not know about;
//! lookups for those simply miss.

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};
use tracing::debug;

/// The templates shipped with the converter, in display order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    General,
    Image,
    Blog,
    Coding,
    Video,
    Ads,
}

impl TemplateKind {
    pub const ALL: [TemplateKind; 6] = [
        TemplateKind::General,
        TemplateKind::Image,
        TemplateKind::Blog,
        TemplateKind::Coding,
        TemplateKind::Video,
        TemplateKind::Ads,
    ];

    /// Canonical identifier, also used as the `type` tag of structured drafts
    pub fn id(&self) -> &'static str {
        match self {
            Self::General => "General",
            Self::Image => "Image Prompt",
            Self::Blog => "Blog Prompt",
            Self::Coding => "Coding Prompt",
            Self::Video => "Video Prompt",
            Self::Ads => "Ads/Marketing Prompt",
        }
    }

    /// Resolve a canonical identifier
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.id() == id)
    }

    /// Resolve a short, case-insensitive alias such as `image` or `ads`
    fn from_alias(alias: &str) -> Option<Self> {
        match alias.trim().to_lowercase().as_str() {
            "general" => Some(Self::General),
            "image" | "image prompt" => Some(Self::Image),
            "blog" | "blog prompt" => Some(Self::Blog),
            "coding" | "code" | "coding prompt" => Some(Self::Coding),
            "video" | "video prompt" => Some(Self::Video),
            "ads" | "marketing" | "ads/marketing prompt" => Some(Self::Ads),
            _ => None,
        }
    }
}

impl fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Template identifier
///
/// Wraps any string; [`TemplateId::kind`] tells whether it names a catalog entry.
/// Deserializing goes through [`FromStr`], so aliases resolve there too.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct TemplateId(String);

impl TemplateId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The catalog entry this id names, if any
    pub fn kind(&self) -> Option<TemplateKind> {
        TemplateKind::from_id(&self.0)
    }
}

impl Default for TemplateId {
    fn default() -> Self {
        TemplateKind::General.into()
    }
}

impl From<TemplateKind> for TemplateId {
    fn from(kind: TemplateKind) -> Self {
        Self(kind.id().to_string())
    }
}

impl AsRef<str> for TemplateId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Parses user input: aliases map to canonical ids, anything else is kept verbatim
impl FromStr for TemplateId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match TemplateKind::from_alias(s).or_else(|| TemplateKind::from_id(s)) {
            Some(kind) => Ok(kind.into()),
            None => Ok(Self(s.to_string())),
        }
    }
}

impl<'de> Deserialize<'de> for TemplateId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        match raw.parse() {
            Ok(id) => Ok(id),
            Err(never) => match never {},
        }
    }
}

/// A catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Template {
    pub id: TemplateKind,
    pub name: &'static str,
    pub is_premium: bool,
}

static CATALOG: [Template; 6] = [
    Template {
        id: TemplateKind::General,
        name: "General",
        is_premium: false,
    },
    Template {
        id: TemplateKind::Image,
        name: "Image Prompt",
        is_premium: false,
    },
    Template {
        id: TemplateKind::Blog,
        name: "Blog Prompt",
        is_premium: false,
    },
    Template {
        id: TemplateKind::Coding,
        name: "Coding Prompt",
        is_premium: true,
    },
    Template {
        id: TemplateKind::Video,
        name: "Video Prompt",
        is_premium: true,
    },
    Template {
        id: TemplateKind::Ads,
        name: "Ads/Marketing Prompt",
        is_premium: true,
    },
];

/// All templates in display order
pub fn list() -> &'static [Template] {
    &CATALOG
}

/// Look up a template by identifier
pub fn find(id: &TemplateId) -> Option<&'static Template> {
    debug!(%id, "find: called");
    let found = CATALOG.iter().find(|t| t.id.id() == id.as_str());
    if found.is_none() {
        debug!(%id, "find: not in catalog");
    }
    found
}
