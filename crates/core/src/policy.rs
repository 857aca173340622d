//! Purge-by-post policy.
//!
//! Which tag categories a post change fans out to. Read once per
//! config-generation and never mutated while requests are being served.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

/// One category of derived tags that a post change may purge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurgeCategory {
    AllPages,
    Term,
    Author,
    PostType,
    FrontPage,
    HomePage,
    Pages,
    PagesWithRecentPosts,
    Date,
    Month,
    Year,
}

impl PurgeCategory {
    pub const ALL: [PurgeCategory; 11] = [
        PurgeCategory::AllPages,
        PurgeCategory::Term,
        PurgeCategory::Author,
        PurgeCategory::PostType,
        PurgeCategory::FrontPage,
        PurgeCategory::HomePage,
        PurgeCategory::Pages,
        PurgeCategory::PagesWithRecentPosts,
        PurgeCategory::Date,
        PurgeCategory::Month,
        PurgeCategory::Year,
    ];

    /// Short code used by the dot-joined policy string.
    pub fn code(self) -> &'static str {
        match self {
            PurgeCategory::AllPages => "-",
            PurgeCategory::Term => "T",
            PurgeCategory::Author => "A",
            PurgeCategory::PostType => "PT",
            PurgeCategory::FrontPage => "F",
            PurgeCategory::HomePage => "H",
            PurgeCategory::Pages => "PGS",
            PurgeCategory::PagesWithRecentPosts => "PGSRP",
            PurgeCategory::Date => "D",
            PurgeCategory::Month => "M",
            PurgeCategory::Year => "Y",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.code() == code)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown purge category code: {0}")]
pub struct UnknownCategory(pub String);

/// The set of enabled purge categories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct PurgePolicy(BTreeSet<PurgeCategory>);

impl PurgePolicy {
    pub fn new(categories: impl IntoIterator<Item = PurgeCategory>) -> Self {
        Self(categories.into_iter().collect())
    }

    /// Every category except `AllPages`.
    pub fn precise() -> Self {
        Self::new(PurgeCategory::ALL.into_iter().filter(|c| *c != PurgeCategory::AllPages))
    }

    pub fn purge_by_post(&self, category: PurgeCategory) -> bool {
        self.0.contains(&category)
    }

    pub fn is_superset(&self, other: &PurgePolicy) -> bool {
        self.0.is_superset(&other.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = PurgeCategory> + '_ {
        self.0.iter().copied()
    }
}

impl FromStr for PurgePolicy {
    type Err = UnknownCategory;

    /// Parse the dot-joined code form, e.g. `F.H.T.PT`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split('.')
            .map(str::trim)
            .filter(|code| !code.is_empty())
            .map(|code| PurgeCategory::from_code(code).ok_or_else(|| UnknownCategory(code.to_string())))
            .collect::<Result<BTreeSet<_>, _>>()
            .map(Self)
    }
}

impl fmt::Display for PurgePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let codes: Vec<&str> = self.iter().map(PurgeCategory::code).collect();
        f.write_str(&codes.join("."))
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum PolicyRepr {
    Names(Vec<PurgeCategory>),
    Codes(String),
}

impl<'de> Deserialize<'de> for PurgePolicy {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match PolicyRepr::deserialize(deserializer)? {
            PolicyRepr::Names(names) => Ok(Self::new(names)),
            PolicyRepr::Codes(codes) => codes.parse().map_err(serde::de::Error::custom),
        }
    }
}
