use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// A contact attribute a run can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Email,
    Phone,
    Name,
    Role,
}

impl Field {
    pub const ALL: [Field; 4] = [Field::Email, Field::Phone, Field::Name, Field::Role];

    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Email => "email",
            Field::Phone => "phone",
            Field::Name => "name",
            Field::Role => "role",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Field {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "email" => Ok(Field::Email),
            "phone" => Ok(Field::Phone),
            "name" => Ok(Field::Name),
            "role" => Ok(Field::Role),
            other => Err(AppError::ConfigError(format!("Unknown field: {other}"))),
        }
    }
}

/// The set of fields requested for a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSet(BTreeSet<Field>);

impl FieldSet {
    pub fn all() -> Self {
        Self(Field::ALL.into_iter().collect())
    }

    pub fn contains(&self, field: Field) -> bool {
        self.0.contains(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when name or role is requested, i.e. some anchor must run for
    /// proximity resolution.
    pub fn wants_proximity(&self) -> bool {
        self.contains(Field::Name) || self.contains(Field::Role)
    }

    pub fn iter(&self) -> impl Iterator<Item = Field> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Field> for FieldSet {
    fn from_iter<I: IntoIterator<Item = Field>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Parses a comma-separated list such as `"email, phone"`.
///
/// An empty or blank string parses to the empty set; callers decide whether
/// that means "everything".
impl FromStr for FieldSet {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .filter(|part| !part.trim().is_empty())
            .map(str::parse::<Field>)
            .collect()
    }
}

/// A detected entity that name/role inference can be centred on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Anchor {
    Email,
    Phone,
}

impl FromStr for Anchor {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "email" => Ok(Anchor::Email),
            "phone" => Ok(Anchor::Phone),
            other => Err(AppError::ConfigError(format!("Unknown anchor: {other}"))),
        }
    }
}

/// Anchors that name/role requests borrow their position from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorSet(BTreeSet<Anchor>);

impl AnchorSet {
    pub fn none() -> Self {
        Self(BTreeSet::new())
    }

    pub fn contains(&self, anchor: Anchor) -> bool {
        self.0.contains(&anchor)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Both anchors: names and roles are looked up around emails and phones.
impl Default for AnchorSet {
    fn default() -> Self {
        Self([Anchor::Email, Anchor::Phone].into_iter().collect())
    }
}

impl FromIterator<Anchor> for AnchorSet {
    fn from_iter<I: IntoIterator<Item = Anchor>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl FromStr for AnchorSet {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split(',')
            .filter(|part| !part.trim().is_empty())
            .map(str::parse::<Anchor>)
            .collect()
    }
}

/// Parameters of one crawl run. Immutable once the run starts.
#[derive(Debug, Clone)]
pub struct CrawlRequest {
    pub run_name: String,
    /// Seed URLs in the order given, exact-string duplicates removed.
    pub seeds: Vec<String>,
    pub fields: FieldSet,
    pub anchors: AnchorSet,
    pub spider_mode: bool,
    /// `None` means unbounded.
    pub max_pages: Option<usize>,
}

impl CrawlRequest {
    pub fn new<I, S>(run_name: impl Into<String>, seeds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut unique = Vec::new();
        for seed in seeds {
            let seed = seed.into();
            if !unique.contains(&seed) {
                unique.push(seed);
            }
        }

        Self {
            run_name: run_name.into(),
            seeds: unique,
            fields: FieldSet::all(),
            anchors: AnchorSet::default(),
            spider_mode: false,
            max_pages: None,
        }
    }

    pub fn with_fields(mut self, fields: FieldSet) -> Self {
        self.fields = fields;
        self
    }

    pub fn with_anchors(mut self, anchors: AnchorSet) -> Self {
        self.anchors = anchors;
        self
    }

    pub fn with_spider_mode(mut self, spider_mode: bool) -> Self {
        self.spider_mode = spider_mode;
        self
    }

    pub fn with_max_pages(mut self, max_pages: Option<usize>) -> Self {
        self.max_pages = max_pages;
        self
    }

    /// Whether email scanning runs: email was asked for, or name/role
    /// borrow the email anchor.
    pub fn email_anchor_active(&self) -> bool {
        self.fields.contains(Field::Email)
            || (self.fields.wants_proximity() && self.anchors.contains(Anchor::Email))
    }

    /// Whether phone scanning runs; same rule as [`Self::email_anchor_active`].
    pub fn phone_anchor_active(&self) -> bool {
        self.fields.contains(Field::Phone)
            || (self.fields.wants_proximity() && self.anchors.contains(Anchor::Phone))
    }

    /// Reject requests that can never produce a record. Runs before any fetch.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.seeds.is_empty() {
            return Err(AppError::ConfigError("seed URL list is empty".into()));
        }
        if self.fields.is_empty() {
            return Err(AppError::ConfigError("no fields requested".into()));
        }
        if self.fields.wants_proximity()
            && !self.fields.contains(Field::Email)
            && !self.fields.contains(Field::Phone)
            && self.anchors.is_empty()
        {
            return Err(AppError::ConfigError(
                "name/role requested but no email or phone anchor is available".into(),
            ));
        }
        if self.max_pages == Some(0) {
            return Err(AppError::ConfigError(
                "max_pages must be a positive integer".into(),
            ));
        }
        Ok(())
    }
}

/// One extracted contact. Fields outside the requested set are always `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactRecord {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub name: Option<String>,
    pub role: Option<String>,
}

impl ContactRecord {
    /// A record with every field `None` carries no information.
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.phone.is_none() && self.name.is_none() && self.role.is_none()
    }
}

/// Contacts extracted from a single processed page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageResult {
    pub url: String,
    pub contacts: Vec<ContactRecord>,
}

/// A contact together with the page it was found on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcedContact {
    #[serde(flatten)]
    pub contact: ContactRecord,
    pub url: String,
}

/// Counters describing how a run went.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    /// Pages that entered processing (the budget counter).
    pub pages_processed: usize,
    /// URLs that reached a terminal `Skipped` state.
    pub pages_skipped: usize,
    /// Skips caused by a transport failure.
    pub fetch_errors: usize,
}

/// Final output of a run, handed to the sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    pub run_name: String,
    /// All pages' contacts, in page-completion order.
    pub contacts: Vec<SourcedContact>,
    pub stats: RunStats,
    pub cancelled: bool,
}
