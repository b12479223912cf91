use std::fmt;

use phonenumber::country;
use url::Url;

/// Locale used to interpret nationally formatted phone numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    ES,
    FR,
    IT,
    DE,
    GB,
    PT,
    US,
}

impl Region {
    pub fn as_str(&self) -> &'static str {
        match self {
            Region::ES => "ES",
            Region::FR => "FR",
            Region::IT => "IT",
            Region::DE => "DE",
            Region::GB => "GB",
            Region::PT => "PT",
            Region::US => "US",
        }
    }

    pub(crate) fn country_id(&self) -> country::Id {
        match self {
            Region::ES => country::Id::ES,
            Region::FR => country::Id::FR,
            Region::IT => country::Id::IT,
            Region::DE => country::Id::DE,
            Region::GB => country::Id::GB,
            Region::PT => country::Id::PT,
            Region::US => country::Id::US,
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Host suffixes checked in order. `.co.uk` is covered by `.uk`.
const SUFFIXES: &[(&str, Region)] = &[
    (".fr", Region::FR),
    (".it", Region::IT),
    (".de", Region::DE),
    (".uk", Region::GB),
    (".pt", Region::PT),
    (".us", Region::US),
];

/// Map a URL's host to a phone-parsing region.
///
/// Unknown suffixes and unparseable URLs fall back to [`Region::ES`].
pub fn detect(url: &str) -> Region {
    let Some(host) = Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.trim_end_matches('.').to_lowercase()))
    else {
        return Region::ES;
    };

    SUFFIXES
        .iter()
        .find(|(suffix, _)| host.ends_with(suffix))
        .map(|(_, region)| *region)
        .unwrap_or(Region::ES)
}
