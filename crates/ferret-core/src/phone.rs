use std::collections::HashSet;

use phonenumber::Mode;

use crate::region::Region;

/// Validates raw phone candidates with libphonenumber metadata and
/// canonicalises them to E.164.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhoneValidator;

impl PhoneValidator {
    /// Parse `raw` as a number from `region`.
    ///
    /// Returns `None` when parsing fails or the number is not valid for the
    /// region. Rejection is expected and silent.
    pub fn validate(&self, raw: &str, region: Region) -> Option<String> {
        let number = phonenumber::parse(Some(region.country_id()), raw.trim()).ok()?;
        if !phonenumber::is_valid(&number) {
            return None;
        }
        Some(number.format().mode(Mode::E164).to_string())
    }

    /// Validate every candidate and keep each E.164 value once, in order of
    /// first appearance.
    pub fn validate_unique<'a, I>(&self, candidates: I, region: Region) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut seen = HashSet::new();
        let mut unique = Vec::new();
        for raw in candidates {
            if let Some(e164) = self.validate(raw, region) {
                if seen.insert(e164.clone()) {
                    unique.push(e164);
                }
            }
        }
        unique
    }
}
