//! Recognition rules for contact entities.
//!
//! Every rule is independent. Matching is best-effort: the rules favour recall
//! and leave precision to later stages (phone validation, record filtering).

use std::ops::Range;

use regex::{Match, Regex};

use crate::error::AppError;

/// Job titles recognised near an anchor, English then Spanish.
pub const ROLE_KEYWORDS: &[&str] = &[
    "CEO",
    "CTO",
    "CFO",
    "COO",
    "Founder",
    "Co-Founder",
    "Manager",
    "Director",
    "Marketing Manager",
    "Project Manager",
    "Sales Manager",
    "Lead Developer",
    "Software Engineer",
    "Developer",
    "Engineer",
    "Administrator",
    "Consultant",
    "Customer Support",
    "Director General",
    "Gerente",
    "Fundador",
    "Cofundador",
    "Responsable",
    "Responsable Comercial",
    "Jefe de Ventas",
    "Jefe de Marketing",
    "Atención al Cliente",
    "Administrador",
];

const EMAIL_PATTERN: &str = r"[a-zA-Z0-9_.+-]+@[a-zA-Z0-9-]+(?:\.[a-zA-Z0-9-]+)+";

const OBFUSCATED_EMAIL_PATTERN: &str = r"(?i)([a-z0-9_.+-]+)(?:\s*[\[(]\s*at\s*[\])]\s*|\s+at\s+)([a-z0-9-]+(?:\.[a-z0-9-]+)*)(?:\s*[\[(]\s*dot\s*[\])]\s*|\s+dot\s+)([a-z]{2,})\b";

const PHONE_PATTERN: &str = r"(?:(?:\+|00)[0-9]{1,3})?[\s.()-]?(?:[0-9]{2,4}[\s.()-]?){2,4}";

const NAME_PATTERN: &str = r"\b[A-Z][a-z]+(?:\s+[A-Z][a-z]+){1,3}\b";

/// An email written as `local (at) domain (dot) tld`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObfuscatedEmail {
    pub local: String,
    pub domain: String,
    pub tld: String,
    /// Span of the whole obfuscated expression.
    pub span: Range<usize>,
}

impl ObfuscatedEmail {
    /// The address with `@` and `.` restored.
    pub fn reconstruct(&self) -> String {
        format!("{}@{}.{}", self.local, self.domain, self.tld)
    }
}

/// Compiled set of recognition rules.
///
/// Cheap to share behind an `Arc`; compiling is the expensive part.
#[derive(Debug, Clone)]
pub struct PatternLibrary {
    email: Regex,
    obfuscated_email: Regex,
    phone: Regex,
    role: Regex,
    name: Regex,
}

impl PatternLibrary {
    pub fn new() -> Result<Self, AppError> {
        // Longest keywords first so "Marketing Manager" beats "Manager"
        // when both start at the same position.
        let mut keywords: Vec<&str> = ROLE_KEYWORDS.to_vec();
        keywords.sort_by_key(|k| std::cmp::Reverse(k.len()));
        let alternation = keywords
            .iter()
            .map(|k| regex::escape(k))
            .collect::<Vec<_>>()
            .join("|");

        Ok(Self {
            email: Regex::new(EMAIL_PATTERN)?,
            obfuscated_email: Regex::new(OBFUSCATED_EMAIL_PATTERN)?,
            phone: Regex::new(PHONE_PATTERN)?,
            role: Regex::new(&format!(r"(?i)\b(?:{alternation})\b"))?,
            name: Regex::new(NAME_PATTERN)?,
        })
    }

    /// Plain `local@domain.tld` matches, in document order.
    pub fn emails<'h>(
        &self,
        haystack: &'h str,
    ) -> impl Iterator<Item = Match<'h>> + use<'_, 'h> {
        self.email.find_iter(haystack)
    }

    /// Obfuscated emails, in document order.
    pub fn obfuscated_emails<'h>(
        &self,
        haystack: &'h str,
    ) -> impl Iterator<Item = ObfuscatedEmail> + use<'_, 'h> {
        self.obfuscated_email.captures_iter(haystack).filter_map(|caps| {
            let whole = caps.get(0)?;
            Some(ObfuscatedEmail {
                local: caps.get(1)?.as_str().to_string(),
                domain: caps.get(2)?.as_str().to_string(),
                tld: caps.get(3)?.as_str().to_string(),
                span: whole.range(),
            })
        })
    }

    /// Loose phone-shaped strings. Most of them are not phone numbers.
    pub fn phone_candidates<'h>(
        &self,
        haystack: &'h str,
    ) -> impl Iterator<Item = Match<'h>> + use<'_, 'h> {
        self.phone
            .find_iter(haystack)
            .filter(|m| m.as_str().chars().any(|c| c.is_ascii_digit()))
    }

    /// Longest capitalised word run; the first one wins a tie.
    pub fn longest_name<'h>(&self, haystack: &'h str) -> Option<&'h str> {
        let mut best: Option<&'h str> = None;
        for m in self.name.find_iter(haystack) {
            if best.is_none_or(|b| m.as_str().len() > b.len()) {
                best = Some(m.as_str());
            }
        }
        best
    }

    /// First role keyword by position, as written in the document.
    pub fn first_role<'h>(&self, haystack: &'h str) -> Option<&'h str> {
        self.role.find(haystack).map(|m| m.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lib() -> PatternLibrary {
        PatternLibrary::new().unwrap()
    }

    #[test]
    fn test_plain_email() {
        let lib = lib();
        let found: Vec<_> = lib
            .emails("Write to Ana.Lopez+web@Acme-Corp.co.uk.")
            .map(|m| m.as_str())
            .collect();
        assert_eq!(found, vec!["Ana.Lopez+web@Acme-Corp.co.uk"]);
    }

    #[test]
    fn test_matches_borrow_only_the_document() {
        let doc = String::from("ana@acme.es, +34 912 345 678");
        let (emails, phones) = {
            let lib = lib();
            let emails: Vec<Match<'_>> = lib.emails(&doc).collect();
            let phones: Vec<Match<'_>> = lib.phone_candidates(&doc).collect();
            (emails, phones)
        };
        assert_eq!(emails[0].as_str(), "ana@acme.es");
        assert!(phones.iter().any(|m| m.as_str().contains("912")));
    }

    #[test]
    fn test_obfuscated_email_variants() {
        let lib = lib();
        for text in [
            "john (at) example (dot) com",
            "john [AT] example [DOT] com",
            "john at example dot com",
            "john(at)example(dot)com",
        ] {
            let found: Vec<_> = lib.obfuscated_emails(text).collect();
            assert_eq!(found.len(), 1, "no match in {text:?}");
            assert_eq!(found[0].reconstruct(), "john@example.com");
        }
    }

    #[test]
    fn test_obfuscated_requires_separators() {
        let lib = lib();
        assert_eq!(lib.obfuscated_emails("the cat sat on the dotted line").count(), 0);
        assert_eq!(lib.obfuscated_emails("john@example.com").count(), 0);
    }

    #[test]
    fn test_phone_candidates_are_loose() {
        let lib = lib();
        let found: Vec<_> = lib
            .phone_candidates("Call +34 912 345 678 or 0142685300")
            .map(|m| m.as_str().trim().to_string())
            .collect();
        assert!(found.iter().any(|c| c.starts_with("+34")));
        assert!(found.iter().any(|c| c == "0142685300"));
    }

    #[test]
    fn test_longest_name_prefers_full_name() {
        let lib = lib();
        assert_eq!(
            lib.longest_name("Hello Team, meet Maria Garcia Lopez today"),
            Some("Maria Garcia Lopez")
        );
        assert_eq!(lib.longest_name("no names here"), None);
    }

    #[test]
    fn test_longest_name_tie_keeps_first() {
        let lib = lib();
        assert_eq!(lib.longest_name("Anna Bell and Carl Dunn"), Some("Anna Bell"));
    }

    #[test]
    fn test_first_role_by_position() {
        let lib = lib();
        assert_eq!(
            lib.first_role("our marketing manager and the CEO"),
            Some("marketing manager")
        );
        assert_eq!(lib.first_role("Jefe de Ventas: Luis"), Some("Jefe de Ventas"));
        assert_eq!(lib.first_role("nothing relevant"), None);
    }

    #[test]
    fn test_role_requires_word_boundary() {
        let lib = lib();
        assert_eq!(lib.first_role("engineering team"), None);
    }
}
