//! Raw candidate extraction.
//!
//! Name and role are never detected on their own: they are looked up around
//! an email or phone anchor (see [`crate::proximity`]). A page without any
//! email or phone therefore yields no names or roles, whatever was requested.

use std::ops::Range;

use crate::models::CrawlRequest;
use crate::patterns::PatternLibrary;
use crate::proximity::ProximityResolver;

/// What kind of raw match a [`Candidate`] is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateKind {
    Email,
    ObfuscatedEmail,
    Phone,
}

/// One raw match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub kind: CandidateKind,
    /// Anchor span for proximity lookups. For obfuscated emails this is the
    /// first occurrence of the local part, and may be absent.
    pub span: Option<Range<usize>>,
    /// Matched text; reconstructed `local@domain.tld` for obfuscated emails.
    pub value: String,
}

/// Which anchor scanners run for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveAnchors {
    pub email: bool,
    pub phone: bool,
}

impl From<&CrawlRequest> for ActiveAnchors {
    fn from(request: &CrawlRequest) -> Self {
        Self {
            email: request.email_anchor_active(),
            phone: request.phone_anchor_active(),
        }
    }
}

/// Scans a document for email and phone candidates.
pub struct FieldExtractor<'a> {
    patterns: &'a PatternLibrary,
}

impl<'a> FieldExtractor<'a> {
    pub fn new(patterns: &'a PatternLibrary) -> Self {
        Self { patterns }
    }

    /// Candidates in scan order: plain emails, obfuscated emails, then phone
    /// candidates, each in document order.
    pub fn extract(&self, html: &str, anchors: ActiveAnchors) -> Vec<Candidate> {
        let mut candidates = Vec::new();

        if anchors.email {
            candidates.extend(self.patterns.emails(html).map(|m| Candidate {
                kind: CandidateKind::Email,
                span: Some(m.range()),
                value: m.as_str().to_string(),
            }));

            let resolver = ProximityResolver::new(self.patterns, html);
            candidates.extend(self.patterns.obfuscated_emails(html).map(|obf| Candidate {
                kind: CandidateKind::ObfuscatedEmail,
                span: resolver.local_part_span(&obf.local),
                value: obf.reconstruct(),
            }));
        }

        if anchors.phone {
            candidates.extend(self.patterns.phone_candidates(html).map(|m| Candidate {
                kind: CandidateKind::Phone,
                span: Some(m.range()),
                value: m.as_str().to_string(),
            }));
        }

        tracing::debug!(count = candidates.len(), "Extracted raw candidates");
        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOTH: ActiveAnchors = ActiveAnchors {
        email: true,
        phone: true,
    };

    #[test]
    fn test_plain_and_obfuscated_emails() {
        let lib = PatternLibrary::new().unwrap();
        let html = "<p>ana@acme.es</p><p>john (at) example (dot) com</p>";
        let candidates = FieldExtractor::new(&lib).extract(html, BOTH);

        let emails: Vec<_> = candidates
            .iter()
            .filter(|c| c.kind != CandidateKind::Phone)
            .map(|c| (c.kind, c.value.as_str()))
            .collect();
        assert_eq!(
            emails,
            vec![
                (CandidateKind::Email, "ana@acme.es"),
                (CandidateKind::ObfuscatedEmail, "john@example.com"),
            ]
        );
    }

    #[test]
    fn test_obfuscated_span_points_at_local_part() {
        let lib = PatternLibrary::new().unwrap();
        let html = "Write to JOHN [at] example [dot] org";
        let candidates = FieldExtractor::new(&lib).extract(html, BOTH);
        let obf = candidates
            .iter()
            .find(|c| c.kind == CandidateKind::ObfuscatedEmail)
            .unwrap();
        assert_eq!(obf.value, "JOHN@example.org");
        assert_eq!(obf.span, Some(9..13));
    }

    #[test]
    fn test_inactive_anchors_skip_scanning() {
        let lib = PatternLibrary::new().unwrap();
        let html = "ana@acme.es 612 345 678";
        let extractor = FieldExtractor::new(&lib);

        let phones_only = extractor.extract(
            html,
            ActiveAnchors {
                email: false,
                phone: true,
            },
        );
        assert!(phones_only.iter().all(|c| c.kind == CandidateKind::Phone));
        assert!(!phones_only.is_empty());

        let none = extractor.extract(
            html,
            ActiveAnchors {
                email: false,
                phone: false,
            },
        );
        assert!(none.is_empty());
    }
}
