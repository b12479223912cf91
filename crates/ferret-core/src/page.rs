use crate::error::AppError;
use crate::extract::{ActiveAnchors, CandidateKind, FieldExtractor};
use crate::models::{ContactRecord, CrawlRequest, Field, PageResult};
use crate::patterns::PatternLibrary;
use crate::phone::PhoneValidator;
use crate::proximity::ProximityResolver;
use crate::region;

/// Turns one fetched document into one [`PageResult`].
///
/// Holds only the compiled patterns; nothing carries over between pages.
#[derive(Debug, Clone)]
pub struct PageProcessor {
    patterns: PatternLibrary,
    validator: PhoneValidator,
}

impl PageProcessor {
    pub fn new() -> Result<Self, AppError> {
        Ok(Self {
            patterns: PatternLibrary::new()?,
            validator: PhoneValidator,
        })
    }

    /// Extract contacts from `html`, served at `url`.
    ///
    /// Email records come first (plain, then obfuscated), then one record per
    /// distinct valid phone number. Fields outside `request.fields` are
    /// blanked and records left with nothing are dropped.
    pub fn process(
        &self,
        url: &str,
        html: &str,
        request: &CrawlRequest,
    ) -> Result<PageResult, AppError> {
        check_document(html)?;

        let fields = &request.fields;
        let region = region::detect(url);
        let resolver = ProximityResolver::new(&self.patterns, html);
        let candidates =
            FieldExtractor::new(&self.patterns).extract(html, ActiveAnchors::from(request));

        let mut contacts = Vec::new();
        let mut raw_phones = Vec::new();

        for candidate in &candidates {
            match candidate.kind {
                CandidateKind::Email | CandidateKind::ObfuscatedEmail => {
                    let (name, role) = resolver.resolve(candidate.span.clone(), fields);
                    contacts.push(ContactRecord {
                        email: fields
                            .contains(Field::Email)
                            .then(|| candidate.value.clone()),
                        phone: None,
                        name,
                        role,
                    });
                }
                CandidateKind::Phone => raw_phones.push(candidate.value.as_str()),
            }
        }

        for phone in self.validator.validate_unique(raw_phones, region) {
            let (name, role) = resolver.resolve(resolver.phone_tail_span(&phone), fields);
            contacts.push(ContactRecord {
                email: None,
                phone: fields.contains(Field::Phone).then_some(phone),
                name,
                role,
            });
        }

        contacts.retain(|c| !c.is_empty());

        tracing::debug!(%url, %region, contacts = contacts.len(), "Processed page");

        Ok(PageResult {
            url: url.to_string(),
            contacts,
        })
    }
}

/// Reject documents the text patterns cannot meaningfully scan.
fn check_document(html: &str) -> Result<(), AppError> {
    if html.trim().is_empty() {
        return Err(AppError::ParseError("empty document".into()));
    }
    if html.contains('\0') {
        return Err(AppError::ParseError("binary content in document".into()));
    }
    Ok(())
}
