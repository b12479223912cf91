use std::ops::Range;

use crate::models::{Field, FieldSet};
use crate::patterns::PatternLibrary;

/// Characters inspected on each side of an anchor.
pub const WINDOW_CHARS: usize = 200;

/// Digits of an E.164 number used to relocate it in the source text.
const PHONE_TAIL_DIGITS: usize = 6;

/// Infers a name and role from the text surrounding an anchor span.
pub struct ProximityResolver<'a> {
    patterns: &'a PatternLibrary,
    document: &'a str,
}

impl<'a> ProximityResolver<'a> {
    pub fn new(patterns: &'a PatternLibrary, document: &'a str) -> Self {
        Self { patterns, document }
    }

    /// The text within [`WINDOW_CHARS`] characters of `span`, clamped to the
    /// document. `span` must lie on char boundaries.
    pub fn window(&self, span: Range<usize>) -> &'a str {
        let doc = self.document;
        let start = doc[..span.start]
            .char_indices()
            .rev()
            .take(WINDOW_CHARS)
            .last()
            .map(|(i, _)| i)
            .unwrap_or(span.start);
        let end = doc[span.end..]
            .char_indices()
            .nth(WINDOW_CHARS)
            .map(|(i, _)| span.end + i)
            .unwrap_or(doc.len());
        &doc[start..end]
    }

    pub fn name_near(&self, span: Range<usize>) -> Option<String> {
        self.patterns
            .longest_name(self.window(span))
            .map(str::to_string)
    }

    pub fn role_near(&self, span: Range<usize>) -> Option<String> {
        self.patterns.first_role(self.window(span)).map(str::to_string)
    }

    /// Name and role around `span`, each only if requested. A missing span
    /// yields nothing.
    pub fn resolve(
        &self,
        span: Option<Range<usize>>,
        fields: &FieldSet,
    ) -> (Option<String>, Option<String>) {
        let Some(span) = span else {
            return (None, None);
        };
        let name = if fields.contains(Field::Name) {
            self.name_near(span.clone())
        } else {
            None
        };
        let role = if fields.contains(Field::Role) {
            self.role_near(span)
        } else {
            None
        };
        (name, role)
    }

    /// First ASCII case-insensitive occurrence of an obfuscated email's local
    /// part.
    pub fn local_part_span(&self, local: &str) -> Option<Range<usize>> {
        if local.is_empty() {
            return None;
        }
        let haystack = self.document.to_ascii_lowercase();
        let start = haystack.find(&local.to_ascii_lowercase())?;
        Some(start..start + local.len())
    }

    /// First verbatim occurrence of the last six digits of an E.164 number.
    ///
    /// Source formatting often splits those digits, in which case there is no
    /// anchor.
    pub fn phone_tail_span(&self, e164: &str) -> Option<Range<usize>> {
        let tail_start = e164.len().checked_sub(PHONE_TAIL_DIGITS)?;
        let tail = e164.get(tail_start..)?;
        let start = self.document.find(tail)?;
        Some(start..start + tail.len())
    }
}
