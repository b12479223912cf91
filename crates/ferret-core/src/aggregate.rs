use crate::models::{PageResult, RunResult, RunStats, SourcedContact};

/// Collects page results into the run's final [`RunResult`].
///
/// Pages are appended in the order they complete, which depends on fetch
/// timing and is not stable across runs.
#[derive(Debug)]
pub struct RunAggregator {
    run_name: String,
    contacts: Vec<SourcedContact>,
}

impl RunAggregator {
    pub fn new(run_name: impl Into<String>) -> Self {
        Self {
            run_name: run_name.into(),
            contacts: Vec::new(),
        }
    }

    pub fn push(&mut self, page: &PageResult) {
        self.contacts
            .extend(page.contacts.iter().cloned().map(|contact| SourcedContact {
                contact,
                url: page.url.clone(),
            }));
    }

    pub fn finish(self, stats: RunStats, cancelled: bool) -> RunResult {
        RunResult {
            run_name: self.run_name,
            contacts: self.contacts,
            stats,
            cancelled,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ContactRecord;

    fn contact(email: &str) -> ContactRecord {
        ContactRecord {
            email: Some(email.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_concatenates_in_push_order() {
        let mut agg = RunAggregator::new("weekly");
        agg.push(&PageResult {
            url: "https://b.es/".into(),
            contacts: vec![contact("b@b.es")],
        });
        agg.push(&PageResult {
            url: "https://a.es/".into(),
            contacts: vec![contact("a1@a.es"), contact("a2@a.es")],
        });
        agg.push(&PageResult {
            url: "https://c.es/".into(),
            contacts: vec![],
        });

        let run = agg.finish(RunStats::default(), false);
        assert_eq!(run.run_name, "weekly");
        let sources: Vec<_> = run
            .contacts
            .iter()
            .map(|c| (c.url.as_str(), c.contact.email.as_deref()))
            .collect();
        assert_eq!(
            sources,
            vec![
                ("https://b.es/", Some("b@b.es")),
                ("https://a.es/", Some("a1@a.es")),
                ("https://a.es/", Some("a2@a.es")),
            ]
        );
    }
}
