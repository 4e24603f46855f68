//! Candidate action items produced by priority extraction.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// The three kinds of action item extraction can surface.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    IntoStaticStr,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CandidateCategory {
    /// Something the user promised to do.
    Commitment,
    /// Something someone asked the user to do.
    Request,
    /// Something tied to an explicit date.
    Deadline,
}

impl CandidateCategory {
    /// All categories in report order.
    pub fn all() -> Vec<Self> {
        Self::iter().collect()
    }

    /// Heading used for this category in the markdown report.
    pub fn heading(&self) -> &'static str {
        match self {
            CandidateCategory::Commitment => "Commitments made",
            CandidateCategory::Request => "Requests received",
            CandidateCategory::Deadline => "Deadlines",
        }
    }
}

/// A categorized, confidence-scored action item.
///
/// Confidence is clamped into `[0, 1]` on construction and cannot be set
/// afterwards, so every item in circulation satisfies the range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CandidateItem {
    pub title: String,
    pub description: String,
    pub category: CandidateCategory,
    confidence: f32,
    /// Provenance label, e.g. "Conversation with Marie - 2024-03-01".
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
}

impl CandidateItem {
    /// Create a new item with full confidence.
    pub fn new(category: CandidateCategory, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            category,
            confidence: 1.0,
            source: String::new(),
            due_date: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn with_due_date(mut self, due_date: Option<NaiveDate>) -> Self {
        self.due_date = due_date;
        self
    }

    /// Set the confidence, clamped into `[0, 1]`. Non-finite values become 0.
    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = clamp_confidence(confidence);
        self
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }
}

fn clamp_confidence(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Per-category item counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCounts {
    pub commitments: usize,
    pub requests: usize,
    pub deadlines: usize,
}

impl CategoryCounts {
    pub fn total(&self) -> usize {
        self.commitments + self.requests + self.deadlines
    }

    /// Increment the counter for a category.
    pub fn record(&mut self, category: CandidateCategory) {
        match category {
            CandidateCategory::Commitment => self.commitments += 1,
            CandidateCategory::Request => self.requests += 1,
            CandidateCategory::Deadline => self.deadlines += 1,
        }
    }

    pub fn get(&self, category: CandidateCategory) -> usize {
        match category {
            CandidateCategory::Commitment => self.commitments,
            CandidateCategory::Request => self.requests,
            CandidateCategory::Deadline => self.deadlines,
        }
    }
}

/// Output of the extraction step: always the three-list shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractedPriorities {
    pub commitments: Vec<CandidateItem>,
    pub requests: Vec<CandidateItem>,
    pub deadlines: Vec<CandidateItem>,
}

impl ExtractedPriorities {
    /// An empty result, returned whenever extraction fails.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Add an item to the list matching its category.
    pub fn push(&mut self, item: CandidateItem) {
        match item.category {
            CandidateCategory::Commitment => self.commitments.push(item),
            CandidateCategory::Request => self.requests.push(item),
            CandidateCategory::Deadline => self.deadlines.push(item),
        }
    }

    pub fn items(&self, category: CandidateCategory) -> &[CandidateItem] {
        match category {
            CandidateCategory::Commitment => &self.commitments,
            CandidateCategory::Request => &self.requests,
            CandidateCategory::Deadline => &self.deadlines,
        }
    }

    /// Iterate over all items: commitments, then requests, then deadlines.
    pub fn iter(&self) -> impl Iterator<Item = &CandidateItem> {
        self.commitments
            .iter()
            .chain(self.requests.iter())
            .chain(self.deadlines.iter())
    }

    pub fn total(&self) -> usize {
        self.commitments.len() + self.requests.len() + self.deadlines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn counts(&self) -> CategoryCounts {
        CategoryCounts {
            commitments: self.commitments.len(),
            requests: self.requests.len(),
            deadlines: self.deadlines.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_is_clamped() {
        let high = CandidateItem::new(CandidateCategory::Commitment, "a").with_confidence(1.7);
        let low = CandidateItem::new(CandidateCategory::Request, "b").with_confidence(-0.2);
        let nan = CandidateItem::new(CandidateCategory::Deadline, "c").with_confidence(f32::NAN);

        assert_eq!(high.confidence(), 1.0);
        assert_eq!(low.confidence(), 0.0);
        assert_eq!(nan.confidence(), 0.0);
    }

    #[test]
    fn test_push_routes_by_category() {
        let mut priorities = ExtractedPriorities::empty();
        priorities.push(CandidateItem::new(CandidateCategory::Commitment, "send deck"));
        priorities.push(CandidateItem::new(CandidateCategory::Commitment, "call back"));
        priorities.push(CandidateItem::new(CandidateCategory::Request, "review PR"));

        let counts = priorities.counts();
        assert_eq!(counts.commitments, 2);
        assert_eq!(counts.requests, 1);
        assert_eq!(counts.deadlines, 0);
        assert_eq!(priorities.total(), 3);

        let titles: Vec<_> = priorities.iter().map(|i| i.title.as_str()).collect();
        assert_eq!(titles, vec!["send deck", "call back", "review PR"]);
    }

    #[test]
    fn test_category_order_and_headings() {
        let all = CandidateCategory::all();
        assert_eq!(
            all,
            vec![
                CandidateCategory::Commitment,
                CandidateCategory::Request,
                CandidateCategory::Deadline
            ]
        );
        assert_eq!(CandidateCategory::Request.heading(), "Requests received");
    }
}
