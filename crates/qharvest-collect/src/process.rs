//! Cleaning and quality filtering of collected questions.
//!
//! Cleaning always runs before filtering: the filters measure post-clean
//! character counts.

use qharvest_core::CollectedQuestion;

use crate::text::clean_text;

/// Interrogative markers that make a text look like a question.
const QUESTION_MARKERS: &[&str] = &["什么", "如何", "为什么", "怎么", "哪些", "哪个", "吗", "?", "？"];

/// Punctuation that does not count toward the special-character ratio.
const COMMON_PUNCTUATION: &[char] = &['，', '。', '！', '？', '、'];

/// An inclusion filter over cleaned questions. A question survives the
/// processor iff every configured filter accepts it.
pub trait QuestionFilter: Send + Sync {
    fn accept(&self, question: &CollectedQuestion) -> bool;
}

/// Rejects questions whose title or content is shorter than a configured
/// minimum, measured in characters after cleaning.
pub struct MinLengthFilter {
    min_title_chars: usize,
    min_content_chars: usize,
}

impl MinLengthFilter {
    #[must_use]
    pub fn new(min_title_chars: usize, min_content_chars: usize) -> Self {
        Self {
            min_title_chars,
            min_content_chars,
        }
    }
}

impl Default for MinLengthFilter {
    fn default() -> Self {
        Self::new(5, 10)
    }
}

impl QuestionFilter for MinLengthFilter {
    fn accept(&self, question: &CollectedQuestion) -> bool {
        question.title.chars().count() >= self.min_title_chars
            && question.content.chars().count() >= self.min_content_chars
    }
}

/// Heuristic question-likeness filter.
///
/// Accepts a question iff it carries at least one interrogative marker, is
/// not below the absolute minimum lengths (title 3 / content 5 characters),
/// and at most half of the title is special characters — anything that is
/// neither alphanumeric nor common punctuation.
#[derive(Default)]
pub struct ContentQualityFilter;

impl QuestionFilter for ContentQualityFilter {
    fn accept(&self, question: &CollectedQuestion) -> bool {
        let has_marker = QUESTION_MARKERS
            .iter()
            .any(|m| question.title.contains(m) || question.content.contains(m));

        let too_short =
            question.title.chars().count() < 3 || question.content.chars().count() < 5;

        let title_chars = question.title.chars().count().max(1);
        let special_chars = question
            .title
            .chars()
            .filter(|c| !c.is_alphanumeric() && !COMMON_PUNCTUATION.contains(c))
            .count();
        #[allow(clippy::cast_precision_loss)]
        let special_ratio = special_chars as f64 / title_chars as f64;

        has_marker && !too_short && special_ratio <= 0.5
    }
}

/// Clean-then-filter pipeline applied by the manager to the aggregated
/// output of all collectors.
pub struct QuestionProcessor {
    filters: Vec<Box<dyn QuestionFilter>>,
}

impl QuestionProcessor {
    #[must_use]
    pub fn new(filters: Vec<Box<dyn QuestionFilter>>) -> Self {
        Self { filters }
    }

    /// The processor the service wires up: minimum lengths plus the
    /// question-likeness heuristic.
    #[must_use]
    pub fn standard() -> Self {
        Self::new(vec![
            Box::new(MinLengthFilter::default()),
            Box::new(ContentQualityFilter),
        ])
    }

    /// Cleans every question's title and content in place, then retains the
    /// questions all filters accept.
    #[must_use]
    pub fn process(&self, questions: Vec<CollectedQuestion>) -> Vec<CollectedQuestion> {
        questions
            .into_iter()
            .filter_map(|mut question| {
                question.title = clean_text(&question.title);
                question.content = clean_text(&question.content);
                self.filters
                    .iter()
                    .all(|f| f.accept(&question))
                    .then_some(question)
            })
            .collect()
    }
}
