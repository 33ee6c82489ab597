//! Composite answer-quality scoring.
//!
//! Three weighted sub-scores — upvote magnitude, content length, and the
//! upvote/downvote ratio — combined into one score in `[0, 1]`.

use qharvest_core::CollectedAnswer;

/// A single scoring dimension producing a value in `[0, 1]`.
pub trait AnswerScorer: Send + Sync {
    fn score(&self, answer: &CollectedAnswer) -> f64;
}

/// Logarithmic upvote score: zero below a minimum threshold, then
/// `log10(1 + 9 · min(upvotes / max_reference, 1))`. The log curve
/// compresses the long tail so very high counts do not dominate linearly.
pub struct UpvoteScorer {
    min_upvotes: u32,
    max_upvotes: u32,
}

impl UpvoteScorer {
    #[must_use]
    pub fn new(min_upvotes: u32) -> Self {
        Self::with_limits(min_upvotes, 10_000)
    }

    #[must_use]
    pub fn with_limits(min_upvotes: u32, max_upvotes: u32) -> Self {
        Self {
            min_upvotes,
            max_upvotes,
        }
    }
}

impl AnswerScorer for UpvoteScorer {
    fn score(&self, answer: &CollectedAnswer) -> f64 {
        if answer.upvotes < self.min_upvotes {
            return 0.0;
        }
        let normalized = (f64::from(answer.upvotes) / f64::from(self.max_upvotes)).min(1.0);
        (1.0 + normalized * 9.0).log10()
    }
}

/// Length score: zero below a minimum, linear up to an optimal length, then
/// a linear penalty for verbosity floored at 0.5.
pub struct ContentLengthScorer {
    min_length: usize,
    optimal_length: usize,
}

impl Default for ContentLengthScorer {
    fn default() -> Self {
        Self {
            min_length: 50,
            optimal_length: 500,
        }
    }
}

impl AnswerScorer for ContentLengthScorer {
    #[allow(clippy::cast_precision_loss)]
    fn score(&self, answer: &CollectedAnswer) -> f64 {
        let length = answer.content.chars().count();
        if length < self.min_length {
            return 0.0;
        }
        if length <= self.optimal_length {
            (length as f64 / self.optimal_length as f64).min(1.0)
        } else {
            let overflow = (length - self.optimal_length) as f64;
            (1.0 - overflow / (self.optimal_length as f64 * 2.0)).max(0.5)
        }
    }
}

/// Vote-ratio score: `upvotes / (upvotes + downvotes)`, with a neutral 0.5
/// when there are no votes at all.
#[derive(Default)]
pub struct RatioScorer;

impl AnswerScorer for RatioScorer {
    fn score(&self, answer: &CollectedAnswer) -> f64 {
        let total = answer.upvotes + answer.downvotes;
        if total == 0 {
            return 0.5;
        }
        f64::from(answer.upvotes) / f64::from(total)
    }
}

/// Weighted combination of sub-scorers. Weights are renormalized to sum to
/// one; a sub-score that comes back non-finite contributes zero instead of
/// poisoning the composite.
pub struct CompositeAnswerScorer {
    scorers: Vec<Box<dyn AnswerScorer>>,
    weights: Vec<f64>,
}

impl CompositeAnswerScorer {
    #[must_use]
    pub fn new(scorers: Vec<Box<dyn AnswerScorer>>, weights: Vec<f64>) -> Self {
        let mut weights = if weights.len() == scorers.len() {
            weights
        } else {
            vec![1.0; scorers.len()]
        };
        let total: f64 = weights.iter().sum();
        if total > 0.0 {
            for w in &mut weights {
                *w /= total;
            }
        }
        Self { scorers, weights }
    }

    #[must_use]
    pub fn score(&self, answer: &CollectedAnswer) -> f64 {
        if self.scorers.is_empty() {
            return 0.5;
        }
        self.scorers
            .iter()
            .zip(&self.weights)
            .map(|(scorer, weight)| {
                let s = scorer.score(answer);
                if s.is_finite() { s * weight } else { 0.0 }
            })
            .sum()
    }
}

/// The scorer the service uses: upvotes 40%, content length 30%, vote
/// ratio 30%.
pub struct DefaultAnswerScorer {
    composite: CompositeAnswerScorer,
}

impl DefaultAnswerScorer {
    #[must_use]
    pub fn new(min_upvotes: u32) -> Self {
        Self {
            composite: CompositeAnswerScorer::new(
                vec![
                    Box::new(UpvoteScorer::new(min_upvotes)),
                    Box::new(ContentLengthScorer::default()),
                    Box::new(RatioScorer),
                ],
                vec![0.4, 0.3, 0.3],
            ),
        }
    }

    #[must_use]
    pub fn score(&self, answer: &CollectedAnswer) -> f64 {
        self.composite.score(answer)
    }
}
