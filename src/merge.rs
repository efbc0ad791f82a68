//! Combines per-chunk summaries into the final summary.

use crate::config::MergePolicy;
use crate::model::{GenerationParams, ModelError, SummaryModel};
use crate::tokenizer::Tokenizer;
use tracing::info;

/// Separator placed between chunk summaries
pub const SUMMARY_SEPARATOR: &str = "\n";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Merged {
    pub text: String,
    /// Whether a second summarisation pass ran over the joined summaries
    pub resummarized: bool,
}

/// Join summaries in document order.
pub fn concatenate<S: AsRef<str>>(summaries: &[S]) -> String {
    summaries
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(SUMMARY_SEPARATOR)
}

impl MergePolicy {
    /// Whether the joined summaries should go through the model once more.
    pub fn needs_second_pass(&self, count: usize, joined: &str, tokenizer: &dyn Tokenizer) -> bool {
        match *self {
            MergePolicy::Concatenate => false,
            MergePolicy::ResummarizeAboveChunks { chunks } => count > chunks,
            MergePolicy::ResummarizeAboveTokens { tokens } => tokenizer.count(joined) > tokens,
        }
    }
}

/// Merge `summaries` according to `policy`, calling the model at most once.
pub async fn merge(
    summaries: &[String],
    policy: MergePolicy,
    model: &dyn SummaryModel,
    params: &GenerationParams,
    tokenizer: &dyn Tokenizer,
) -> Result<Merged, ModelError> {
    let joined = concatenate(summaries);
    if summaries.is_empty() || !policy.needs_second_pass(summaries.len(), &joined, tokenizer) {
        return Ok(Merged {
            text: joined,
            resummarized: false,
        });
    }

    info!(summaries = summaries.len(), ?policy, "summarising joined chunk summaries");
    let text = model.summarize(&joined, params).await?;
    Ok(Merged {
        text,
        resummarized: true,
    })
}
