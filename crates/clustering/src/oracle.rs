//! Trait definition for the grouping oracle

use crate::token::count_tokens;
use async_trait::async_trait;
use modmap_core::error::Result;

/// External service proposing groupings of components.
///
/// Responses are untrusted text. A well-behaved answer carries a
/// `<GROUPED_COMPONENTS>` block; anything else is handled as a malformed
/// response by the caller.
#[async_trait]
pub trait Oracle: Send + Sync {
    /// Ask for a partition of the components described in `prompt`
    ///
    /// # Returns
    /// The raw response text
    async fn propose_grouping(&self, prompt: &str) -> Result<String>;

    /// Cost of `text` in the oracle's context unit.
    ///
    /// Only ever compared against a budget in the same unit. Defaults to the
    /// o200k token count.
    fn estimate_size(&self, text: &str) -> Result<usize> {
        count_tokens(text)
    }
}
