use modmap_core::error::{Error, Result};
use std::sync::OnceLock;
use tiktoken_rs::{o200k_base, CoreBPE};

static ENCODER: OnceLock<CoreBPE> = OnceLock::new();

fn encoder() -> Result<&'static CoreBPE> {
    if let Some(bpe) = ENCODER.get() {
        return Ok(bpe);
    }
    let bpe = o200k_base().map_err(|e| Error::oracle(format!("Tokenizer error: {e}")))?;
    Ok(ENCODER.get_or_init(|| bpe))
}

/// Number of o200k tokens in `text`
pub fn count_tokens(text: &str) -> Result<usize> {
    Ok(encoder()?.encode_with_special_tokens(text).len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_count_tokens_basic() {
        let count = count_tokens("Hello world").unwrap();
        assert!(count > 0);
        assert!(count < 10);
    }

    #[test]
    fn test_count_tokens_is_monotonic_in_repetition() {
        let short = count_tokens("class Foo:\n    pass\n").unwrap();
        let long = count_tokens(&"class Foo:\n    pass\n".repeat(20)).unwrap();
        assert!(long > short);
        assert_eq!(count_tokens("").unwrap(), 0);
    }
}
