use lazy_static::lazy_static;
use tiktoken_rs::CoreBPE;
use tracing::debug;

pub const DEFAULT_ENCODING: &str = "cl100k_base";

lazy_static! {
    static ref CL100K: Option<CoreBPE> = tiktoken_rs::cl100k_base()
        .map_err(|e| debug!(error = %e, "cl100k_base unavailable"))
        .ok();
    static ref O200K: Option<CoreBPE> = tiktoken_rs::o200k_base()
        .map_err(|e| debug!(error = %e, "o200k_base unavailable"))
        .ok();
}

/// Token estimate for `text` under a BPE encoding.
///
/// Supported encodings are `cl100k_base` (GPT-3.5/4) and `o200k_base`
/// (GPT-4o). Unknown encodings, or a tokenizer that failed to load, fall
/// back to one token per four bytes.
pub fn count_tokens(text: &str, encoding: &str) -> usize {
    let bpe = match encoding {
        "cl100k_base" => CL100K.as_ref(),
        "o200k_base" => O200K.as_ref(),
        _ => None,
    };
    match bpe {
        Some(bpe) => bpe.encode_ordinary(text).len(),
        None => fallback_tokens(text),
    }
}

#[inline]
fn fallback_tokens(text: &str) -> usize {
    text.len().div_ceil(4)
}
