//! Token estimation for LLM context budgeting
//!
//! Provides token counting using tiktoken encodings, keyed by model name,
//! with a fast heuristic model for when exact counts are not needed.
//!
//! Supported models:
//! - gpt-4, gpt-4-turbo, gpt-3.5-turbo (cl100k_base)
//! - gpt-4o (o200k_base)
//! - claude-3, claude-3.5 (uses cl100k_base as approximation)
//! - heuristic (character-class estimate, no BPE tables)
//!
//! Estimation never fails a run: an unrecognized model name or an encoding
//! that cannot be loaded yields `None`.
//!
//! Usage:
//! ```rust
//! use codesight::core::tokenizer::{ModelEstimator, TokenEstimator};
//!
//! let estimator = ModelEstimator::for_model("gpt-4");
//! let tokens = estimator.estimate("Hello world");
//! assert!(tokens.is_some());
//!
//! let unknown = ModelEstimator::for_model("no-such-model");
//! assert_eq!(unknown.estimate("Hello world"), None);
//! ```

use once_cell::sync::Lazy;
use std::fmt;
use std::str::FromStr;
use tiktoken_rs::{cl100k_base, o200k_base, CoreBPE};

/// Supported token models/encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TokenModel {
    /// cl100k_base encoding (GPT-4, GPT-3.5-turbo, Claude 3)
    #[default]
    Cl100k,
    /// o200k_base encoding (GPT-4o native)
    O200k,
    /// GPT-4 / GPT-4-turbo (alias for Cl100k)
    Gpt4,
    /// GPT-4o (alias for O200k)
    Gpt4o,
    /// GPT-3.5-turbo (alias for Cl100k)
    Gpt35Turbo,
    /// Claude 3 / 3.5 (approximated with Cl100k)
    Claude3,
    /// Fast heuristic estimation (no BPE encoding)
    Heuristic,
}

impl TokenModel {
    /// Get the underlying BPE encoding for this model
    fn get_bpe(&self) -> Option<&'static CoreBPE> {
        match self {
            TokenModel::O200k | TokenModel::Gpt4o => O200K_BPE.as_ref().ok(),
            TokenModel::Cl100k
            | TokenModel::Gpt4
            | TokenModel::Gpt35Turbo
            | TokenModel::Claude3 => CL100K_BPE.as_ref().ok(),
            TokenModel::Heuristic => None,
        }
    }

    /// List all available models
    pub fn available_models() -> &'static [&'static str] {
        &[
            "cl100k",
            "o200k",
            "gpt-4",
            "gpt-4o",
            "gpt-3.5-turbo",
            "claude-3",
            "heuristic",
        ]
    }
}

impl fmt::Display for TokenModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenModel::Cl100k => "cl100k",
            TokenModel::O200k => "o200k",
            TokenModel::Gpt4 => "gpt-4",
            TokenModel::Gpt4o => "gpt-4o",
            TokenModel::Gpt35Turbo => "gpt-3.5-turbo",
            TokenModel::Claude3 => "claude-3",
            TokenModel::Heuristic => "heuristic",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for TokenModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "cl100k" | "cl100k_base" | "default" => Ok(TokenModel::Cl100k),
            "o200k" | "o200k_base" => Ok(TokenModel::O200k),
            "gpt4" | "gpt-4" | "gpt-4-turbo" | "gpt-4-32k" => Ok(TokenModel::Gpt4),
            "gpt4o" | "gpt-4o" | "gpt-4o-mini" => Ok(TokenModel::Gpt4o),
            "gpt35" | "gpt-3.5" | "gpt-3.5-turbo" => Ok(TokenModel::Gpt35Turbo),
            "claude" | "claude3" | "claude-3" | "claude-3.5" => Ok(TokenModel::Claude3),
            "heuristic" | "fast" | "estimate" => Ok(TokenModel::Heuristic),
            _ => Err(format!(
                "Unknown model: {}. Available: {}",
                s,
                TokenModel::available_models().join(", ")
            )),
        }
    }
}

// Lazy-initialized BPE encodings (loaded once on first use)
static CL100K_BPE: Lazy<Result<CoreBPE, String>> =
    Lazy::new(|| cl100k_base().map_err(|e| format!("Failed to load cl100k_base: {}", e)));

static O200K_BPE: Lazy<Result<CoreBPE, String>> =
    Lazy::new(|| o200k_base().map_err(|e| format!("Failed to load o200k_base: {}", e)));

/// A capability that maps text to an approximate token count.
///
/// `None` means the estimate is unavailable, never that the text is empty.
pub trait TokenEstimator {
    fn estimate(&self, text: &str) -> Option<usize>;
}

/// Estimator selected by model name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelEstimator {
    name: String,
    model: Option<TokenModel>,
}

impl ModelEstimator {
    /// Build an estimator for a model name; unknown names estimate to `None`
    pub fn for_model(name: &str) -> Self {
        let model = match name.parse::<TokenModel>() {
            Ok(model) => Some(model),
            Err(e) => {
                log::warn!("{}; token counts will be unavailable", e);
                None
            }
        };
        Self {
            name: name.to_string(),
            model,
        }
    }

    /// The model name this estimator was built for
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolved model, if the name was recognized
    pub fn model(&self) -> Option<TokenModel> {
        self.model
    }
}

impl From<TokenModel> for ModelEstimator {
    fn from(model: TokenModel) -> Self {
        Self {
            name: model.to_string(),
            model: Some(model),
        }
    }
}

impl TokenEstimator for ModelEstimator {
    fn estimate(&self, text: &str) -> Option<usize> {
        self.model.and_then(|model| count_tokens(text, model))
    }
}

impl TokenEstimator for TokenModel {
    fn estimate(&self, text: &str) -> Option<usize> {
        count_tokens(text, *self)
    }
}

/// Count tokens in text using the specified model
///
/// Returns `None` when the model's encoding could not be loaded.
pub fn count_tokens(text: &str, model: TokenModel) -> Option<usize> {
    if model == TokenModel::Heuristic {
        return Some(estimate_tokens_heuristic(text));
    }

    let bpe = model.get_bpe()?;
    if text.is_empty() {
        return Some(0);
    }
    Some(bpe.encode_with_special_tokens(text).len())
}

/// Estimate tokens using a fast heuristic (no BPE encoding)
///
/// The heuristic accounts for:
/// - ASCII text: ~4 characters per token
/// - Code symbols: ~2 characters per token
/// - CJK characters: ~1.5 characters per token
/// - Other Unicode: ~2 characters per token
pub fn estimate_tokens_heuristic(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }

    let mut ascii_chars = 0usize;
    let mut cjk_chars = 0usize;
    let mut other_unicode = 0usize;
    let mut whitespace = 0usize;
    let mut code_symbols = 0usize;

    for c in text.chars() {
        if c.is_ascii_whitespace() {
            whitespace += 1;
        } else if c.is_ascii() {
            if is_code_symbol(c) {
                code_symbols += 1;
            } else {
                ascii_chars += 1;
            }
        } else if is_cjk_char(c) {
            cjk_chars += 1;
        } else {
            other_unicode += 1;
        }
    }

    let ascii_tokens = (ascii_chars + whitespace).div_ceil(4);
    let symbol_tokens = code_symbols.div_ceil(2);
    let cjk_tokens = (cjk_chars * 2).div_ceil(3);
    let other_tokens = other_unicode.div_ceil(2);

    ascii_tokens + symbol_tokens + cjk_tokens + other_tokens
}

/// Check if a character is a common code symbol/operator
#[inline]
fn is_code_symbol(c: char) -> bool {
    matches!(
        c,
        '(' | ')'
            | '['
            | ']'
            | '{'
            | '}'
            | '<'
            | '>'
            | '='
            | '+'
            | '-'
            | '*'
            | '/'
            | '%'
            | '&'
            | '|'
            | '^'
            | '!'
            | '~'
            | '?'
            | ':'
            | ';'
            | ','
            | '.'
            | '@'
            | '#'
            | '$'
            | '\\'
            | '"'
            | '\''
            | '`'
    )
}

/// Check if a character is CJK (Chinese/Japanese/Korean)
#[inline]
fn is_cjk_char(c: char) -> bool {
    let cp = c as u32;
    (0x4E00..=0x9FFF).contains(&cp)      // CJK Unified Ideographs
        || (0x3400..=0x4DBF).contains(&cp)  // CJK Extension A
        || (0x3000..=0x303F).contains(&cp)  // CJK Symbols and Punctuation
        || (0x3040..=0x309F).contains(&cp)  // Hiragana
        || (0x30A0..=0x30FF).contains(&cp)  // Katakana
        || (0xAC00..=0xD7AF).contains(&cp)  // Hangul Syllables
        || (0xFF00..=0xFFEF).contains(&cp) // Fullwidth Forms
}
