//! Text tokenization and collation for the acoustic model.

pub mod collate;
pub mod phonemize;
pub mod tokenizer;

pub use collate::{Collated, TextCollater};
pub use phonemize::{EspeakPhonemizer, Phonemizer};
pub use tokenizer::{
    normalize_whitespace, BpeEncoder, TextEncoder, TextTokenizer, TokenizedText, TokenizerError,
};

#[cfg(test)]
pub use phonemize::CodePrefixPhonemizer;
#[cfg(test)]
pub use tokenizer::CharEncoder;
