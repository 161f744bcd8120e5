//! Term-to-document inverted index with Elias gamma/delta postings compression.

pub mod bits;
pub mod codec;
pub mod error;
pub mod index;
pub mod persist;
pub mod tokenizer;

pub use bits::{BitReader, BitString};
pub use codec::CodecKind;
pub use error::{IndexError, Result};
pub use index::{CompressionState, DocId, Footprint, IndexStore, InvertedIndex, PostingsList};
pub use tokenizer::{Language, StandardNormalizer, TextNormalizer, SimpleNormalizer};
