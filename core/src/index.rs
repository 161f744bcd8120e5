use crate::bits::BitString;
use crate::codec::CodecKind;
use crate::error::{IndexError, Result};
use crate::tokenizer::TextNormalizer;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::mem::size_of;

pub type DocId = u32;

/// Index-wide representation of every postings list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompressionState {
    #[default]
    Uncompressed,
    Gamma,
    Delta,
}

impl CompressionState {
    pub fn codec(self) -> Option<CodecKind> {
        match self {
            CompressionState::Uncompressed => None,
            CompressionState::Gamma => Some(CodecKind::Gamma),
            CompressionState::Delta => Some(CodecKind::Delta),
        }
    }
}

impl From<CodecKind> for CompressionState {
    fn from(codec: CodecKind) -> Self {
        match codec {
            CodecKind::Gamma => CompressionState::Gamma,
            CodecKind::Delta => CompressionState::Delta,
        }
    }
}

/// Document ids for one term, in insertion order. Duplicates are kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PostingsList {
    Raw(Vec<DocId>),
    Compressed { codec: CodecKind, bits: BitString },
}

impl Default for PostingsList {
    fn default() -> Self { PostingsList::Raw(Vec::new()) }
}

impl PostingsList {
    pub fn doc_ids(&self) -> Result<Vec<DocId>> {
        match self {
            PostingsList::Raw(ids) => Ok(ids.clone()),
            PostingsList::Compressed { codec, bits } => codec.decode_all(bits),
        }
    }

    fn compress(&self, codec: CodecKind) -> Result<PostingsList> {
        match self {
            PostingsList::Raw(ids) => Ok(PostingsList::Compressed { codec, bits: codec.encode_all(ids)? }),
            PostingsList::Compressed { .. } => {
                Err(IndexError::IllegalState("postings list is already compressed".into()))
            }
        }
    }

    /// Bytes held by the postings payload.
    pub fn payload_bytes(&self) -> usize {
        match self {
            PostingsList::Raw(ids) => ids.len() * size_of::<DocId>(),
            PostingsList::Compressed { bits, .. } => bits.as_bytes().len(),
        }
    }
}

/// Size of the term map, split into keys and postings payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Footprint {
    pub terms: usize,
    pub term_bytes: usize,
    pub postings_bytes: usize,
}

impl Footprint {
    pub fn total_bytes(&self) -> usize { self.term_bytes + self.postings_bytes }

    pub fn total_kib(&self) -> f64 { self.total_bytes() as f64 / 1024.0 }
}

/// Everything that is persisted for an index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStore {
    pub postings: HashMap<String, PostingsList>,
    pub documents: HashMap<DocId, String>,
    pub compression: CompressionState,
}

impl IndexStore {
    pub fn validate(&self) -> Result<()> {
        let expected = self.compression.codec();
        for (term, list) in &self.postings {
            match (expected, list) {
                (None, PostingsList::Raw(ids)) => {
                    if ids.contains(&0) {
                        return Err(IndexError::CorruptStore(format!("term {term:?} lists document id 0")));
                    }
                }
                (Some(want), PostingsList::Compressed { codec, .. }) if *codec == want => {}
                (_, PostingsList::Raw(_)) => {
                    return Err(IndexError::CorruptStore(format!(
                        "term {term:?} is raw in a {:?}-compressed index",
                        self.compression
                    )))
                }
                (_, PostingsList::Compressed { codec, .. }) => {
                    return Err(IndexError::CorruptStore(format!(
                        "term {term:?} is {codec}-coded in a {:?} index",
                        self.compression
                    )))
                }
            }
        }
        if self.documents.contains_key(&0) {
            return Err(IndexError::CorruptStore("document id 0 in document store".into()));
        }
        Ok(())
    }
}

pub struct InvertedIndex<N> {
    store: IndexStore,
    normalizer: N,
}

impl<N: TextNormalizer> InvertedIndex<N> {
    pub fn new(normalizer: N) -> Self {
        Self { store: IndexStore::default(), normalizer }
    }

    /// Wraps a loaded store after checking that every postings list matches
    /// its compression state and that raw lists hold no id 0.
    pub fn from_store(store: IndexStore, normalizer: N) -> Result<Self> {
        store.validate()?;
        Ok(Self { store, normalizer })
    }

    pub fn insert_document(&mut self, id: DocId, text: &str) -> Result<()> {
        if self.store.compression != CompressionState::Uncompressed {
            return Err(IndexError::IllegalState(format!(
                "cannot insert document {id} into a {:?}-compressed index",
                self.store.compression
            )));
        }
        if id == 0 {
            return Err(IndexError::InvalidArgument("document id must be >= 1".into()));
        }

        let terms = self.normalizer.normalize(text);
        tracing::debug!(doc_id = id, terms = terms.len(), "inserting document");
        for term in terms {
            // uncompressed state means every list is Raw
            if let PostingsList::Raw(ids) = self.store.postings.entry(term).or_default() {
                ids.push(id);
            }
        }
        self.store.documents.insert(id, text.to_string());
        Ok(())
    }

    /// Boolean AND over the normalized query terms.
    pub fn search(&self, query: &str) -> Result<BTreeSet<DocId>> {
        let terms = self.normalizer.normalize(query);
        tracing::debug!(query, compression = ?self.store.compression, terms = ?terms, "searching");
        let mut terms = terms.iter();
        let Some(first) = terms.next() else {
            return Ok(BTreeSet::new());
        };

        let mut result: BTreeSet<DocId> = self.postings(first)?.into_iter().collect();
        for term in terms {
            let ids = self.postings(term)?;
            if result.is_empty() {
                continue;
            }
            let other: BTreeSet<DocId> = ids.into_iter().collect();
            result.retain(|id| other.contains(id));
        }
        Ok(result)
    }

    /// Decoded postings for an already normalized term.
    pub fn postings(&self, term: &str) -> Result<Vec<DocId>> {
        self.store
            .postings
            .get(term)
            .ok_or_else(|| IndexError::TermNotFound(term.to_string()))?
            .doc_ids()
    }

    /// Re-encodes every postings list with `codec`. Either all lists are
    /// replaced or none are.
    pub fn compress_index(&mut self, codec: CodecKind) -> Result<()> {
        if self.store.compression != CompressionState::Uncompressed {
            return Err(IndexError::IllegalState(format!(
                "index is already {:?}-compressed",
                self.store.compression
            )));
        }

        let mut compressed = HashMap::with_capacity(self.store.postings.len());
        for (term, list) in &self.store.postings {
            compressed.insert(term.clone(), list.compress(codec)?);
        }
        let before = self.footprint();
        self.store.postings = compressed;
        self.store.compression = codec.into();
        let after = self.footprint();
        tracing::info!(
            %codec,
            terms = after.terms,
            raw_bytes = before.postings_bytes,
            compressed_bytes = after.postings_bytes,
            "compressed index"
        );
        Ok(())
    }

    pub fn compress_index_named(&mut self, codec: &str) -> Result<()> {
        let codec: CodecKind = codec.parse()?;
        self.compress_index(codec)
    }

    pub fn get_document(&self, id: DocId) -> Option<&str> {
        self.store.documents.get(&id).map(String::as_str)
    }

    /// Read-only view of the term map.
    pub fn snapshot(&self) -> &HashMap<String, PostingsList> { &self.store.postings }

    pub fn compression_state(&self) -> CompressionState { self.store.compression }

    pub fn num_docs(&self) -> usize { self.store.documents.len() }

    pub fn num_terms(&self) -> usize { self.store.postings.len() }

    pub fn footprint(&self) -> Footprint {
        self.store.postings.iter().fold(Footprint::default(), |mut acc, (term, list)| {
            acc.terms += 1;
            acc.term_bytes += term.len();
            acc.postings_bytes += list.payload_bytes();
            acc
        })
    }

    pub fn normalizer(&self) -> &N { &self.normalizer }

    pub fn store(&self) -> &IndexStore { &self.store }

    pub fn into_store(self) -> IndexStore { self.store }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::SimpleNormalizer;

    fn small_index() -> InvertedIndex<SimpleNormalizer> {
        let mut index = InvertedIndex::new(SimpleNormalizer);
        index.insert_document(1, "a b").unwrap();
        index.insert_document(2, "a").unwrap();
        index.insert_document(3, "b").unwrap();
        index
    }

    #[test]
    fn insert_appends_in_order_with_duplicates() {
        let mut index = InvertedIndex::new(SimpleNormalizer);
        index.insert_document(4, "x y x").unwrap();
        index.insert_document(2, "x").unwrap();
        assert_eq!(index.snapshot()["x"], PostingsList::Raw(vec![4, 4, 2]));
        assert_eq!(index.snapshot()["y"], PostingsList::Raw(vec![4]));
        assert_eq!(index.get_document(4), Some("x y x"));
        assert_eq!(index.get_document(9), None);
    }

    #[test]
    fn reinserting_an_id_overwrites_text() {
        let mut index = InvertedIndex::new(SimpleNormalizer);
        index.insert_document(1, "old").unwrap();
        index.insert_document(1, "new").unwrap();
        assert_eq!(index.get_document(1), Some("new"));
        assert_eq!(index.num_docs(), 1);
    }

    #[test]
    fn and_intersection() {
        let index = small_index();
        assert_eq!(index.search("a b").unwrap(), BTreeSet::from([1]));
        assert_eq!(index.search("b a").unwrap(), BTreeSet::from([1]));
        assert_eq!(index.search("a").unwrap(), BTreeSet::from([1, 2]));
        assert_eq!(index.search("a a").unwrap(), BTreeSet::from([1, 2]));
    }

    #[test]
    fn empty_query_matches_nothing() {
        let index = small_index();
        assert!(index.search("").unwrap().is_empty());
        assert!(index.search(" ,; ").unwrap().is_empty());
    }

    #[test]
    fn missing_term_is_an_error() {
        let index = small_index();
        assert_eq!(index.search("zzz"), Err(IndexError::TermNotFound("zzz".into())));
        assert_eq!(index.search("a zzz"), Err(IndexError::TermNotFound("zzz".into())));
    }

    #[test]
    fn zero_id_rejected_without_side_effects() {
        let mut index = InvertedIndex::new(SimpleNormalizer);
        let err = index.insert_document(0, "text").unwrap_err();
        assert!(matches!(err, IndexError::InvalidArgument(_)));
        assert_eq!(index.num_terms(), 0);
        assert_eq!(index.num_docs(), 0);
    }

    #[test]
    fn compress_tags_every_list() {
        let mut index = small_index();
        index.compress_index(CodecKind::Delta).unwrap();
        assert_eq!(index.compression_state(), CompressionState::Delta);
        for list in index.snapshot().values() {
            assert!(matches!(list, PostingsList::Compressed { codec: CodecKind::Delta, .. }));
        }
        // a: [1, 2] -> "1" + "0100"
        match &index.snapshot()["a"] {
            PostingsList::Compressed { bits, .. } => assert_eq!(bits.to_string(), "10100"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn second_compression_is_rejected() {
        let mut index = small_index();
        index.compress_index(CodecKind::Gamma).unwrap();
        let after_first = index.store().clone();

        let err = index.compress_index(CodecKind::Gamma).unwrap_err();
        assert!(matches!(err, IndexError::IllegalState(_)));
        assert!(matches!(index.compress_index(CodecKind::Delta), Err(IndexError::IllegalState(_))));
        assert_eq!(index.store(), &after_first);
    }

    #[test]
    fn insert_after_compression_is_rejected() {
        let mut index = small_index();
        index.compress_index(CodecKind::Gamma).unwrap();
        let before = index.store().clone();
        let err = index.insert_document(4, "a").unwrap_err();
        assert!(matches!(err, IndexError::IllegalState(_)));
        assert_eq!(index.store(), &before);
    }

    #[test]
    fn unknown_codec_name_leaves_index_untouched() {
        let mut index = small_index();
        let before = index.store().clone();
        let err = index.compress_index_named("zip").unwrap_err();
        assert!(matches!(err, IndexError::InvalidArgument(_)));
        assert_eq!(index.store(), &before);
        index.compress_index_named("gamma").unwrap();
        assert_eq!(index.compression_state(), CompressionState::Gamma);
    }

    fn raw_store(postings: &[(&str, PostingsList)], compression: CompressionState) -> IndexStore {
        IndexStore {
            postings: postings.iter().map(|(t, l)| (t.to_string(), l.clone())).collect(),
            documents: HashMap::from([(1, "a b".to_string())]),
            compression,
        }
    }

    fn gamma_list(ids: &[DocId]) -> PostingsList {
        PostingsList::Compressed { codec: CodecKind::Gamma, bits: CodecKind::Gamma.encode_all(ids).unwrap() }
    }

    #[test]
    fn from_store_accepts_consistent_stores() {
        let mut index = small_index();
        let raw = InvertedIndex::from_store(index.store().clone(), SimpleNormalizer).unwrap();
        assert_eq!(raw.search("a b").unwrap(), BTreeSet::from([1]));

        index.compress_index(CodecKind::Gamma).unwrap();
        let packed = InvertedIndex::from_store(index.into_store(), SimpleNormalizer).unwrap();
        assert_eq!(packed.search("a b").unwrap(), BTreeSet::from([1]));
    }

    #[test]
    fn from_store_rejects_mixed_representations() {
        let delta = PostingsList::Compressed { codec: CodecKind::Delta, bits: CodecKind::Delta.encode_all(&[1]).unwrap() };
        let mixed = raw_store(&[("a", PostingsList::Raw(vec![1])), ("b", delta)], CompressionState::Gamma);
        assert!(matches!(InvertedIndex::from_store(mixed, SimpleNormalizer), Err(IndexError::CorruptStore(_))));

        let wrong_codec = raw_store(&[("a", gamma_list(&[1]))], CompressionState::Delta);
        assert!(matches!(InvertedIndex::from_store(wrong_codec, SimpleNormalizer), Err(IndexError::CorruptStore(_))));
    }

    #[test]
    fn from_store_rejects_compressed_list_in_uncompressed_index() {
        // inserting into this store would otherwise touch "a" before failing on "b"
        let store = raw_store(&[("a", PostingsList::Raw(vec![1])), ("b", gamma_list(&[1]))], CompressionState::Uncompressed);
        assert!(matches!(InvertedIndex::from_store(store, SimpleNormalizer), Err(IndexError::CorruptStore(_))));
    }

    #[test]
    fn from_store_rejects_zero_ids() {
        let store = raw_store(&[("a", PostingsList::Raw(vec![1, 0]))], CompressionState::Uncompressed);
        assert!(matches!(InvertedIndex::from_store(store, SimpleNormalizer), Err(IndexError::CorruptStore(_))));

        let mut store = raw_store(&[("a", PostingsList::Raw(vec![1]))], CompressionState::Uncompressed);
        store.documents.insert(0, "zero".into());
        assert!(matches!(InvertedIndex::from_store(store, SimpleNormalizer), Err(IndexError::CorruptStore(_))));
    }

    #[test]
    fn footprint_shrinks_for_small_ids() {
        let mut index = InvertedIndex::new(SimpleNormalizer);
        for id in 1..=200 {
            index.insert_document(id, "common").unwrap();
        }
        let raw = index.footprint();
        assert_eq!(raw.postings_bytes, 200 * 4);
        index.compress_index(CodecKind::Gamma).unwrap();
        let packed = index.footprint();
        assert_eq!(packed.term_bytes, raw.term_bytes);
        assert!(packed.postings_bytes < raw.postings_bytes);
    }
}
