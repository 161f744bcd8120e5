use elidx_core::tokenizer::{Language, StandardNormalizer, TextNormalizer};

#[test]
fn it_normalizes_and_stems() {
    let words = StandardNormalizer::new(Language::English).normalize("Running Runners RUN! The café's menu.");
    // Stemming to "run" should appear
    assert!(words.contains(&"run".to_string()));
    assert!(words.contains(&"menu".to_string()));
}

#[test]
fn it_filters_stopwords() {
    let words = StandardNormalizer::new(Language::English).normalize("The quick brown fox and the lazy dog");
    assert!(!words.contains(&"the".to_string()));
    assert!(!words.contains(&"and".to_string()));
    assert_eq!(words.len(), 5);
}

#[test]
fn it_keeps_digits_and_splits_on_punctuation() {
    let words = StandardNormalizer::new(Language::English).normalize("x2 + y=42");
    assert_eq!(words, vec!["x2", "y", "42"]);
}

#[test]
fn russian_inflections_share_a_term() {
    let n = StandardNormalizer::new(Language::Russian);
    let a = n.normalize("Геометрия исследует свойства фигур");
    let b = n.normalize("геометрию");
    assert_eq!(b.len(), 1);
    assert!(a.contains(&b[0]));
}

#[test]
fn russian_stopwords_removed() {
    let words = StandardNormalizer::new(Language::Russian).normalize("и в на с алгебра");
    assert_eq!(words.len(), 1);
}
