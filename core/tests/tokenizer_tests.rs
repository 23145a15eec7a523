use retrieval::tokenizer::tokenize;
use retrieval::ALL_DOCS;

#[test]
fn it_normalizes_and_stems() {
    let words = tokenize("Running Runners RUN! The café's menu.");
    assert!(words.contains(&"run".to_string()));
    // NFKC keeps the accent; lowercase folds the case
    assert!(words.iter().any(|w| w.starts_with("café")));
}

#[test]
fn it_filters_stopwords() {
    let words = tokenize("The quick brown fox and the lazy dog");
    assert!(!words.contains(&"the".to_string()));
    assert!(!words.contains(&"and".to_string()));
    assert_eq!(words.len(), 5);
}

#[test]
fn positions_are_consecutive_over_kept_terms() {
    let words = tokenize("appeal of the decision of the court");
    assert_eq!(words, vec!["appeal", "decis", "court"]);
}

#[test]
fn universe_term_cannot_be_produced() {
    assert!(!tokenize(ALL_DOCS).iter().any(|w| w == ALL_DOCS));
    assert!(tokenize("$ $$ 123").is_empty());
}
