use retrieval::tokenizer::tokenize;
use retrieval::{Indexer, SearchConfig, SearchEngine};
use std::fs;
use tempfile::tempdir;

fn build_tiny_index(dir: &std::path::Path) -> SearchEngine {
    let dict_path = dir.join("dictionary.bin");
    let postings_path = dir.join("postings.bin");
    let mut indexer = Indexer::default();
    indexer.add_document(1, tokenize("the cat sat"), 1.0);
    indexer.add_document(2, tokenize("the dog sat"), 1.0);
    indexer.add_document(3, tokenize("cats and dogs"), 1.0);
    indexer.build(&dict_path, &postings_path).unwrap();
    SearchEngine::open(&dict_path, &postings_path, SearchConfig::default()).unwrap()
}

#[test]
fn writes_one_line_per_query() {
    let dir = tempdir().unwrap();
    let engine = build_tiny_index(dir.path());

    let queries = dir.path().join("queries.txt");
    let output = dir.path().join("results/out.txt");
    fs::write(&queries, "sat AND NOT dog\n\ncat AND (dog\ncat AND dog\r\nzebra\n").unwrap();

    let answered = search::run_search(&engine, &queries, &output).unwrap();
    assert_eq!(answered, 5);

    let text = fs::read_to_string(&output).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines, vec!["1", "", "", "3", ""]);
}

#[test]
fn boolean_lines_list_every_match() {
    let dir = tempdir().unwrap();
    let engine = build_tiny_index(dir.path());
    let line = search::answer(&engine, "cat OR dog").unwrap();
    let mut ids: Vec<u32> = line.split(' ').map(|s| s.parse().unwrap()).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![1, 2, 3]);
}

#[test]
fn free_text_is_ranked() {
    let dir = tempdir().unwrap();
    let engine = build_tiny_index(dir.path());
    // doc 3 holds both stems
    let line = search::answer(&engine, "cat dog").unwrap();
    assert!(line.starts_with('3'));
    assert_eq!(line.split(' ').count(), 3);
}

#[test]
fn missing_query_file_is_an_error() {
    let dir = tempdir().unwrap();
    let engine = build_tiny_index(dir.path());
    assert!(search::run_search(&engine, &dir.path().join("nope"), &dir.path().join("out")).is_err());
}
