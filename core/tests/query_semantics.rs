use std::collections::BTreeSet;

use proptest::prelude::*;
use retrieval::boolean::{complement, difference, intersect, union, MergeList};
use retrieval::index::assign_skips;
use retrieval::ranking::tfidf;
use retrieval::tokenizer::tokenize;
use retrieval::{DocId, Indexer, ScoredPosting, SearchConfig, SearchEngine, WeightedTerm};
use tempfile::{tempdir, TempDir};

fn open_engine(docs: &[(DocId, &str)]) -> (TempDir, SearchEngine) {
    let dir = tempdir().unwrap();
    let dict_path = dir.path().join("dictionary.bin");
    let postings_path = dir.path().join("postings.bin");
    let mut indexer = Indexer::default();
    for (id, text) in docs {
        indexer.add_document(*id, tokenize(text), 1.0);
    }
    indexer.build(&dict_path, &postings_path).unwrap();
    let engine = SearchEngine::open(&dict_path, &postings_path, SearchConfig::default()).unwrap();
    (dir, engine)
}

fn sorted_ids(results: &[ScoredPosting]) -> Vec<DocId> {
    let mut ids: Vec<DocId> = results.iter().map(|p| p.doc_id).collect();
    ids.sort_unstable();
    ids
}

const PETS: &[(DocId, &str)] = &[(1, "the cat sat"), (2, "the dog sat"), (3, "cats and dogs")];

#[test]
fn boolean_queries_over_a_tiny_collection() {
    let (_dir, engine) = open_engine(PETS);
    assert_eq!(sorted_ids(&engine.search("cat OR dog").unwrap()), vec![1, 2, 3]);
    assert_eq!(sorted_ids(&engine.search("sat AND NOT dog").unwrap()), vec![1]);
    // "cats" and "dogs" stem to the query terms
    assert_eq!(sorted_ids(&engine.search("cat AND dog").unwrap()), vec![3]);
    assert_eq!(sorted_ids(&engine.search("NOT sat").unwrap()), vec![3]);
    assert_eq!(sorted_ids(&engine.search("(cat OR dog) AND sat").unwrap()), vec![1, 2]);
    assert!(engine.search("zebra AND cat").unwrap().is_empty());
}

#[test]
fn and_not_scores_do_not_depend_on_operand_order() {
    let heavy = format!("{} zeta", "alpha ".repeat(100));
    let (_dir, engine) = open_engine(&[(1, heavy.as_str()), (2, "alpha"), (3, "beta"), (4, "gamma")]);

    let fused = engine.search("alpha AND NOT beta").unwrap();
    let composed = engine.search("NOT beta AND alpha").unwrap();
    assert_eq!(fused, composed);
    assert_eq!(sorted_ids(&fused), vec![1, 2]);
}

#[test]
fn phrases_require_adjacency() {
    let (_dir, engine) = open_engine(&[(1, "the cat sat"), (2, "sat the cat"), (3, "cat dog sat")]);
    assert_eq!(sorted_ids(&engine.search("\"cat sat\" OR zebra").unwrap()), vec![1]);
    assert_eq!(sorted_ids(&engine.search("\"sat cat\" AND cat").unwrap()), vec![2]);
    assert_eq!(sorted_ids(&engine.search("\"cat dog sat\" OR zebra").unwrap()), vec![3]);
}

#[test]
fn parse_errors_surface_before_evaluation() {
    let (_dir, engine) = open_engine(PETS);
    for bad in ["cat AND", "(cat OR dog", "cat OR dog)", "\"cat sat", "()"] {
        let err = engine.search(bad).unwrap_err();
        assert!(err.is_query_error(), "{bad}: {err}");
    }
}

#[test]
fn ranking_is_monotone_in_term_frequency() {
    let (_dir, engine) = open_engine(&[
        (1, "appeal court"),
        (2, "appeal appeal court"),
        (3, "appeal appeal appeal appeal court"),
        (4, "statute"),
    ]);
    let query = tfidf::query_vector(&[WeightedTerm::new("appeal", 1.0)]);
    let scores = tfidf::score(engine.index(), &query).unwrap();
    assert!(scores[&3] > scores[&2]);
    assert!(scores[&2] > scores[&1]);
    assert!(!scores.contains_key(&4));

    let ranked = sorted_ids(&engine.search("appeal").unwrap());
    assert_eq!(ranked, vec![1, 2, 3]);
    assert_eq!(engine.search("appeal").unwrap()[0].doc_id, 3);
}

fn doc_set() -> impl Strategy<Value = BTreeSet<DocId>> {
    proptest::collection::btree_set(0u32..300, 0..120)
}

fn scored(ids: &BTreeSet<DocId>) -> Vec<ScoredPosting> {
    ids.iter().map(|&d| ScoredPosting::new(d, (d % 13) as f64)).collect()
}

fn stored(ids: &BTreeSet<DocId>) -> MergeList {
    let entries = scored(ids);
    let skips = assign_skips(entries.len(), 2);
    MergeList::stored(entries, skips)
}

fn universe_score(doc: DocId) -> f64 {
    (doc % 5) as f64 + 0.5
}

fn ids(list: &[ScoredPosting]) -> Vec<DocId> {
    list.iter().map(|p| p.doc_id).collect()
}

proptest! {
    #[test]
    fn and_matches_set_intersection(a in doc_set(), b in doc_set()) {
        let expected: Vec<DocId> = a.intersection(&b).copied().collect();
        let with_stored = intersect(&stored(&a), &stored(&b));
        let with_stride = intersect(&MergeList::with_stride(scored(&a), 2), &MergeList::plain(scored(&b)));
        let naive = intersect(&MergeList::plain(scored(&a)), &MergeList::plain(scored(&b)));
        prop_assert_eq!(ids(&with_stored), expected.clone());
        prop_assert_eq!(&with_stride, &naive);
        prop_assert_eq!(&with_stored, &naive);
        for p in &naive {
            prop_assert_eq!(p.score, (p.doc_id % 13) as f64);
        }
    }

    #[test]
    fn or_matches_set_union(a in doc_set(), b in doc_set()) {
        let expected: Vec<DocId> = a.union(&b).copied().collect();
        prop_assert_eq!(ids(&union(&scored(&a), &scored(&b))), expected);
    }

    #[test]
    fn not_and_and_not_agree(a in doc_set(), b in doc_set()) {
        let universe: Vec<ScoredPosting> = (0..300).map(|d| ScoredPosting::new(d, universe_score(d))).collect();
        let not_b = complement(&universe, &scored(&b));
        let expected_not: Vec<DocId> = (0..300).filter(|d| !b.contains(d)).collect();
        prop_assert_eq!(ids(&not_b), expected_not);

        let expected: Vec<DocId> = a.difference(&b).copied().collect();
        let fused = difference(&scored(&a), &stored(&b), universe_score);
        let composed = intersect(&MergeList::plain(scored(&a)), &MergeList::plain(not_b));
        prop_assert_eq!(ids(&fused), expected);
        prop_assert_eq!(&fused, &composed);
    }
}
