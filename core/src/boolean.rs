//! Stack-machine evaluation of postfix boolean queries.
//!
//! Operands are terms and phrases, resolved against the index, or lists
//! already produced by an earlier operator. Terms carry the skip pointers
//! written at flush time; intermediate lists get an ad-hoc
//! `floor(sqrt(len))` stride when they are merged.

use std::collections::BTreeSet;

use tracing::debug;

use crate::error::{Result, SearchError};
use crate::index::{log_tf, skip_stride, DocId, ScoredPosting};
use crate::phrase::intersect_phrase;
use crate::query::{Operator, PostfixItem};
use crate::reader::IndexReader;

/// A query operand
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// A single normalized term
    Term(String),
    /// Normalized terms that must occur consecutively
    Phrase(Vec<String>),
    /// Output of an earlier operator
    Materialized(Vec<ScoredPosting>),
}

impl Operand {
    /// Stable key naming a literal operand, `None` for intermediate results.
    pub fn key(&self) -> Option<String> {
        match self {
            Operand::Term(term) => Some(term.clone()),
            Operand::Phrase(terms) => Some(terms.join(" ")),
            Operand::Materialized(_) => None,
        }
    }

    /// Normalized terms a literal operand is made of.
    pub fn terms(&self) -> &[String] {
        match self {
            Operand::Term(term) => std::slice::from_ref(term),
            Operand::Phrase(terms) => terms,
            Operand::Materialized(_) => &[],
        }
    }
}

/// One instruction of a compiled postfix query
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Operand(Operand),
    Operator(Operator),
}

/// Normalize the operands of a parsed query. A word that normalizes to
/// several terms becomes a phrase; one that normalizes to nothing (a
/// stopword) matches no document.
pub fn compile<F>(postfix: Vec<PostfixItem>, analyze: F) -> Vec<Step>
where
    F: Fn(&str) -> Vec<String>,
{
    postfix
        .into_iter()
        .map(|item| match item {
            PostfixItem::Operator(op) => Step::Operator(op),
            PostfixItem::Term(raw) | PostfixItem::Phrase(raw) => {
                let mut terms = analyze(&raw);
                Step::Operand(match terms.len() {
                    0 => Operand::Materialized(Vec::new()),
                    1 => Operand::Term(terms.remove(0)),
                    _ => Operand::Phrase(terms),
                })
            }
        })
        .collect()
}

/// Literal operands that are not under an odd number of NOTs, deduplicated,
/// in query order. These are what the ranking models score.
pub fn positive_operands(steps: &[Step]) -> Vec<Operand> {
    // each stack slot holds the literal operands of one subexpression
    let mut stack: Vec<Vec<(usize, bool)>> = Vec::new();
    for (i, step) in steps.iter().enumerate() {
        match step {
            Step::Operand(_) => stack.push(vec![(i, false)]),
            Step::Operator(Operator::Not) => {
                if let Some(top) = stack.last_mut() {
                    top.iter_mut().for_each(|(_, negated)| *negated = !*negated);
                }
            }
            Step::Operator(_) => {
                let right = stack.pop().unwrap_or_default();
                let left = stack.last_mut();
                match left {
                    Some(left) => left.extend(right),
                    None => stack.push(right),
                }
            }
        }
    }

    let mut seen = BTreeSet::new();
    let mut positive: Vec<(usize, Operand)> = Vec::new();
    for (i, negated) in stack.into_iter().flatten() {
        if negated {
            continue;
        }
        if let Step::Operand(operand) = &steps[i] {
            if let Some(key) = operand.key() {
                if seen.insert(key) {
                    positive.push((i, operand.clone()));
                }
            }
        }
    }
    positive.sort_by_key(|(i, _)| *i);
    positive.into_iter().map(|(_, operand)| operand).collect()
}

/// How a merge may jump ahead in one of its inputs
#[derive(Debug, Clone, PartialEq)]
pub enum SkipPointers {
    /// Pointers stored with a term's posting list
    Stored(Vec<Option<u32>>),
    /// Implicit pointers every `stride` entries; 0 disables them
    Stride(usize),
    Disabled,
}

impl SkipPointers {
    fn target(&self, i: usize) -> Option<usize> {
        match self {
            SkipPointers::Stored(skips) => skips.get(i).copied().flatten().map(|t| t as usize),
            SkipPointers::Stride(stride) if *stride > 0 && i % stride == 0 => Some(i + stride),
            _ => None,
        }
    }
}

/// A sorted result list together with its skip pointers.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeList {
    pub entries: Vec<ScoredPosting>,
    pub skips: SkipPointers,
}

impl MergeList {
    pub fn stored(entries: Vec<ScoredPosting>, skips: Vec<Option<u32>>) -> Self {
        Self { entries, skips: SkipPointers::Stored(skips) }
    }

    pub fn with_stride(entries: Vec<ScoredPosting>, min_stride: usize) -> Self {
        let stride = skip_stride(entries.len(), min_stride);
        Self { entries, skips: SkipPointers::Stride(stride) }
    }

    pub fn plain(entries: Vec<ScoredPosting>) -> Self {
        Self { entries, skips: SkipPointers::Disabled }
    }

    /// Index to continue from when the doc at `i` is behind `target_doc`.
    fn advance(&self, i: usize, target_doc: u32) -> usize {
        match self.skips.target(i) {
            Some(t) if t < self.entries.len() && self.entries[t].doc_id <= target_doc => t,
            _ => i + 1,
        }
    }
}

/// Intersection; each match is scored with the smaller of its two scores.
pub fn intersect(a: &MergeList, b: &MergeList) -> Vec<ScoredPosting> {
    let (mut i, mut j) = (0, 0);
    let mut result = Vec::new();
    while i < a.entries.len() && j < b.entries.len() {
        let (x, y) = (a.entries[i], b.entries[j]);
        if x.doc_id == y.doc_id {
            result.push(ScoredPosting::new(x.doc_id, x.score.min(y.score)));
            i += 1;
            j += 1;
        } else if x.doc_id < y.doc_id {
            i = a.advance(i, y.doc_id);
        } else {
            j = b.advance(j, x.doc_id);
        }
    }
    result
}

/// Union; on a shared doc id the entry from `a` is kept.
pub fn union(a: &[ScoredPosting], b: &[ScoredPosting]) -> Vec<ScoredPosting> {
    let (mut i, mut j) = (0, 0);
    let mut result = Vec::with_capacity(a.len().max(b.len()));
    while i < a.len() && j < b.len() {
        if a[i].doc_id == b[j].doc_id {
            result.push(a[i]);
            i += 1;
            j += 1;
        } else if a[i].doc_id < b[j].doc_id {
            result.push(a[i]);
            i += 1;
        } else {
            result.push(b[j]);
            j += 1;
        }
    }
    result.extend_from_slice(&a[i..]);
    result.extend_from_slice(&b[j..]);
    result
}

/// Universe entries whose doc id does not appear in `excluded`.
pub fn complement(universe: &[ScoredPosting], excluded: &[ScoredPosting]) -> Vec<ScoredPosting> {
    let mut j = 0;
    let mut result = Vec::with_capacity(universe.len().saturating_sub(excluded.len()));
    for entry in universe {
        while j < excluded.len() && excluded[j].doc_id < entry.doc_id {
            j += 1;
        }
        if j < excluded.len() && excluded[j].doc_id == entry.doc_id {
            j += 1;
        } else {
            result.push(*entry);
        }
    }
    result
}

/// `a AND NOT b` in one pass, jumping through `b` with its skip pointers.
/// Each kept entry scores `min(a, universe)` like the unfused intersection
/// with the complement; `universe_score` gives a document's universe score.
pub fn difference<F>(a: &[ScoredPosting], b: &MergeList, universe_score: F) -> Vec<ScoredPosting>
where
    F: Fn(DocId) -> f64,
{
    let keep = |x: ScoredPosting| ScoredPosting::new(x.doc_id, x.score.min(universe_score(x.doc_id)));
    let (mut i, mut j) = (0, 0);
    let mut result = Vec::with_capacity(a.len());
    while i < a.len() && j < b.entries.len() {
        let (x, y) = (a[i], b.entries[j]);
        if x.doc_id == y.doc_id {
            i += 1;
            j += 1;
        } else if x.doc_id < y.doc_id {
            result.push(keep(x));
            i += 1;
        } else {
            j = b.advance(j, x.doc_id);
        }
    }
    result.extend(a[i..].iter().copied().map(keep));
    result
}

/// Evaluates compiled postfix queries against an open index.
pub struct BooleanEvaluator<'a> {
    index: &'a IndexReader,
    min_skip_stride: usize,
}

impl<'a> BooleanEvaluator<'a> {
    pub fn new(index: &'a IndexReader, min_skip_stride: usize) -> Self {
        Self { index, min_skip_stride }
    }

    /// Scored documents of a single operand.
    pub fn resolve(&self, operand: Operand) -> Result<Vec<ScoredPosting>> {
        Ok(self.merge_list(operand)?.entries)
    }

    fn merge_list(&self, operand: Operand) -> Result<MergeList> {
        match operand {
            Operand::Term(term) => {
                let list = self.index.posting_list(&term)?;
                Ok(MergeList::stored(self.index.scored(&list), list.skips().to_vec()))
            }
            Operand::Phrase(terms) => {
                let lists = terms
                    .iter()
                    .map(|t| self.index.posting_list(t))
                    .collect::<Result<Vec<_>>>()?;
                let dictionary = self.index.dictionary();
                let entries = intersect_phrase(&lists)
                    .into_iter()
                    .map(|(doc_id, count)| {
                        let tf = count as f64 * dictionary.importance_weight(doc_id);
                        ScoredPosting::new(doc_id, log_tf(tf))
                    })
                    .collect();
                Ok(MergeList::with_stride(entries, self.min_skip_stride))
            }
            Operand::Materialized(entries) => Ok(MergeList::with_stride(entries, self.min_skip_stride)),
        }
    }

    pub fn evaluate(&self, steps: Vec<Step>) -> Result<Vec<ScoredPosting>> {
        let mut stack: Vec<Operand> = Vec::new();
        let mut steps = steps.into_iter().peekable();

        while let Some(step) = steps.next() {
            let result = match step {
                Step::Operand(operand) => {
                    stack.push(operand);
                    continue;
                }
                Step::Operator(Operator::Not) => {
                    let negated = pop(&mut stack, Operator::Not)?;
                    let fuse_and = matches!(steps.peek(), Some(Step::Operator(Operator::And))) && !stack.is_empty();
                    if fuse_and {
                        steps.next();
                        let kept = pop(&mut stack, Operator::And)?;
                        let kept = self.resolve(kept)?;
                        let dictionary = self.index.dictionary();
                        difference(&kept, &self.merge_list(negated)?, |doc| {
                            log_tf(dictionary.importance_weight(doc))
                        })
                    } else {
                        let excluded = self.resolve(negated)?;
                        complement(&self.index.universe()?, &excluded)
                    }
                }
                Step::Operator(Operator::And) => {
                    let right = pop(&mut stack, Operator::And)?;
                    let left = pop(&mut stack, Operator::And)?;
                    intersect(&self.merge_list(left)?, &self.merge_list(right)?)
                }
                Step::Operator(Operator::Or) => {
                    let right = pop(&mut stack, Operator::Or)?;
                    let left = pop(&mut stack, Operator::Or)?;
                    union(&self.resolve(left)?, &self.resolve(right)?)
                }
            };
            debug!(hits = result.len(), "applied operator");
            stack.push(Operand::Materialized(result));
        }

        let last = stack.pop().ok_or_else(|| SearchError::MalformedQuery("no operands".into()))?;
        if !stack.is_empty() {
            return Err(SearchError::MalformedQuery(format!("{} operands left unconsumed", stack.len())));
        }
        self.resolve(last)
    }
}

fn pop(stack: &mut Vec<Operand>, op: Operator) -> Result<Operand> {
    stack
        .pop()
        .ok_or_else(|| SearchError::MalformedQuery(format!("{} is missing an operand", op.as_str())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::parse;

    fn scored(ids: &[u32]) -> Vec<ScoredPosting> {
        ids.iter().map(|&d| ScoredPosting::new(d, d as f64)).collect()
    }

    fn ids(list: &[ScoredPosting]) -> Vec<u32> {
        list.iter().map(|p| p.doc_id).collect()
    }

    #[test]
    fn intersect_takes_min_score() {
        let a = MergeList::plain(vec![ScoredPosting::new(1, 0.5), ScoredPosting::new(4, 2.0)]);
        let b = MergeList::plain(vec![ScoredPosting::new(1, 0.9), ScoredPosting::new(2, 1.0), ScoredPosting::new(4, 1.5)]);
        assert_eq!(intersect(&a, &b), vec![ScoredPosting::new(1, 0.5), ScoredPosting::new(4, 1.5)]);
    }

    #[test]
    fn skip_pointers_jump_over_runs() {
        let long: Vec<u32> = (0..100).collect();
        let a = MergeList::with_stride(scored(&long), 2);
        let b = MergeList::plain(scored(&[55, 99]));
        assert_eq!(ids(&intersect(&a, &b)), vec![55, 99]);
        assert_eq!(ids(&intersect(&b, &a)), vec![55, 99]);
    }

    #[test]
    fn union_prefers_first_operand() {
        let a = vec![ScoredPosting::new(2, 1.0)];
        let b = vec![ScoredPosting::new(1, 3.0), ScoredPosting::new(2, 9.0)];
        assert_eq!(union(&a, &b), vec![ScoredPosting::new(1, 3.0), ScoredPosting::new(2, 1.0)]);
    }

    #[test]
    fn complement_and_difference_agree() {
        let universe: Vec<ScoredPosting> = (1..=9).map(|d| ScoredPosting::new(d, 1.5)).collect();
        let a = scored(&[1, 2, 3, 5, 8]);
        let b = scored(&[3, 4, 8, 9]);
        let not_b = complement(&universe, &b);
        assert_eq!(ids(&not_b), vec![1, 2, 5, 6, 7]);
        let fused = difference(&a, &MergeList::with_stride(b, 2), |_| 1.5);
        let naive = intersect(&MergeList::plain(a), &MergeList::plain(not_b));
        assert_eq!(ids(&fused), vec![1, 2, 5]);
        // scores are capped by the universe exactly as in the unfused merge
        assert_eq!(fused, naive);
        assert_eq!(fused[0].score, 1.0);
        assert_eq!(fused[1].score, 1.5);
    }

    fn compile_plain(query: &str) -> Vec<Step> {
        compile(parse(query).unwrap(), |raw| {
            raw.split_whitespace().map(str::to_string).collect()
        })
    }

    #[test]
    fn compile_splits_phrases() {
        let steps = compile_plain("\"court appeal\" AND costs");
        assert_eq!(steps[0], Step::Operand(Operand::Phrase(vec!["court".into(), "appeal".into()])));
        assert_eq!(steps[1], Step::Operand(Operand::Term("costs".into())));
    }

    #[test]
    fn positive_operands_skip_negated_subtrees() {
        let steps = compile_plain("a AND NOT (b OR c) AND NOT NOT d OR a");
        let keys: Vec<String> = positive_operands(&steps).iter().filter_map(Operand::key).collect();
        assert_eq!(keys, vec!["a", "d"]);
    }
}
