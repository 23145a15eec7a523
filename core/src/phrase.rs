use crate::index::{DocId, Position, PostingList};

/// Documents where the lists' terms occur consecutively, in order, with the
/// number of occurrences. Lists are merged by advancing whichever cursor has
/// the smallest doc id; documents with no occurrence are left out.
pub fn intersect_phrase(lists: &[PostingList]) -> Vec<(DocId, u32)> {
    match lists.len() {
        0 => return Vec::new(),
        1 => return lists[0].postings().iter().map(|p| (p.doc_id, p.tf())).collect(),
        _ => {}
    }
    if lists.iter().any(PostingList::is_empty) {
        return Vec::new();
    }

    let mut cursors = vec![0usize; lists.len()];
    let mut matches = Vec::new();
    loop {
        let mut current = Vec::with_capacity(lists.len());
        for (list, &i) in lists.iter().zip(&cursors) {
            match list.postings().get(i) {
                Some(posting) => current.push(posting),
                None => return matches,
            }
        }

        let first_doc = current[0].doc_id;
        if current.iter().all(|p| p.doc_id == first_doc) {
            let positions: Vec<&[Position]> = current.iter().map(|p| p.positions.as_slice()).collect();
            let count = count_occurrences(&positions);
            if count > 0 {
                matches.push((first_doc, count));
            }
            cursors.iter_mut().for_each(|c| *c += 1);
        } else {
            let lagging = (0..current.len()).min_by_key(|&k| current[k].doc_id).unwrap_or(0);
            cursors[lagging] += 1;
        }
    }
}

/// Count start positions `p` of the first term such that term `k` occurs at
/// `p + k` for every `k`. Each position list is ascending.
pub fn count_occurrences(positions: &[&[Position]]) -> u32 {
    let Some((first, rest)) = positions.split_first() else {
        return 0;
    };
    first
        .iter()
        .filter(|&&start| {
            rest.iter()
                .enumerate()
                .all(|(k, next)| next.binary_search(&(start + k as Position + 1)).is_ok())
        })
        .count() as u32
}
