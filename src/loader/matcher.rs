//! Exact and fuzzy name matching between document tokens and schema names.
//!
//! The fuzzy score is the length of the longest common contiguous
//! substring of the two lower-cased names, doubled when the candidate name
//! is a prefix of the input (so abbreviations like `ref` score well
//! against `references`). A fuzzy candidate is accepted only when its
//! score strictly exceeds the session threshold; the first strict
//! improvement during the scan wins, so ties keep the earliest candidate.

/// Case-insensitive exact pass. First hit wins in candidate order.
pub(crate) fn exact_match<T: Copy>(name: &str, candidates: &[(String, T)]) -> Option<T> {
    candidates
        .iter()
        .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
        .map(|(_, payload)| *payload)
}

/// Fuzzy pass over all candidates.
pub(crate) fn fuzzy_match<T: Copy>(
    name: &str,
    candidates: &[(String, T)],
    threshold: u32,
) -> Option<T> {
    let name_lower = name.to_lowercase();
    let mut best_score = threshold as usize;
    let mut best: Option<T> = None;
    for (candidate, payload) in candidates {
        let candidate_lower = candidate.to_lowercase();
        let mut score = longest_substring(&candidate_lower, &name_lower);
        if name_lower.starts_with(&candidate_lower) {
            score *= 2;
        }
        if score > best_score {
            best_score = score;
            best = Some(*payload);
        }
    }
    best
}

/// Exact pass, falling back to the fuzzy pass when nothing matched
/// exactly. An exact hit always wins regardless of fuzzy scores.
pub(crate) fn resolve_name<T: Copy>(
    name: &str,
    candidates: &[(String, T)],
    threshold: u32,
) -> Option<T> {
    exact_match(name, candidates).or_else(|| fuzzy_match(name, candidates, threshold))
}

/// Length of the longest common contiguous substring, classic O(n*m)
/// dynamic programming over two rolling rows.
fn longest_substring(first: &str, second: &str) -> usize {
    if first.is_empty() || second.is_empty() {
        return 0;
    }
    let first: Vec<char> = first.chars().collect();
    let second: Vec<char> = second.chars().collect();

    let mut max_len = 0;
    let mut prev = vec![0usize; second.len() + 1];
    let mut row = vec![0usize; second.len() + 1];
    for i in 1..=first.len() {
        for j in 1..=second.len() {
            if first[i - 1] == second[j - 1] {
                row[j] = prev[j - 1] + 1;
                if row[j] > max_len {
                    max_len = row[j];
                }
            } else {
                row[j] = 0;
            }
        }
        std::mem::swap(&mut prev, &mut row);
        row.fill(0);
    }
    max_len
}
