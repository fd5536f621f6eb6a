//! General utilities to make writing checks easier.

use std::cmp;
use themecheck_syntax::{MarkupNode, SyntaxNode};

/// The value of a string literal node.
pub fn string_value(node: &MarkupNode) -> Option<&str> {
    match node {
        MarkupNode::String { value, .. } => Some(value),
        _ => None,
    }
}

/// The names of the filters applied to a `{{ }}` output or a variable.
pub fn filter_names(node: &MarkupNode) -> Vec<&str> {
    let filters = match node {
        MarkupNode::LiquidVariableOutput { markup, .. } => return filter_names(markup),
        MarkupNode::LiquidVariable { filters, .. } => filters,
        _ => return vec![],
    };
    filters.iter().filter_map(MarkupNode::name).collect()
}

/// The closest ancestor of a node which is a Liquid tag with one of `names`.
pub fn enclosing_tag<'a>(lineage: &[&'a MarkupNode], names: &[&str]) -> Option<&'a MarkupNode> {
    lineage.iter().rev().copied().find(|node| {
        matches!(node, MarkupNode::LiquidTag { name, .. } if names.contains(&name.as_str()))
    })
}

/// The markup text of a tag split at its first whitespace, `x` for `capture x`.
pub fn first_word(text: &str) -> Option<&str> {
    text.split_whitespace().next()
}

/// Count every node of a tree.
pub fn node_count<N: SyntaxNode>(root: &N) -> usize {
    crate::visit::descendants(root).len()
}

/// Find the Levenshtein distance between two strings
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
    if a.is_empty() {
        return b.chars().count();
    } else if b.is_empty() {
        return a.chars().count();
    }

    let mut dcol: Vec<_> = (0..=b.len()).collect();
    let mut t_last = 0;

    for (i, sc) in a.chars().enumerate() {
        let mut current = i;
        dcol[0] = current + 1;

        for (j, tc) in b.chars().enumerate() {
            let next = dcol[j + 1];
            if sc == tc {
                dcol[j + 1] = current;
            } else {
                dcol[j + 1] = cmp::min(current, next);
                dcol[j + 1] = cmp::min(dcol[j + 1], dcol[j]) + 1;
            }
            current = next;
            t_last = j;
        }
    }
    dcol[t_last + 1]
}

/// Find the best match for a string in an iterator of strings based on levenshtein distance.
///
/// This considers a case insensitive match and the levenshtein distance with a cutoff.
pub fn find_best_match_for_name<'a>(
    iter_names: impl Iterator<Item = &'a str>,
    lookup: &str,
    dist: impl Into<Option<usize>>,
) -> Option<&'a str> {
    let max_dist = dist
        .into()
        .map_or_else(|| cmp::max(lookup.len(), 3) / 3, |d| d);
    let name_vec = iter_names.collect::<Vec<_>>();

    let (case_insensitive_match, levenshtein_match) = name_vec
        .iter()
        .filter_map(|&name| {
            let dist = levenshtein_distance(lookup, name);
            if dist <= max_dist {
                Some((name, dist))
            } else {
                None
            }
        })
        // (case_insensitive_match, (levenshtein_match, levenshtein_distance))
        .fold((None, None), |result, (candidate, dist)| {
            (
                if candidate.to_uppercase() == lookup.to_uppercase() {
                    Some(candidate)
                } else {
                    result.0
                },
                match result.1 {
                    None => Some((candidate, dist)),
                    Some((c, d)) => Some(if dist < d { (candidate, dist) } else { (c, d) }),
                },
            )
        });

    if let Some(candidate) = case_insensitive_match {
        Some(candidate)
    } else if levenshtein_match.is_some() {
        levenshtein_match.map(|x| x.0)
    } else {
        find_match_by_sorted_words(name_vec, lookup)
    }
}

fn find_match_by_sorted_words<'a>(iter_names: Vec<&'a str>, lookup: &str) -> Option<&'a str> {
    iter_names.iter().fold(None, |result, candidate| {
        if sort_by_words(candidate) == sort_by_words(lookup) {
            Some(candidate)
        } else {
            result
        }
    })
}

// splits PascalCase codes into their words
fn sort_by_words(name: &str) -> String {
    let mut words: Vec<String> = vec![];
    for c in name.chars() {
        if c == '-' || c == '_' {
            words.push(String::new());
        } else if c.is_uppercase() || words.is_empty() {
            words.push(c.to_ascii_lowercase().to_string());
        } else if let Some(word) = words.last_mut() {
            word.push(c);
        }
    }
    words.retain(|word| !word.is_empty());
    words.sort_unstable();
    words.join("_")
}
