//! Street-name normalization and fuzzy matching against dropdown options.
//!
//! Legacy itinerary entries are free text typed by humans; the new form
//! only accepts streets from a cascading dropdown. Matching runs in two
//! layers: a cheap qualification test on long tokens, then a token-set
//! overlap score over all tokens. A candidate can pass qualification and
//! still lose on score (abbreviated entries like "R. 7 de Setembro" do).

use std::collections::HashSet;

use crate::models::{MatchResult, StreetCandidate};

/// Fraction of one side's long tokens that must overlap for a candidate
/// to qualify for scoring.
pub const TOKEN_OVERLAP_THRESHOLD: f64 = 0.7;

/// Scores must be strictly above this to accept a fuzzy match.
pub const MIN_ACCEPT_SCORE: f64 = 0.5;

/// Connective words dropped during normalization. Space-delimited so only
/// whole words are removed; applied in this order.
const STOP_WORDS: &[&str] = &[
    " da ", " de ", " do ", " das ", " dos ", " e ", " em ", " na ", " no ",
];

/// Lower-case, drop connective words, collapse whitespace.
pub fn normalize(text: &str) -> String {
    let mut out = text.to_lowercase().trim().to_string();
    for stop in STOP_WORDS {
        out = out.replace(stop, " ");
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Tokens that participate in qualification (three or more characters).
fn long_tokens(normalized: &str) -> Vec<&str> {
    normalized
        .split_whitespace()
        .filter(|t| t.chars().count() > 2)
        .collect()
}

/// How many tokens in `from` have a counterpart in `against`, where a
/// counterpart is a token containing or contained by it.
fn overlap_count(from: &[&str], against: &[&str]) -> usize {
    from.iter()
        .copied()
        .filter(|tok| against.iter().any(|other| tok.contains(other) || other.contains(*tok)))
        .count()
}

/// Whether two street names plausibly refer to the same street.
///
/// Normalized equality always qualifies. Otherwise at least 70% of the
/// long tokens on one side (either side) must overlap the other.
pub fn streets_alike(a: &str, b: &str) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    let norm_a = normalize(a);
    let norm_b = normalize(b);
    if norm_a == norm_b {
        return true;
    }

    let tokens_a = long_tokens(&norm_a);
    let tokens_b = long_tokens(&norm_b);
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return false;
    }

    let forward = overlap_count(&tokens_a, &tokens_b);
    if forward as f64 >= tokens_a.len() as f64 * TOKEN_OVERLAP_THRESHOLD {
        return true;
    }
    let reverse = overlap_count(&tokens_b, &tokens_a);
    reverse as f64 >= tokens_b.len() as f64 * TOKEN_OVERLAP_THRESHOLD
}

/// Match one itinerary entry against the street dropdown options.
///
/// An exact label match (trimmed, case-insensitive) wins immediately with
/// score 1.0. Otherwise qualifying candidates are scored by shared
/// normalized tokens over the larger token set, and the best score wins
/// when strictly above [`MIN_ACCEPT_SCORE`]. Ties keep the earliest
/// option. Candidates with an empty label or value never participate.
pub fn match_street(target: &str, candidates: &[StreetCandidate]) -> MatchResult {
    let wanted = target.trim();
    if wanted.is_empty() {
        return MatchResult::NoMatch;
    }

    let wanted_lower = wanted.to_lowercase();
    for cand in candidates {
        let label = cand.label.trim();
        if label.is_empty() || cand.value.is_empty() {
            continue;
        }
        if label.to_lowercase() == wanted_lower {
            return MatchResult::Match {
                value: cand.value.clone(),
                score: 1.0,
            };
        }
    }

    let norm_target = normalize(wanted);
    let target_set: HashSet<&str> = norm_target.split_whitespace().collect();

    let mut best: Option<(String, f64)> = None;
    for cand in candidates {
        let label = cand.label.trim();
        if label.is_empty() || cand.value.is_empty() {
            continue;
        }
        if !streets_alike(wanted, label) {
            continue;
        }

        let norm_label = normalize(label);
        let label_set: HashSet<&str> = norm_label.split_whitespace().collect();
        let shared = target_set.intersection(&label_set).count();
        let denom = target_set.len().max(label_set.len()).max(1);
        let score = shared as f64 / denom as f64;

        match &best {
            Some((_, best_score)) if score <= *best_score => {}
            _ => best = Some((cand.value.clone(), score)),
        }
    }

    match best {
        Some((value, score)) if score > MIN_ACCEPT_SCORE => MatchResult::Match { value, score },
        _ => MatchResult::NoMatch,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cands(pairs: &[(&str, &str)]) -> Vec<StreetCandidate> {
        pairs
            .iter()
            .map(|(label, value)| StreetCandidate::new(label, value))
            .collect()
    }

    #[test]
    fn test_normalize_drops_connectives() {
        assert_eq!(normalize("Rua DA Paz"), "rua paz");
        assert_eq!(normalize("Avenida das Flores"), "avenida flores");
        assert_eq!(normalize("Travessa de São João"), "travessa são joão");
    }

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize("  Rua   XV   de  Novembro "), "rua xv novembro");
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("   "), "");
    }

    #[test]
    fn test_normalize_idempotent() {
        for name in [
            "Rua da Paz",
            "Avenida Getúlio Vargas",
            "SC-401 km 5",
            "Rua dos Imigrantes em Joinville",
        ] {
            let once = normalize(name);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn test_alike_normalized_equality() {
        assert!(streets_alike("Rua da Paz", "RUA PAZ"));
        assert!(streets_alike("Avenida das Flores", "avenida  flores"));
    }

    #[test]
    fn test_alike_rejects_empty() {
        assert!(!streets_alike("", "Rua A"));
        assert!(!streets_alike("Rua A", ""));
    }

    #[test]
    fn test_alike_needs_long_tokens() {
        // only short tokens left after normalization, no equality
        assert!(!streets_alike("R. X", "Av Y"));
    }

    #[test]
    fn test_exact_match_wins_over_partial() {
        let result = match_street(
            "Rua XV de Novembro",
            &cands(&[
                ("Rua XV", "901"),
                ("  rua xv de novembro ", "902"),
                ("Rua XV de Novembro Norte", "903"),
            ]),
        );
        assert_eq!(
            result,
            MatchResult::Match {
                value: "902".to_string(),
                score: 1.0
            }
        );
    }

    #[test]
    fn test_overlap_boundary_accepts_seven_of_ten() {
        // 7 of the 10 target tokens overlap, exactly the 0.7 cutoff
        let target = "alfa bravo carlos delta eco foxtrot golfe hotel india julieta";
        let result = match_street(
            target,
            &cands(&[("alfa bravo carlos delta eco foxtrot golfe", "55")]),
        );
        assert_eq!(
            result,
            MatchResult::Match {
                value: "55".to_string(),
                score: 0.7
            }
        );
    }

    #[test]
    fn test_overlap_boundary_rejects_six_of_ten() {
        let target = "alfa bravo carlos delta eco foxtrot golfe hotel india julieta";
        let result = match_street(
            target,
            &cands(&[(
                "alfa bravo carlos delta eco foxtrot kilo lima mike november",
                "56",
            )]),
        );
        assert_eq!(result, MatchResult::NoMatch);
    }

    #[test]
    fn test_qualified_but_low_score_rejected() {
        // "R. 7 de Setembro" qualifies through its single long token but
        // shares only one of three tokens when scored
        let result = match_street(
            "Rua Sete de Setembro",
            &cands(&[("R. 7 de Setembro", "77")]),
        );
        assert_eq!(result, MatchResult::NoMatch);
    }

    #[test]
    fn test_tie_keeps_first_candidate() {
        let result = match_street(
            "alfa bravo carlos delta",
            &cands(&[
                ("alfa bravo carlos xray", "11"),
                ("alfa bravo carlos yankee", "22"),
            ]),
        );
        assert_eq!(
            result,
            MatchResult::Match {
                value: "11".to_string(),
                score: 0.75
            }
        );
    }

    #[test]
    fn test_skips_empty_labels_and_values() {
        let result = match_street("Rua A", &cands(&[("", "1"), ("Rua A", "")]));
        assert_eq!(result, MatchResult::NoMatch);
    }

    #[test]
    fn test_empty_target_and_empty_list() {
        assert_eq!(match_street("", &cands(&[("Rua A", "1")])), MatchResult::NoMatch);
        assert_eq!(match_street("Rua A", &[]), MatchResult::NoMatch);
    }
}
