// src/knowledge/matcher.rs
//! Question similarity for the knowledge base. Exact normalized match first,
//! then cheap token-overlap scoring. Embeddings are overkill for an FAQ-style
//! cache; a missed paraphrase just falls through to the live answer path.

use crate::knowledge::KnowledgeEntry;

pub const DEFAULT_MATCH_THRESHOLD: f64 = 0.85;

/// Lowercase, strip everything that is not a Unicode letter, digit, or
/// whitespace (CJK ideographs count as letters), collapse whitespace.
/// Idempotent.
pub fn normalize(text: &str) -> String {
    let stripped: String = text
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Words longer than 2 chars; shorter ones are too ambiguous to score on.
fn tokens(normalized: &str) -> Vec<&str> {
    normalized
        .split_whitespace()
        .filter(|w| w.chars().count() > 2)
        .collect()
}

/// Find the stored entry closest to `question`, or `None` if nothing clears
/// `threshold`. An exact normalized match wins outright. Otherwise each
/// entry is scored by how many question tokens appear as substrings of the
/// entry's normalized question, divided by the larger of the two token
/// counts; the best raw overlap among qualifying entries wins.
pub fn find_match<'a>(
    question: &str,
    entries: &'a [KnowledgeEntry],
    threshold: f64,
) -> Option<&'a KnowledgeEntry> {
    let nq = normalize(question);
    if nq.is_empty() {
        return None;
    }

    if let Some(exact) = entries.iter().find(|e| normalize(&e.question) == nq) {
        return Some(exact);
    }

    let q_tokens = tokens(&nq);
    if q_tokens.is_empty() {
        // All-short-word questions can only exact-match, by design.
        return None;
    }

    let mut best: Option<(&KnowledgeEntry, usize)> = None;
    for entry in entries {
        let ne = normalize(&entry.question);
        let e_token_count = tokens(&ne).len();
        let common = q_tokens.iter().filter(|t| ne.contains(**t)).count();
        let denom = q_tokens.len().max(e_token_count);
        if denom == 0 {
            continue;
        }
        let ratio = common as f64 / denom as f64;
        if ratio >= threshold && best.map_or(true, |(_, b)| common > b) {
            best = Some((entry, common));
        }
    }
    best.map(|(e, _)| e)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::types::Lang;

    fn entry(question: &str) -> KnowledgeEntry {
        KnowledgeEntry {
            id: question.to_string(),
            question: question.to_string(),
            answer: format!("answer to {question}"),
            lang: Lang::En,
            created_at: 0,
            access_count: 0,
            last_accessed: None,
        }
    }

    #[test]
    fn normalize_is_idempotent() {
        for q in [
            "What is Proof of Stake??",
            "  什么是比特币？！ ",
            "a-b_c//d",
        ] {
            let once = normalize(q);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn normalize_keeps_cjk_and_digits() {
        assert_eq!(normalize("ETH 2.0 升级!!"), "eth 20 升级");
    }

    #[test]
    fn exact_match_ignores_case_and_punctuation() {
        let entries = vec![entry("what is proof of stake?")];
        let hit = find_match("What is Proof of Stake??", &entries, 0.85);
        assert_eq!(hit.map(|e| e.id.as_str()), Some("what is proof of stake?"));
    }

    #[test]
    fn exact_match_beats_partial_overlap() {
        let entries = vec![
            entry("how does bitcoin mining work exactly"),
            entry("how does bitcoin mining work"),
        ];
        let hit = find_match("How does bitcoin mining work!", &entries, 0.5).unwrap();
        assert_eq!(hit.question, "how does bitcoin mining work");
    }

    #[test]
    fn one_differing_token_misses_at_default_threshold() {
        let entries = vec![entry("how does bitcoin mining work")];
        assert!(find_match("how does ethereum mining work", &entries, 0.85).is_none());
    }

    #[test]
    fn near_identical_question_matches() {
        // 7 of 8 qualifying tokens overlap: 0.875 clears the 0.85 bar.
        let entries = vec![entry("how does bitcoin mining difficulty adjustment work today")];
        let hit = find_match(
            "how does bitcoin mining difficulty adjustment work now",
            &entries,
            0.85,
        );
        assert!(hit.is_some());
    }

    #[test]
    fn short_word_question_only_exact_matches() {
        let entries = vec![entry("is it up")];
        assert!(find_match("is it up", &entries, 0.85).is_some());
        assert!(find_match("it is up", &entries, 0.85).is_none());
    }
}
