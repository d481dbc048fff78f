//! Pairwise folder-name scoring.
//!
//! Four tiers are evaluated in priority order and the first one that fires
//! decides the score:
//!
//! | Tier          | Score                     |
//! |---------------|---------------------------|
//! | exact prefix  | 100                       |
//! | normalized    | 90                        |
//! | token         | 70 × Jaccard              |
//! | fuzzy         | 50 + 20 × similarity (<70)|

use ahash::AHashSet;
use similar::TextDiff;

use crate::model::MatchReason;

pub const EXACT_PREFIX_SCORE: f64 = 100.0;
pub const NORMALIZED_SCORE: f64 = 90.0;
pub const TOKEN_SCORE: f64 = 70.0;
pub const FUZZY_BASE: f64 = 50.0;
pub const FUZZY_SPAN: f64 = 20.0;
/// Minimum token-sort similarity for the fuzzy tier to fire.
pub const FUZZY_FLOOR: f64 = 0.8;
const FUZZY_CEILING: f64 = 69.99;

/// Trailing name tokens that mark a copy of a folder rather than a new entity.
pub const BACKUP_SUFFIXES: &[&str] = &[
    "backup", "backups", "bak", "old", "copy", "orig", "archive", "newspace",
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairScore {
    pub score: f64,
    pub reason: MatchReason,
}

type TierFn = fn(&str, &str) -> Option<f64>;

const TIERS: [(MatchReason, TierFn); 4] = [
    (MatchReason::ExactPrefix, exact_prefix),
    (MatchReason::Normalized, normalized),
    (MatchReason::Token, token),
    (MatchReason::Fuzzy, fuzzy),
];

/// Score two folder names. `None` means no tier fired (score 0).
pub fn score_pair(a: &str, b: &str) -> Option<PairScore> {
    TIERS.iter().find_map(|(reason, tier)| {
        tier(a, b)
            .filter(|score| *score > 0.0)
            .map(|score| PairScore {
                score,
                reason: *reason,
            })
    })
}

/// Name delimiters: `-`, `_`, `.` and a plain space. Tabs and other
/// whitespace are part of the name.
pub fn is_delimiter(c: char) -> bool {
    matches!(c, '-' | '_' | '.' | ' ')
}

/// Tier 1: one name is the other, or a prefix of it ending at a delimiter.
/// `comp1` does not prefix `comp10`.
pub fn exact_prefix(a: &str, b: &str) -> Option<f64> {
    let (shorter, longer) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    if shorter.is_empty() || !longer.starts_with(shorter) {
        return None;
    }
    if longer.len() == shorter.len() {
        return Some(EXACT_PREFIX_SCORE);
    }
    let next = longer[shorter.len()..].chars().next()?;
    is_delimiter(next).then_some(EXACT_PREFIX_SCORE)
}

/// Tier 2: equal after [`normalize_name`].
pub fn normalized(a: &str, b: &str) -> Option<f64> {
    let left = normalize_name(a);
    if left.is_empty() {
        return None;
    }
    (left == normalize_name(b)).then_some(NORMALIZED_SCORE)
}

/// Tier 3: Jaccard overlap of case/digit-aware token sets.
pub fn token(a: &str, b: &str) -> Option<f64> {
    let left: AHashSet<String> = tokenize(a).into_iter().collect();
    let right: AHashSet<String> = tokenize(b).into_iter().collect();

    let union = left.union(&right).count();
    let intersection = left.intersection(&right).count();
    if union == 0 || intersection == 0 {
        return None;
    }
    Some(TOKEN_SCORE * intersection as f64 / union as f64)
}

/// Tier 4: edit similarity of the token-sorted names, mapped into [50, 70).
pub fn fuzzy(a: &str, b: &str) -> Option<f64> {
    let left = token_sort_key(a);
    let right = token_sort_key(b);
    if left.is_empty() && right.is_empty() {
        return None;
    }

    let similarity = f64::from(TextDiff::from_chars(left.as_str(), right.as_str()).ratio());
    if similarity < FUZZY_FLOOR {
        return None;
    }
    Some((FUZZY_BASE + FUZZY_SPAN * similarity).min(FUZZY_CEILING))
}

/// Lower-case, collapse delimiter runs into one space, and drop the trailing
/// run of numbering and backup-marker tokens.
///
/// `Computer-01_backup.2` and `computer-01` both become `computer`, so
/// `server-1` and `server-2` normalise alike. A name made only of such tokens,
/// like `192.168.1.5` or `backup`, is kept whole.
pub fn normalize_name(name: &str) -> String {
    let lowered = name.to_lowercase();
    let tokens: Vec<&str> = lowered.split(is_delimiter).filter(|t| !t.is_empty()).collect();
    let keep = suffix_start(&tokens);
    tokens[..keep].join(" ")
}

fn suffix_start(tokens: &[&str]) -> usize {
    let mut run_start = tokens.len();
    while run_start > 0 {
        let t = tokens[run_start - 1];
        if is_backup_suffix(t) || is_digits(t) {
            run_start -= 1;
        } else {
            break;
        }
    }

    // never strip a name down to nothing
    if run_start > 0 {
        run_start
    } else {
        tokens.len()
    }
}

fn is_backup_suffix(token: &str) -> bool {
    let stem = token.trim_end_matches(|c: char| c.is_ascii_digit());
    BACKUP_SUFFIXES.contains(&stem)
}

fn is_digits(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_digit())
}

/// Split on non-alphanumerics and on lower→upper and letter↔digit boundaries.
/// `ServerWeb01-old` yields `server`, `web`, `01`, `old`.
pub fn tokenize(name: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for piece in name.split(|c: char| !c.is_alphanumeric()) {
        let mut current = String::new();
        let mut prev: Option<char> = None;
        for c in piece.chars() {
            if let Some(p) = prev {
                if is_token_boundary(p, c) && !current.is_empty() {
                    tokens.push(current.to_lowercase());
                    current.clear();
                }
            }
            current.push(c);
            prev = Some(c);
        }
        if !current.is_empty() {
            tokens.push(current.to_lowercase());
        }
    }
    tokens
}

fn is_token_boundary(prev: char, next: char) -> bool {
    (prev.is_lowercase() && next.is_uppercase())
        || (prev.is_alphabetic() && next.is_numeric())
        || (prev.is_numeric() && next.is_alphabetic())
}

fn token_sort_key(name: &str) -> String {
    let lowered = name.to_lowercase();
    let mut words: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    words.sort_unstable();
    words.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn reason(a: &str, b: &str) -> Option<MatchReason> {
        score_pair(a, b).map(|s| s.reason)
    }

    #[test]
    fn test_exact_prefix_with_delimiters() {
        for (short, long) in [
            ("abc", "abc-def"),
            ("abc", "abc.def"),
            ("abc", "abc_def"),
            ("abc", "abc def"),
            ("test", "test-backup-2024"),
            ("data", "data.old.archive"),
            ("135897-ntp", "135897-ntp.newspace"),
        ] {
            let score = score_pair(short, long).unwrap();
            assert_eq!(score.score, 100.0, "{} vs {}", short, long);
            assert_eq!(score.reason, MatchReason::ExactPrefix);
        }
    }

    #[test]
    fn test_exact_prefix_needs_boundary() {
        assert_eq!(exact_prefix("comp1", "comp10"), None);
        assert_eq!(exact_prefix("abc", "abcdef"), None);
        assert_eq!(reason("abc", "abcdef"), None);
    }

    #[test]
    fn test_identical_names_are_exact() {
        assert_eq!(exact_prefix("identical-folder", "identical-folder"), Some(100.0));
    }

    #[test]
    fn test_normalized_delimiter_variants() {
        let score = score_pair("192.168.1.5-computer02", "192.168.1.5 computer02").unwrap();
        assert_eq!(score.reason, MatchReason::Normalized);
        assert_eq!(score.score, 90.0);

        for (a, b) in [("my-folder", "my folder"), ("my_folder", "my-folder"), ("a-b-c", "a b c")] {
            assert_eq!(reason(a, b), Some(MatchReason::Normalized), "{} vs {}", a, b);
        }
    }

    #[test]
    fn test_normalized_ignores_case() {
        assert_eq!(reason("Server-Main", "server_main"), Some(MatchReason::Normalized));
    }

    #[test]
    fn test_normalize_strips_backup_suffix_run() {
        assert_eq!(normalize_name("computer-01-backup"), "computer");
        assert_eq!(normalize_name("Computer-01_backup.2"), "computer");
        assert_eq!(normalize_name("computer-01.old"), "computer");
        assert_eq!(normalize_name("host-NEWSPACE"), "host");
        assert_eq!(normalize_name("data_01 copy1"), "data");
    }

    #[test]
    fn test_normalize_strips_plain_numbering() {
        assert_eq!(normalize_name("computer-01"), "computer");
        assert_eq!(normalize_name("data-01"), normalize_name("data-02"));
        assert_eq!(normalize_name("backup-2024-old"), "backup 2024 old");
        assert_eq!(normalize_name("host-2024-x"), "host 2024 x");
    }

    #[test]
    fn test_numbered_siblings_score_normalized() {
        let score = score_pair("server-1", "server-2").unwrap();
        assert_eq!(score.reason, MatchReason::Normalized);
        assert_eq!(score.score, 90.0);
        assert_eq!(reason("data-01", "data_02"), Some(MatchReason::Normalized));
    }

    #[test]
    fn test_normalize_never_empties_a_name() {
        assert_eq!(normalize_name("backup"), "backup");
        assert_eq!(normalize_name("2024"), "2024");
        assert_eq!(normalize_name("192.168.1.5"), "192 168 1 5");
        assert_eq!(normalize_name("---"), "");
        assert_ne!(normalize_name("192.168.1.5"), normalize_name("192.168.1.6"));
    }

    #[test]
    fn test_only_plain_space_is_whitespace_delimiter() {
        assert!(is_delimiter(' '));
        assert!(!is_delimiter('\t'));
        assert!(!is_delimiter('\u{3000}'));
        assert_eq!(exact_prefix("abc", "abc\tdef"), None);
        assert_eq!(normalize_name("my\tfolder"), "my\tfolder");
    }

    #[test]
    fn test_backup_variants_match_each_other() {
        let score = score_pair("computer-01-backup", "computer-01.old").unwrap();
        assert_eq!(score.reason, MatchReason::Normalized);
    }

    #[test]
    fn test_tokenize_boundaries() {
        assert_eq!(tokenize("ServerWeb01-old"), vec!["server", "web", "01", "old"]);
        assert_eq!(tokenize("computer01"), vec!["computer", "01"]);
        assert_eq!(tokenize("--"), Vec::<String>::new());
    }

    #[test]
    fn test_token_jaccard_scaling() {
        assert_eq!(token("a-b-c", "b-c-d"), Some(35.0));
        let score = score_pair("project-alpha-v1", "alpha-project-v1").unwrap();
        assert_eq!(score.reason, MatchReason::Token);
        assert_eq!(score.score, 70.0);
    }

    #[test]
    fn test_token_camel_case_matches_delimited() {
        let score = score_pair("ServerWeb", "web-server").unwrap();
        assert_eq!(score.reason, MatchReason::Token);
        assert_eq!(score.score, 70.0);
    }

    #[test]
    fn test_token_requires_overlap() {
        assert_eq!(token("a-b", "c-d-e-f"), None);
    }

    #[test]
    fn test_fuzzy_typo() {
        let score = score_pair("workstatn", "workstation").unwrap();
        assert_eq!(score.reason, MatchReason::Fuzzy);
        assert!(score.score >= 50.0 && score.score < 70.0);
    }

    #[test]
    fn test_unrelated_names_do_not_score() {
        assert_eq!(score_pair("aaaaaaa", "zzzzzzz"), None);
        assert_eq!(score_pair("unrelated-folder", "computer-01"), None);
    }

    proptest! {
        #[test]
        fn prop_score_is_symmetric(a in "[a-zA-Z0-9._ -]{0,14}", b in "[a-zA-Z0-9._ -]{0,14}") {
            prop_assert_eq!(score_pair(&a, &b), score_pair(&b, &a));
        }

        #[test]
        fn prop_exact_prefix_dominates(
            base in "[a-z0-9]{1,10}",
            delim in "[-_. ]",
            rest in "[a-zA-Z0-9]{0,8}",
        ) {
            let longer = format!("{}{}{}", base, delim, rest);
            let score = score_pair(&base, &longer).unwrap();
            prop_assert_eq!(score.score, 100.0);
            prop_assert_eq!(score.reason, MatchReason::ExactPrefix);
        }

        #[test]
        fn prop_scores_stay_in_tier_bands(a in "[a-z0-9_-]{1,12}", b in "[a-z0-9_-]{1,12}") {
            if let Some(score) = score_pair(&a, &b) {
                let (low, high) = match score.reason {
                    MatchReason::ExactPrefix => (100.0, 100.0),
                    MatchReason::Normalized => (90.0, 90.0),
                    MatchReason::Token => (0.0, 70.0),
                    MatchReason::Fuzzy => (50.0, 70.0),
                };
                prop_assert!(score.score > low - 1e-9 && score.score <= high);
                if score.reason == MatchReason::Fuzzy {
                    prop_assert!(score.score < 70.0);
                }
            }
        }
    }
}
