//! Fuzzy matching for autocomplete
//!
//! Sørensen–Dice coefficient over adjacent character pairs. Hangul syllables
//! are split into their jamo first so partially typed Korean still matches.

const HANGUL_BASE: u32 = 0xAC00;
const HANGUL_LAST: u32 = 0xD7A3;
const INITIALS: [char; 19] = [
    'ㄱ', 'ㄲ', 'ㄴ', 'ㄷ', 'ㄸ', 'ㄹ', 'ㅁ', 'ㅂ', 'ㅃ', 'ㅅ', 'ㅆ', 'ㅇ', 'ㅈ', 'ㅉ', 'ㅊ', 'ㅋ', 'ㅌ',
    'ㅍ', 'ㅎ',
];
const MEDIALS: [char; 21] = [
    'ㅏ', 'ㅐ', 'ㅑ', 'ㅒ', 'ㅓ', 'ㅔ', 'ㅕ', 'ㅖ', 'ㅗ', 'ㅘ', 'ㅙ', 'ㅚ', 'ㅛ', 'ㅜ', 'ㅝ', 'ㅞ', 'ㅟ',
    'ㅠ', 'ㅡ', 'ㅢ', 'ㅣ',
];
const FINALS: [Option<char>; 28] = [
    None,
    Some('ㄱ'),
    Some('ㄲ'),
    Some('ㄳ'),
    Some('ㄴ'),
    Some('ㄵ'),
    Some('ㄶ'),
    Some('ㄷ'),
    Some('ㄹ'),
    Some('ㄺ'),
    Some('ㄻ'),
    Some('ㄼ'),
    Some('ㄽ'),
    Some('ㄾ'),
    Some('ㄿ'),
    Some('ㅀ'),
    Some('ㅁ'),
    Some('ㅂ'),
    Some('ㅄ'),
    Some('ㅅ'),
    Some('ㅆ'),
    Some('ㅇ'),
    Some('ㅈ'),
    Some('ㅊ'),
    Some('ㅋ'),
    Some('ㅌ'),
    Some('ㅍ'),
    Some('ㅎ'),
];

/// Characters with Hangul syllables moved to the end as jamo, followed by
/// their initial consonants again so initials-only input matches
fn symbols(text: &str) -> Vec<char> {
    let mut out = Vec::with_capacity(text.len());
    let mut jamo = Vec::new();
    let mut initials = Vec::new();
    for ch in text.to_lowercase().chars() {
        let code = ch as u32;
        if !(HANGUL_BASE..=HANGUL_LAST).contains(&code) {
            out.push(ch);
            continue;
        }
        let offset = (code - HANGUL_BASE) as usize;
        let initial = INITIALS[offset / (21 * 28)];
        jamo.push(initial);
        initials.push(initial);
        jamo.push(MEDIALS[(offset / 28) % 21]);
        if let Some(last) = FINALS[offset % 28] {
            jamo.push(last);
        }
    }
    out.extend(jamo);
    out.extend(initials);
    out
}

fn bigrams(text: &str) -> Vec<(char, char)> {
    symbols(text).windows(2).map(|w| (w[0], w[1])).collect()
}

/// Similarity in `0.0..=1.0`, case-insensitive
pub fn similarity(a: &str, b: &str) -> f64 {
    let left = bigrams(a);
    let mut right: Vec<Option<(char, char)>> = bigrams(b).into_iter().map(Some).collect();
    let total = left.len() + right.len();
    if total == 0 {
        return 0.0;
    }

    let mut shared = 0;
    for pair in &left {
        if let Some(slot) = right.iter_mut().find(|p| p.as_ref() == Some(pair)) {
            *slot = None;
            shared += 1;
        }
    }
    2.0 * shared as f64 / total as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_and_disjoint() {
        assert_eq!(similarity("wallet", "WALLET"), 1.0);
        assert_eq!(similarity("abc", "xyz"), 0.0);
        assert_eq!(similarity("", ""), 0.0);
        assert_eq!(similarity("a", "a"), 0.0);
    }

    #[test]
    fn test_partial_match_ranks_closer_paths_higher() {
        let typed = "black";
        assert!(similarity("game gamble blackjack", typed) > similarity("game wallet", typed));
        assert!(similarity("game gamble blackjack", typed) > 0.0);
    }

    #[test]
    fn test_repeated_pairs_count_once_each() {
        // "aa" twice on the left, once on the right
        assert_eq!(similarity("aaa", "aa"), 2.0 * 1.0 / 3.0);
    }

    #[test]
    fn test_hangul_initials_match_syllables() {
        assert!(similarity("지갑", "ㅈㄱ") > 0.0);
        assert_eq!(symbols("각"), vec!['ㄱ', 'ㅏ', 'ㄱ', 'ㄱ']);
    }
}
