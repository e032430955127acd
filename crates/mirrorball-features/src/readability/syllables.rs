/// Estimates the syllable count of one English word.
///
/// Counts vowel groups, then discounts a silent trailing `e` and the
/// non-syllabic `-es` and `-ed` endings. Any word with letters has at least
/// one syllable; a token without letters has none.
///
/// # Examples
///
/// ```
/// use mirrorball_features::readability::count_syllables;
///
/// assert_eq!(count_syllables("love"), 1);
/// assert_eq!(count_syllables("little"), 2);
/// assert_eq!(count_syllables("beautiful"), 3);
/// assert_eq!(count_syllables("..."), 0);
/// ```
#[must_use]
pub fn count_syllables(word: &str) -> usize {
    let word = word
        .chars()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_lowercase())
        .collect::<Vec<_>>();
    if word.is_empty() {
        return 0;
    }
    if word.len() <= 3 {
        return 1;
    }

    let is_vowel = |idx: usize| match word[idx] {
        'a' | 'e' | 'i' | 'o' | 'u' => true,
        'y' => idx > 0,
        _ => false,
    };

    let mut count = 0;
    let mut in_group = false;
    for idx in 0..word.len() {
        let vowel = is_vowel(idx);
        if vowel && !in_group {
            count += 1;
        }
        in_group = vowel;
    }

    let n = word.len();
    let last = word[n - 1];
    let before_last = word[n - 2];
    if count > 1 {
        let silent = match (before_last, last) {
            // "-le" after a consonant keeps its syllable (table, little)
            (_, 'e') if !is_vowel(n - 2) => !(before_last == 'l' && !is_vowel(n - 3)),
            ('e', 's') if !is_vowel(n - 3) => {
                !matches!(word[n - 3], 's' | 'x' | 'z' | 'c' | 'g' | 'h')
            }
            ('e', 'd') if !is_vowel(n - 3) => !matches!(word[n - 3], 't' | 'd'),
            _ => false,
        };
        if silent {
            count -= 1;
        }
    }

    count.max(1)
}
