//! Arabic clitic segmentation
//!
//! Conjunctions and prepositions are written attached to the following
//! word (والكتاب, بالمدينة, للمدينة). Splitting them off lets "الكتاب" in a
//! query match "والكتاب" in a reference article.
//!
//! Splits are licensed conservatively: a preposition is only split when
//! the remainder carries the definite article, and a conjunction only when
//! the remainder is itself an article-bearing form. Anything else is left
//! intact, so names such as فرنسا or وزير are never broken.

use super::resources::SegmentationRules;

/// Arabic letter block, without digits and punctuation
pub(crate) fn is_arabic_letter(ch: char) -> bool {
    matches!(
        ch,
        '\u{0620}'..='\u{063F}'
            | '\u{0641}'..='\u{064A}'
            | '\u{066E}'
            | '\u{066F}'
            | '\u{0671}'..='\u{06D3}'
            | '\u{06FA}'..='\u{06FF}'
    )
}

/// Harakat, superscript alef, and tatweel
pub(crate) fn is_arabic_mark(ch: char) -> bool {
    matches!(ch, '\u{064B}'..='\u{065F}' | '\u{0670}' | '\u{0640}')
}

/// True for segments made only of Arabic letters and marks
pub(crate) fn is_arabic_word(word: &str) -> bool {
    let mut letters = 0;
    for ch in word.chars() {
        if is_arabic_letter(ch) {
            letters += 1;
        } else if !is_arabic_mark(ch) {
            return false;
        }
    }
    letters > 0
}

fn letter_count(text: &str) -> usize {
    text.chars().filter(|c| is_arabic_letter(*c)).count()
}

/// Split `prefix` off the front of `word`, ignoring marks between letters.
/// Marks directly following the prefix stay with the prefix.
fn strip_prefix<'a>(word: &'a str, prefix: &str) -> Option<(&'a str, &'a str)> {
    let mut wanted = prefix.chars().peekable();
    let mut end = 0;

    for (idx, ch) in word.char_indices() {
        match wanted.peek() {
            Some(&p) if ch == p => {
                wanted.next();
                end = idx + ch.len_utf8();
            }
            Some(_) if is_arabic_mark(ch) && end > 0 => {
                end = idx + ch.len_utf8();
            }
            Some(_) => return None,
            None if is_arabic_mark(ch) => end = idx + ch.len_utf8(),
            None => break,
        }
    }

    if wanted.peek().is_some() {
        return None;
    }
    Some((&word[..end], &word[end..]))
}

/// Split `suffix` off the end of `word` (exact match, no marks)
fn strip_suffix<'a>(word: &'a str, suffix: &str) -> Option<(&'a str, &'a str)> {
    word.strip_suffix(suffix)
        .map(|stem| (stem, &word[stem.len()..]))
}

/// Segmenter for a single whitespace-free Arabic word
pub(crate) struct CliticSplitter<'r> {
    rules: &'r SegmentationRules,
}

impl<'r> CliticSplitter<'r> {
    pub(crate) fn new(rules: &'r SegmentationRules) -> Self {
        Self { rules }
    }

    /// Segment `word` into clitics and stem, in reading order
    pub(crate) fn split(&self, word: &str) -> Vec<String> {
        if !is_arabic_word(word) || self.is_protected(word) {
            return vec![word.to_string()];
        }

        let mut out = Vec::with_capacity(3);

        let rest = match self.split_conjunction(word) {
            Some((conj, rest)) => {
                out.push(conj.to_string());
                rest
            }
            None => word,
        };

        let stem = match self.split_preposition(rest) {
            Some((prep, stem)) => {
                out.push(prep);
                stem
            }
            None => rest.to_string(),
        };

        out.extend(self.split_enclitic(&stem));
        out
    }

    fn is_protected(&self, word: &str) -> bool {
        self.rules.protected.iter().any(|p| p == word)
    }

    /// Remainder after the definite article has enough letters
    fn carries_article(&self, text: &str) -> bool {
        strip_prefix(text, &self.rules.definite_article)
            .map(|(_, after)| letter_count(after) >= self.rules.min_stem_chars)
            .unwrap_or(false)
    }

    fn split_conjunction<'w>(&self, word: &'w str) -> Option<(&'w str, &'w str)> {
        for conj in &self.rules.conjunctions {
            if let Some((head, rest)) = strip_prefix(word, conj) {
                if self.is_protected(rest) {
                    continue;
                }
                if self.carries_article(rest) || self.split_preposition(rest).is_some() {
                    return Some((head, rest));
                }
            }
        }
        None
    }

    /// Returns the preposition and the stem; `لل` restores the article's
    /// alef that the spelling drops (للمدينة → ل + المدينة)
    fn split_preposition(&self, word: &str) -> Option<(String, String)> {
        for prep in &self.rules.prepositions {
            let Some((head, rest)) = strip_prefix(word, prep) else {
                continue;
            };

            if self.carries_article(rest) {
                return Some((head.to_string(), rest.to_string()));
            }
            if let Some(stem) = self.restore_elided_article(prep, rest) {
                return Some((head.to_string(), stem));
            }
        }
        None
    }

    /// ل + ال is spelled لل, dropping the article's alef
    fn restore_elided_article(&self, prep: &str, rest: &str) -> Option<String> {
        let mut article = self.rules.definite_article.chars();
        let alef = article.next()?;
        let lam: String = article.collect();
        if lam.is_empty() || prep != lam {
            return None;
        }

        let (_, after) = strip_prefix(rest, &lam)?;
        (letter_count(after) >= self.rules.min_stem_chars).then(|| format!("{alef}{rest}"))
    }

    fn split_enclitic(&self, stem: &str) -> Vec<String> {
        if self.rules.split_enclitics {
            for enclitic in &self.rules.enclitics {
                if let Some((base, tail)) = strip_suffix(stem, enclitic) {
                    if letter_count(base) > self.rules.min_stem_chars {
                        return vec![base.to_string(), tail.to_string()];
                    }
                }
            }
        }
        vec![stem.to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn split(word: &str) -> Vec<String> {
        let rules = SegmentationRules::arabic();
        CliticSplitter::new(&rules).split(word)
    }

    #[test]
    fn test_conjunction_before_article() {
        assert_eq!(split("والكتاب"), vec!["و", "الكتاب"]);
        assert_eq!(split("فالحكومة"), vec!["ف", "الحكومة"]);
    }

    #[test]
    fn test_preposition_before_article() {
        assert_eq!(split("بالمدينة"), vec!["ب", "المدينة"]);
        assert_eq!(split("كالعادة"), vec!["ك", "العادة"]);
    }

    #[test]
    fn test_lam_restores_article() {
        assert_eq!(split("للمدينة"), vec!["ل", "المدينة"]);
    }

    #[test]
    fn test_conjunction_and_preposition() {
        assert_eq!(split("وبالمدينة"), vec!["و", "ب", "المدينة"]);
        assert_eq!(split("وللحكومة"), vec!["و", "ل", "الحكومة"]);
    }

    #[test]
    fn test_plain_words_untouched() {
        assert_eq!(split("وزير"), vec!["وزير"]);
        assert_eq!(split("فرنسا"), vec!["فرنسا"]);
        assert_eq!(split("بيروت"), vec!["بيروت"]);
        assert_eq!(split("الكتاب"), vec!["الكتاب"]);
    }

    #[test]
    fn test_protected_words() {
        assert_eq!(split("والدة"), vec!["والدة"]);
        assert_eq!(split("والد"), vec!["والد"]);
    }

    #[test]
    fn test_short_remainder_not_split() {
        // ال + one letter is too short to be a stem
        assert_eq!(split("بالد"), vec!["بالد"]);
    }

    #[test]
    fn test_marks_stay_with_prefix() {
        assert_eq!(split("وَالكتاب"), vec!["وَ", "الكتاب"]);
    }

    #[test]
    fn test_non_arabic_passthrough() {
        assert_eq!(split("aljazeera"), vec!["aljazeera"]);
        assert_eq!(split("2024"), vec!["2024"]);
    }

    #[test]
    fn test_enclitics_only_when_enabled() {
        let mut rules = SegmentationRules::arabic();
        assert_eq!(CliticSplitter::new(&rules).split("كتابهم"), vec!["كتابهم"]);

        rules.split_enclitics = true;
        assert_eq!(CliticSplitter::new(&rules).split("كتابهم"), vec!["كتاب", "هم"]);
        // Stem would be too short
        assert_eq!(CliticSplitter::new(&rules).split("لهم"), vec!["لهم"]);
    }

    #[test]
    fn test_is_arabic_word() {
        assert!(is_arabic_word("كتاب"));
        assert!(is_arabic_word("كِتَاب"));
        assert!(!is_arabic_word("كتاب1"));
        assert!(!is_arabic_word("ـ"));
    }
}
