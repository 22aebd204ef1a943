use lazy_static::lazy_static;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Window length of the fallback character index.
const N: usize = 2;

/// ASCII punctuation plus the CJK punctuation the analyzer-free path has to
/// strip by hand.
const STRIP_CHARS: &str = "!\"#$%&'()*+,-./:;<=>?@[\\]^_`{|}~「」、。・『』《》";

lazy_static! {
    static ref LATIN_RUNS: Regex = Regex::new(r#"[A-Za-z0-9¥".,@]+"#).expect("valid regex");
    static ref SYMBOLS: Regex =
        Regex::new(r#"[!"“#$%&()*+\-.,/:;<=>?@\[\\\]^_`{|}~]"#).expect("valid regex");
    static ref CONTROL_AND_DATE_MARKS: Regex = Regex::new(r"[\n\r\t年月日]").expect("valid regex");
}

/// Normalizes text and cuts it into overlapping 2-character windows for the
/// fallback index: trim, drop spaces, NFKC, then strip punctuation, Latin
/// letter/digit runs and the date markers 年月日.
///
/// The final window at the end of the text is a single character and is
/// kept, matching the behavior the bigram tables were built with.
pub fn divide_ngrams(text: &str) -> Vec<String> {
    let normalized: String = text.trim().replace(' ', "").nfkc().collect();
    let normalized: String = normalized.chars().filter(|c| !STRIP_CHARS.contains(*c)).collect();
    let normalized = LATIN_RUNS.replace_all(&normalized, "");
    let normalized = SYMBOLS.replace_all(&normalized, "");
    let normalized = CONTROL_AND_DATE_MARKS.replace_all(&normalized, "");

    let chars: Vec<char> = normalized.chars().collect();
    (0..chars.len())
        .map(|i| chars[i..(i + N).min(chars.len())].iter().collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sliding_windows_keep_the_trailing_short_one() {
        assert_eq!(divide_ngrams("あいうえ"), vec!["あい", "いう", "うえ", "え"]);
    }

    #[test]
    fn empty_and_single_char_inputs() {
        assert!(divide_ngrams("").is_empty());
        assert_eq!(divide_ngrams("猫"), vec!["猫"]);
    }

    #[test]
    fn strips_latin_runs_digits_and_punctuation() {
        assert_eq!(divide_ngrams("Hello, 世界！abc123"), vec!["世界", "界"]);
    }

    #[test]
    fn strips_date_markers_and_whitespace() {
        assert_eq!(divide_ngrams("1月1日\nテスト"), vec!["テス", "スト", "ト"]);
    }

    #[test]
    fn normalizes_fullwidth_forms() {
        // ＡＢＣ normalizes to ABC under NFKC, which the Latin rule removes.
        assert_eq!(divide_ngrams("ＡＢＣ猫"), vec!["猫"]);
    }

    #[test]
    fn strips_cjk_quotes_and_middle_dots() {
        assert_eq!(divide_ngrams("「猫・犬」"), vec!["猫犬", "犬"]);
    }
}
