use std::io::Write;
use std::process::{Command, Stdio};

use crate::error::{Error, Result};

/// Position of the lemma in a fully resolved 9-field feature vector.
const LEMMA_FIELD: usize = 6;
/// Field count of a fully resolved feature vector; shorter vectors
/// (punctuation, unknown words) carry no lemma.
const FULL_FEATURES: usize = 9;

const NOUN: &str = "名詞";
const ADJECTIVE: &str = "形容詞";
const VERB: &str = "動詞";
const INDEPENDENT: &str = "自立";
const NOUN_SUBCATEGORIES: [&str; 5] = ["サ変接続", "一般", "形容動詞語幹", "固有名詞", "数"];

/// One token from the morphological analyzer: the surface form plus its
/// part-of-speech feature vector (category, subcategory, ...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedToken {
    pub surface: String,
    pub features: Vec<String>,
}

impl TaggedToken {
    pub fn category(&self) -> Option<&str> {
        self.features.first().map(String::as_str)
    }

    pub fn subcategory(&self) -> Option<&str> {
        self.features.get(1).map(String::as_str)
    }

    /// Lemma, present only when the analyzer resolved all 9 feature fields.
    pub fn lemma(&self) -> Option<&str> {
        if self.features.len() == FULL_FEATURES {
            self.features.get(LEMMA_FIELD).map(String::as_str)
        } else {
            None
        }
    }

    /// The term under which this token is indexed: the lemma when
    /// available, the surface form otherwise. Search-time extraction must
    /// use the same rule or query terms will miss indexed ones.
    pub fn index_term(&self) -> &str {
        self.lemma().unwrap_or(&self.surface)
    }
}

/// Morphological analyzer capability consumed by the engine. Implementations
/// yield only normal tokens; sentence boundary markers are already dropped.
pub trait Tokenizer {
    fn tokenize(&self, text: &str) -> Result<Vec<TaggedToken>>;
}

/// Decides whether a tagged token is worth indexing: verbal nouns, general
/// nouns, adjectival-noun stems, proper nouns and numerals, plus independent
/// adjectives and verbs. Particles, auxiliaries and punctuation all fail.
pub fn should_be_included(features: &[String]) -> bool {
    match (features.first(), features.get(1)) {
        (Some(cat), Some(sub)) if cat == NOUN => {
            NOUN_SUBCATEGORIES.iter().any(|s| s == sub)
        }
        (Some(cat), Some(sub)) if cat == ADJECTIVE || cat == VERB => sub == INDEPENDENT,
        _ => false,
    }
}

/// Extracts index-ready search terms from a raw query, applying the same
/// filter and lemma fallback as index construction.
pub fn extract_terms(tokenizer: &dyn Tokenizer, query: &str) -> Result<Vec<String>> {
    let tokens = tokenizer.tokenize(query)?;
    Ok(tokens
        .iter()
        .filter(|t| should_be_included(&t.features))
        .map(|t| t.index_term().to_string())
        .collect())
}

/// Adapter over an external MeCab-compatible analyzer binary. Spawns the
/// command per call, feeds the text on stdin and parses the tab-separated
/// node output. All failures surface as [`Error::Tokenize`] so callers can
/// degrade to n-gram retrieval.
pub struct MecabTokenizer {
    command: String,
}

impl MecabTokenizer {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl Tokenizer for MecabTokenizer {
    fn tokenize(&self, text: &str) -> Result<Vec<TaggedToken>> {
        let mut child = Command::new(&self.command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| Error::Tokenize(format!("failed to spawn {}: {e}", self.command)))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .map_err(|e| Error::Tokenize(format!("failed to write to {}: {e}", self.command)))?;
        }
        let output = child
            .wait_with_output()
            .map_err(|e| Error::Tokenize(format!("{} did not finish: {e}", self.command)))?;
        if !output.status.success() {
            return Err(Error::Tokenize(format!(
                "{} exited with {}",
                self.command, output.status
            )));
        }

        Ok(parse_analyzer_output(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Parses MeCab node output: one `surface\tfeature,feature,...` line per
/// token, sentences terminated by an `EOS` line.
pub fn parse_analyzer_output(out: &str) -> Vec<TaggedToken> {
    out.lines()
        .filter(|line| !line.is_empty() && *line != "EOS")
        .filter_map(|line| {
            let (surface, features) = line.split_once('\t')?;
            Some(TaggedToken {
                surface: surface.to_string(),
                features: features.split(',').map(str::to_string).collect(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn features(fields: &[&str]) -> Vec<String> {
        fields.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn filter_keeps_content_words() {
        assert!(should_be_included(&features(&["名詞", "一般"])));
        assert!(should_be_included(&features(&["名詞", "サ変接続"])));
        assert!(should_be_included(&features(&["名詞", "固有名詞"])));
        assert!(should_be_included(&features(&["名詞", "数"])));
        assert!(should_be_included(&features(&["名詞", "形容動詞語幹"])));
        assert!(should_be_included(&features(&["形容詞", "自立"])));
        assert!(should_be_included(&features(&["動詞", "自立"])));
    }

    #[test]
    fn filter_drops_function_words() {
        assert!(!should_be_included(&features(&["助詞", "格助詞"])));
        assert!(!should_be_included(&features(&["助動詞", "*"])));
        assert!(!should_be_included(&features(&["記号", "句点"])));
        assert!(!should_be_included(&features(&["名詞", "非自立"])));
        assert!(!should_be_included(&features(&["動詞", "非自立"])));
        assert!(!should_be_included(&features(&[])));
    }

    #[test]
    fn lemma_requires_nine_fields() {
        let full = TaggedToken {
            surface: "走っ".to_string(),
            features: features(&[
                "動詞", "自立", "*", "*", "五段・ラ行", "連用タ接続", "走る", "ハシッ", "ハシッ",
            ]),
        };
        assert_eq!(full.lemma(), Some("走る"));
        assert_eq!(full.index_term(), "走る");

        let partial = TaggedToken {
            surface: "，".to_string(),
            features: features(&["記号", "読点", "*", "*", "*", "*", "*"]),
        };
        assert_eq!(partial.lemma(), None);
        assert_eq!(partial.index_term(), "，");
    }

    #[test]
    fn parses_analyzer_node_lines() {
        let out = "猫\t名詞,一般,*,*,*,*,猫,ネコ,ネコ\nが\t助詞,格助詞,一般,*,*,*,が,ガ,ガ\nEOS\n";
        let tokens = parse_analyzer_output(out);
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].surface, "猫");
        assert_eq!(tokens[0].category(), Some("名詞"));
        assert_eq!(tokens[0].lemma(), Some("猫"));
        assert_eq!(tokens[1].subcategory(), Some("格助詞"));
    }

    struct Canned(Vec<TaggedToken>);

    impl Tokenizer for Canned {
        fn tokenize(&self, _text: &str) -> Result<Vec<TaggedToken>> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn extract_terms_filters_and_lemmatizes() {
        let tokenizer = Canned(parse_analyzer_output(
            "走っ\t動詞,自立,*,*,五段・ラ行,連用タ接続,走る,ハシッ,ハシッ\n\
             た\t助動詞,*,*,*,特殊・タ,基本形,た,タ,タ\n\
             猫\t名詞,一般,*,*,*,*,猫,ネコ,ネコ\nEOS\n",
        ));
        let terms = extract_terms(&tokenizer, "走った猫").unwrap();
        assert_eq!(terms, vec!["走る".to_string(), "猫".to_string()]);
    }
}
