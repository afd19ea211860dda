//! Meeting intelligence behind trait seams.
//!
//! Every provider here is a deterministic local stand-in. Real speech-to-text,
//! summarization and agent backends plug in by implementing the same traits.

pub mod responder;
pub mod summarizer;
pub mod transcriber;

pub use responder::{AgentResponder, KeywordResponder};
pub use summarizer::{ExtractiveSummarizer, Summarizer};
pub use transcriber::{MockTranscriber, Transcriber};

/// Split text into trimmed sentences on `.`, `!` and `?`
pub(crate) fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    for ch in text.chars() {
        current.push(ch);
        if matches!(ch, '.' | '!' | '?') {
            let sentence = current.trim();
            if sentence.chars().any(char::is_alphanumeric) {
                sentences.push(sentence.to_string());
            }
            current.clear();
        }
    }
    let rest = current.trim();
    if rest.chars().any(char::is_alphanumeric) {
        sentences.push(rest.to_string());
    }
    sentences
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_sentences() {
        let parts = split_sentences("We shipped it. Did it work? Yes!  trailing words");
        assert_eq!(parts, vec!["We shipped it.", "Did it work?", "Yes!", "trailing words"]);
        assert!(split_sentences(" ... ").is_empty());
    }
}
