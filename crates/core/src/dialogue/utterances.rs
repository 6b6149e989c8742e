#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Utterance {
    Affirmative,
    Negative,
    Other,
}

const ENGLISH_YES: &[&str] = &["yes", "yea", "yup", "yep", "ya", "sure", "ok", "y", "yeah", "yah"];
const ENGLISH_NO: &[&str] = &["no", "nah", "nope", "n"];
const DUTCH_YES: &[&str] = &["ja", "jazeker", "jawel", "yes"];
const DUTCH_NO: &[&str] = &["nee", "neen", "nope", "no"];

/// Classifies a yes/no answer by its first word.
pub fn classify_english(text: &str) -> Utterance {
    classify(text, ENGLISH_YES, ENGLISH_NO)
}

pub fn classify_dutch(text: &str) -> Utterance {
    classify(text, DUTCH_YES, DUTCH_NO)
}

fn classify(text: &str, yes: &[&str], no: &[&str]) -> Utterance {
    let Some(first) = first_word(text) else {
        return Utterance::Other;
    };

    if yes.contains(&first.as_str()) {
        Utterance::Affirmative
    } else if no.contains(&first.as_str()) {
        Utterance::Negative
    } else {
        Utterance::Other
    }
}

fn first_word(text: &str) -> Option<String> {
    text.split_whitespace()
        .next()
        .map(|word| word.trim_matches(|ch: char| !ch.is_alphanumeric()).to_lowercase())
        .filter(|word| !word.is_empty())
}
