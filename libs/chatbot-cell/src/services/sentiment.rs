use shared_models::sentiment::Sentiment;

const POSITIVE: &[&str] = &[
    "good", "great", "happy", "calm", "better", "grateful", "hopeful", "relaxed", "glad",
    "excited", "proud", "peaceful", "love", "joy", "thankful", "fine", "okay", "confident",
];

const NEGATIVE: &[&str] = &[
    "sad", "anxious", "anxiety", "depressed", "stressed", "stress", "angry", "lonely", "tired",
    "worried", "afraid", "scared", "hopeless", "worse", "panic", "overwhelmed", "hurt", "upset",
    "cry", "crying", "bad", "awful", "terrible", "exhausted",
];

const NEGATORS: &[&str] = &["not", "no", "never", "dont", "don't", "isnt", "isn't", "cant", "can't"];

/// Lexicon vote over the words of `text`. A negator directly before a
/// word flips its polarity. Ties are neutral.
pub fn classify(text: &str) -> Sentiment {
    let lowered = text.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|w| !w.is_empty())
        .collect();

    let mut score = 0i32;
    for (i, word) in words.iter().enumerate() {
        let polarity = if POSITIVE.contains(word) {
            1
        } else if NEGATIVE.contains(word) {
            -1
        } else {
            continue;
        };
        let negated = i > 0 && NEGATORS.contains(&words[i - 1]);
        score += if negated { -polarity } else { polarity };
    }

    match score {
        s if s > 0 => Sentiment::Positive,
        s if s < 0 => Sentiment::Negative,
        _ => Sentiment::Neutral,
    }
}
