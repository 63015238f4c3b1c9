/// Polarity of a text in `[-1.0, 1.0]`. Attached to answers as metadata
/// only; it never influences the query plan.
pub trait Sentiment {
    fn polarity(&self, text: &str) -> f64;
}

const POSITIVE: &[(&str, f64)] = &[
    ("good", 0.7),
    ("great", 0.8),
    ("excellent", 1.0),
    ("best", 1.0),
    ("happy", 0.8),
    ("love", 0.5),
    ("nice", 0.6),
    ("thanks", 0.2),
    ("helpful", 0.5),
    ("growth", 0.3),
    ("profit", 0.4),
    ("gain", 0.3),
    ("high", 0.16),
];

const NEGATIVE: &[(&str, f64)] = &[
    ("bad", -0.7),
    ("worst", -1.0),
    ("terrible", -1.0),
    ("poor", -0.4),
    ("wrong", -0.5),
    ("angry", -0.5),
    ("fraud", -0.6),
    ("loss", -0.4),
    ("failed", -0.5),
    ("stuck", -0.3),
    ("frozen", -0.3),
    ("decline", -0.3),
    ("low", -0.1),
];

const NEGATORS: &[&str] = &["not", "no", "never"];

/// Word-list scorer: mean polarity of the known words, with a negator
/// flipping the word right after it.
#[derive(Default)]
pub struct Lexicon;

impl Lexicon {
    fn score(word: &str) -> Option<f64> {
        POSITIVE
            .iter()
            .chain(NEGATIVE)
            .find(|(w, _)| *w == word)
            .map(|(_, score)| *score)
    }
}

impl Sentiment for Lexicon {
    fn polarity(&self, text: &str) -> f64 {
        let lowered = text.to_lowercase();
        let words = lowered
            .split(|c: char| !(c.is_alphanumeric() || c == '\''))
            .filter(|w| !w.is_empty());

        let mut negate = false;
        let mut total = 0.0;
        let mut matched = 0u32;
        for word in words {
            if NEGATORS.contains(&word) || word.ends_with("n't") {
                negate = true;
                continue;
            }
            if let Some(score) = Self::score(word) {
                total += if negate { -score } else { score };
                matched += 1;
            }
            negate = false;
        }

        if matched == 0 {
            return 0.0;
        }
        (total / f64::from(matched)).clamp(-1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neutral_question() {
        assert!(Lexicon.polarity("Top 5 merchants by total debit this month").abs() < f64::EPSILON);
    }

    #[test]
    fn positive_and_negative() {
        assert!(Lexicon.polarity("Great, show me the best merchants") > 0.0);
        assert!(Lexicon.polarity("Why are so many transactions stuck and failed?") < 0.0);
    }

    #[test]
    fn negation_flips() {
        let plain = Lexicon.polarity("good results");
        let negated = Lexicon.polarity("not good results");
        assert!(plain > 0.0);
        assert!((negated + plain).abs() < 1e-9);
        assert!(Lexicon.polarity("this isn't helpful") < 0.0);
    }

    #[test]
    fn stays_in_range() {
        let score = Lexicon.polarity("excellent best great excellent");
        assert!((-1.0..=1.0).contains(&score));
    }
}
