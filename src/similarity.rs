//! Lexical nearest-neighbour search over a fixed set of texts.

use std::collections::HashMap;

type Vector = HashMap<String, f64>;

/// TF-IDF vectors of unigrams and bigrams, compared by cosine similarity.
pub struct TfIdfIndex {
    texts: Vec<String>,
    idf: HashMap<String, f64>,
    vectors: Vec<Vector>,
}

impl TfIdfIndex {
    pub fn new(texts: Vec<String>) -> Self {
        let terms: Vec<Vec<String>> = texts.iter().map(|t| terms(t)).collect();

        let mut df: HashMap<&str, usize> = HashMap::new();
        for doc in &terms {
            let mut seen: Vec<&str> = doc.iter().map(String::as_str).collect();
            seen.sort_unstable();
            seen.dedup();
            for term in seen {
                *df.entry(term).or_default() += 1;
            }
        }

        let n = texts.len() as f64;
        let idf: HashMap<String, f64> = df
            .into_iter()
            .map(|(term, df)| (term.to_string(), ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0))
            .collect();

        let vectors = terms.iter().map(|doc| weigh(doc, &idf)).collect();
        Self {
            texts,
            idf,
            vectors,
        }
    }

    /// Up to `k` indexed texts most similar to `text`, highest score first.
    /// Texts sharing no term with `text` are left out.
    pub fn query(&self, text: &str, k: usize) -> Vec<(&str, f64)> {
        let query = weigh(&terms(text), &self.idf);
        let mut scored: Vec<(&str, f64)> = self
            .texts
            .iter()
            .zip(&self.vectors)
            .map(|(text, vector)| (text.as_str(), cosine(&query, vector)))
            .filter(|(_, score)| *score > 0.0)
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);
        scored
    }
}

/// Lowercased words of at least two characters, followed by adjacent pairs.
fn terms(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() >= 2)
        .collect();
    let bigrams = words.windows(2).map(|pair| pair.join(" "));
    words
        .iter()
        .map(|w| (*w).to_string())
        .chain(bigrams)
        .collect()
}

/// L2-normalized term frequency times idf. Terms unknown to the index are
/// dropped.
fn weigh(terms: &[String], idf: &HashMap<String, f64>) -> Vector {
    let mut vector = Vector::new();
    for term in terms {
        if let Some(weight) = idf.get(term) {
            *vector.entry(term.clone()).or_default() += weight;
        }
    }
    let norm = vector.values().map(|w| w * w).sum::<f64>().sqrt();
    if norm > 0.0 {
        for weight in vector.values_mut() {
            *weight /= norm;
        }
    }
    vector
}

fn cosine(a: &Vector, b: &Vector) -> f64 {
    let (small, large) = if a.len() <= b.len() { (a, b) } else { (b, a) };
    small
        .iter()
        .filter_map(|(term, w)| large.get(term).map(|v| w * v))
        .sum()
}
