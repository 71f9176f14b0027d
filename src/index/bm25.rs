/// BM25 Okapi scoring over a pre-tokenized corpus.
///
/// Scores every document position for a token sequence. IDF uses
/// ln(N - df + 0.5) - ln(df + 0.5), so terms present in more than half of the
/// corpus get a negative IDF; those are floored at `epsilon * average_idf`.
/// Documents sharing no term with the query score exactly 0.0.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bm25Params {
    #[serde(default = "default_k1")]
    pub k1: f64,
    #[serde(default = "default_b")]
    pub b: f64,
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
}

fn default_k1() -> f64 {
    1.5
}

fn default_b() -> f64 {
    0.75
}

fn default_epsilon() -> f64 {
    0.25
}

impl Default for Bm25Params {
    fn default() -> Self {
        Bm25Params {
            k1: default_k1(),
            b: default_b(),
            epsilon: default_epsilon(),
        }
    }
}

pub struct Bm25Okapi {
    params: Bm25Params,
    doc_len: Vec<usize>,
    avgdl: f64,
    doc_freqs: Vec<HashMap<String, usize>>,
    idf: HashMap<String, f64>,
}

impl Bm25Okapi {
    pub fn new(corpus: &[Vec<String>], params: Bm25Params) -> Self {
        let mut doc_len = Vec::with_capacity(corpus.len());
        let mut doc_freqs = Vec::with_capacity(corpus.len());
        // Number of documents containing each term
        let mut nd: HashMap<String, usize> = HashMap::new();

        for doc in corpus {
            doc_len.push(doc.len());
            let mut freqs: HashMap<String, usize> = HashMap::new();
            for token in doc {
                *freqs.entry(token.clone()).or_default() += 1;
            }
            for term in freqs.keys() {
                *nd.entry(term.clone()).or_default() += 1;
            }
            doc_freqs.push(freqs);
        }

        let total: usize = doc_len.iter().sum();
        let avgdl = if corpus.is_empty() { 0.0 } else { total as f64 / corpus.len() as f64 };

        let n = corpus.len() as f64;
        let mut idf: HashMap<String, f64> = HashMap::with_capacity(nd.len());
        let mut idf_sum = 0.0;
        let mut negative: Vec<String> = Vec::new();
        for (term, df) in nd {
            let df = df as f64;
            let value = (n - df + 0.5).ln() - (df + 0.5).ln();
            idf_sum += value;
            if value < 0.0 {
                negative.push(term.clone());
            }
            idf.insert(term, value);
        }
        if !idf.is_empty() {
            let eps = params.epsilon * (idf_sum / idf.len() as f64);
            for term in negative {
                idf.insert(term, eps);
            }
        }

        Bm25Okapi { params, doc_len, avgdl, doc_freqs, idf }
    }

    /// One score per document, in corpus order. Repeated query tokens count repeatedly.
    pub fn get_scores(&self, query: &[String]) -> Vec<f64> {
        let mut scores = vec![0.0; self.doc_len.len()];
        if self.doc_len.is_empty() {
            return scores;
        }
        let Bm25Params { k1, b, .. } = self.params;
        // All-empty corpus: avoid dividing by a zero average length.
        let avgdl = if self.avgdl > 0.0 { self.avgdl } else { 1.0 };

        for token in query {
            let Some(&idf) = self.idf.get(token) else {
                continue;
            };
            for (i, freqs) in self.doc_freqs.iter().enumerate() {
                let tf = freqs.get(token).copied().unwrap_or(0) as f64;
                if tf == 0.0 {
                    continue;
                }
                let dl = self.doc_len[i] as f64;
                scores[i] += idf * (tf * (k1 + 1.0)) / (tf + k1 * (1.0 - b + b * dl / avgdl));
            }
        }
        scores
    }

    pub fn len(&self) -> usize {
        self.doc_len.len()
    }

    pub fn is_empty(&self) -> bool {
        self.doc_len.is_empty()
    }
}
