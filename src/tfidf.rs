//! TF-IDF features and ridge regression.
//!
//! A small, dependency-free text regressor: sublinear term frequencies,
//! smoothed inverse document frequencies, L2-normalized rows, and a ridge
//! fit with an intercept solved by conjugate gradient on the normal
//! equations. Rows stay sparse; the solver never builds the Gram matrix.

use std::collections::{BTreeMap, HashMap};

/// Sparse row: `(term index, weight)` pairs sorted by index.
pub type SparseRow = Vec<(usize, f64)>;

const STOP_WORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "as", "at", "be", "been", "before", "being", "below", "between", "both", "but", "by",
    "can", "could", "did", "do", "does", "doing", "down", "during", "each", "few", "for", "from",
    "further", "had", "has", "have", "having", "he", "her", "here", "hers", "herself", "him",
    "himself", "his", "how", "however", "if", "in", "into", "is", "it", "its", "itself", "just",
    "may", "me", "more", "most", "must", "my", "myself", "no", "nor", "not", "now", "of", "off",
    "on", "once", "only", "or", "other", "our", "ours", "ourselves", "out", "over", "own", "same",
    "she", "should", "so", "some", "such", "than", "that", "the", "their", "theirs", "them",
    "themselves", "then", "there", "these", "they", "this", "those", "through", "thus", "to",
    "too", "under", "until", "up", "upon", "very", "via", "was", "we", "were", "what", "when",
    "where", "which", "while", "who", "whom", "why", "will", "with", "within", "without", "would",
    "you", "your", "yours", "yourself", "yourselves",
];

/// Lowercased alphanumeric runs of at least two characters, stop words removed.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() >= 2)
        .map(|t| t.to_lowercase())
        .filter(|t| !STOP_WORDS.contains(&t.as_str()))
        .collect()
}

/// Vocabulary and idf weights learned from a training corpus.
#[derive(Debug, Clone)]
pub struct TfidfVectorizer {
    vocabulary: HashMap<String, usize>,
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    /// Learn the vocabulary from `texts`.
    ///
    /// Terms are kept when they occur in at least `min_df` documents and in
    /// no more than `max_df` (a fraction) of them.
    pub fn fit(texts: &[String], min_df: usize, max_df: f64) -> Self {
        let n = texts.len();
        let mut df: BTreeMap<String, usize> = BTreeMap::new();
        for text in texts {
            let mut terms = tokenize(text);
            terms.sort();
            terms.dedup();
            for term in terms {
                *df.entry(term).or_insert(0) += 1;
            }
        }

        let max_count = max_df * n as f64;
        let mut vocabulary = HashMap::new();
        let mut idf = Vec::new();
        for (term, count) in df {
            if count < min_df || count as f64 > max_count {
                continue;
            }
            vocabulary.insert(term, idf.len());
            idf.push(((1.0 + n as f64) / (1.0 + count as f64)).ln() + 1.0);
        }

        Self { vocabulary, idf }
    }

    pub fn vocabulary_len(&self) -> usize {
        self.idf.len()
    }

    /// Vectorize one text against the learned vocabulary.
    pub fn transform(&self, text: &str) -> SparseRow {
        let mut counts: BTreeMap<usize, usize> = BTreeMap::new();
        for term in tokenize(text) {
            if let Some(&idx) = self.vocabulary.get(&term) {
                *counts.entry(idx).or_insert(0) += 1;
            }
        }

        let mut row: SparseRow = counts
            .into_iter()
            .map(|(idx, tf)| (idx, (1.0 + (tf as f64).ln()) * self.idf[idx]))
            .collect();

        let norm = row.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > f64::EPSILON {
            for (_, w) in row.iter_mut() {
                *w /= norm;
            }
        }
        row
    }
}

/// Linear model with intercept fitted by ridge regression.
#[derive(Debug, Clone)]
pub struct RidgeModel {
    weights: Vec<f64>,
    intercept: f64,
}

const CG_TOLERANCE: f64 = 1e-8;

impl RidgeModel {
    /// Fit `rows` (with `dims` columns) to `targets`.
    ///
    /// Minimizes `‖Xc·w − yc‖² + alpha·‖w‖²` where `Xc` and `yc` are the
    /// column- and target-centered data, then recovers the intercept.
    pub fn fit(rows: &[SparseRow], targets: &[f64], dims: usize, alpha: f64) -> Self {
        let n = rows.len();
        if n == 0 {
            return Self {
                weights: vec![0.0; dims],
                intercept: 0.0,
            };
        }

        let y_mean = targets.iter().sum::<f64>() / n as f64;
        let mut x_mean = vec![0.0; dims];
        for row in rows {
            for &(j, v) in row {
                x_mean[j] += v;
            }
        }
        for m in x_mean.iter_mut() {
            *m /= n as f64;
        }
        let yc: Vec<f64> = targets.iter().map(|y| y - y_mean).collect();

        // A·v = Xcᵀ(Xc·v) + alpha·v
        let apply = |v: &[f64]| -> Vec<f64> {
            let xv = centered_mul(rows, &x_mean, v);
            let mut out = centered_mul_t(rows, &x_mean, &xv, dims);
            for (o, vi) in out.iter_mut().zip(v) {
                *o += alpha * vi;
            }
            out
        };

        let b = centered_mul_t(rows, &x_mean, &yc, dims);
        let mut w = vec![0.0; dims];
        let mut r = b.clone();
        let mut p = r.clone();
        let mut rs_old = dot(&r, &r);
        let b_norm = rs_old.sqrt();

        if b_norm > f64::EPSILON {
            for _ in 0..dims.max(1) * 2 {
                let ap = apply(&p);
                let denom = dot(&p, &ap);
                if denom.abs() < f64::EPSILON {
                    break;
                }
                let step = rs_old / denom;
                for j in 0..dims {
                    w[j] += step * p[j];
                    r[j] -= step * ap[j];
                }
                let rs_new = dot(&r, &r);
                if rs_new.sqrt() <= CG_TOLERANCE * b_norm {
                    break;
                }
                let beta = rs_new / rs_old;
                for j in 0..dims {
                    p[j] = r[j] + beta * p[j];
                }
                rs_old = rs_new;
            }
        }

        let intercept = y_mean - dot(&x_mean, &w);
        Self {
            weights: w,
            intercept,
        }
    }

    pub fn predict(&self, row: &SparseRow) -> f64 {
        self.intercept
            + row
                .iter()
                .map(|&(j, v)| v * self.weights.get(j).copied().unwrap_or(0.0))
                .sum::<f64>()
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// `Xc·v` for centered sparse rows.
fn centered_mul(rows: &[SparseRow], x_mean: &[f64], v: &[f64]) -> Vec<f64> {
    let shift = dot(x_mean, v);
    rows.iter()
        .map(|row| row.iter().map(|&(j, x)| x * v[j]).sum::<f64>() - shift)
        .collect()
}

/// `Xcᵀ·u` for centered sparse rows.
fn centered_mul_t(rows: &[SparseRow], x_mean: &[f64], u: &[f64], dims: usize) -> Vec<f64> {
    let mut out = vec![0.0; dims];
    for (row, &ui) in rows.iter().zip(u) {
        for &(j, x) in row {
            out[j] += x * ui;
        }
    }
    let u_sum: f64 = u.iter().sum();
    for (o, m) in out.iter_mut().zip(x_mean) {
        *o -= m * u_sum;
    }
    out
}
