//! Harmonic Token Projection (HTP) embedding
//!
//! Deterministic, training-free embeddings used when no remote provider is
//! configured. Each token is read as a base-2^16 integer `N`; for every
//! modulus `m` the residue `N mod m` is projected onto the unit circle as
//! `[sin(2πr/m), cos(2πr/m)]`. Token vectors are mean-pooled and L2
//! normalized.
//!
//! See "Harmonic Token Projection: A Vocabulary-Free, Training-Free,
//! Deterministic, and Reversible Embedding Methodology"
//! (https://arxiv.org/html/2511.20665).

use std::f64::consts::TAU;

/// Output dimension, two components per modulus.
pub const HTP_DIM: usize = 384;

const NUM_MODULI: usize = HTP_DIM / 2;

/// Tokens longer than this many code points are truncated.
const MAX_TOKEN_CHARS: usize = 64;

/// Primes, pairwise coprime by construction. Only the first `NUM_MODULI` are used.
static MODULI: &[u64] = &[
    2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53, 59, 61, 67, 71,
    73, 79, 83, 89, 97, 101, 103, 107, 109, 113, 127, 131, 137, 139, 149, 151,
    157, 163, 167, 173, 179, 181, 191, 193, 197, 199, 211, 223, 227, 229, 233,
    239, 241, 251, 257, 263, 269, 271, 277, 281, 283, 293, 307, 311, 313, 317,
    331, 337, 347, 349, 353, 359, 367, 373, 379, 383, 389, 397, 401, 409, 419,
    421, 431, 433, 439, 443, 449, 457, 461, 463, 467, 479, 487, 491, 499, 503,
    509, 521, 523, 541, 547, 557, 563, 569, 571, 577, 587, 593, 599, 601, 607,
    613, 617, 619, 631, 641, 643, 647, 653, 659, 661, 673, 677, 683, 691, 701,
    709, 719, 727, 733, 739, 743, 751, 757, 761, 769, 773, 787, 797, 809, 811,
    821, 823, 827, 829, 839, 853, 857, 859, 863, 877, 881, 883, 887, 907, 911,
    919, 929, 937, 941, 947, 953, 967, 971, 977, 983, 991, 997, 1009, 1013,
    1019, 1021, 1031, 1033, 1039, 1049, 1051, 1061, 1063, 1069, 1087, 1091,
    1093, 1097, 1103, 1109, 1117, 1123, 1129, 1151, 1153, 1163, 1171, 1181,
];

#[derive(Debug, Clone, Copy, Default)]
pub struct HtpModel;

impl HtpModel {
    pub fn new() -> Self {
        Self
    }

    /// Embed one text. Text without any token maps to the zero vector.
    pub fn embed(&self, text: &str) -> Vec<f64> {
        let mut pooled = vec![0.0f64; HTP_DIM];
        let mut count = 0usize;

        for token in tokenize(text) {
            let n = token_to_integer(&token);
            for (i, &m) in MODULI.iter().take(NUM_MODULI).enumerate() {
                let theta = TAU * (n % m) as f64 / m as f64;
                pooled[2 * i] += theta.sin();
                pooled[2 * i + 1] += theta.cos();
            }
            count += 1;
        }

        if count == 0 {
            return pooled;
        }

        let norm = pooled.iter().map(|x| x * x).sum::<f64>().sqrt();
        if norm > 0.0 {
            // Mean pooling cancels out under L2 normalization.
            pooled.iter_mut().for_each(|x| *x /= norm);
        }
        pooled
    }
}

/// Lowercased words split on whitespace and ASCII punctuation.
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| c.is_whitespace() || c.is_ascii_punctuation())
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase)
}

fn token_to_integer(token: &str) -> u64 {
    token
        .chars()
        .take(MAX_TOKEN_CHARS)
        .fold(0u64, |n, c| n.wrapping_mul(65536).wrapping_add(c as u64))
}

/// Cosine similarity in [-1, 1]. Mismatched lengths and zero vectors score 0.
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f64>().sqrt();

    if norm_a > 0.0 && norm_b > 0.0 {
        dot / (norm_a * norm_b)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_htp_deterministic() {
        let text = "Groceries for the weekend";
        let a = HtpModel::new().embed(text);
        let b = HtpModel::new().embed(text);
        assert_eq!(a, b);
        assert_eq!(a.len(), HTP_DIM);
        assert_ne!(a, HtpModel::new().embed("quarterly budget review"));
    }

    #[test]
    fn test_htp_is_normalized() {
        let v = HtpModel::new().embed("한국어 테스트 and English");
        let norm = v.iter().map(|x| x * x).sum::<f64>().sqrt();
        assert!((norm - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_htp_empty_text_is_zero_vector() {
        let v = HtpModel::new().embed("  ... ");
        assert!(v.iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_htp_case_and_punctuation_insensitive() {
        let model = HtpModel::new();
        assert_eq!(model.embed("Hello, World!"), model.embed("hello world"));
    }

    #[test]
    fn test_cosine_similarity() {
        let a = [1.0, 0.0, 0.0];
        assert!((cosine_similarity(&a, &[2.0, 0.0, 0.0]) - 1.0).abs() < 1e-9);
        assert!(cosine_similarity(&a, &[0.0, 1.0, 0.0]).abs() < 1e-9);
        assert!((cosine_similarity(&a, &[-1.0, 0.0, 0.0]) + 1.0).abs() < 1e-9);
        assert_eq!(cosine_similarity(&a, &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&a, &[0.0, 0.0, 0.0]), 0.0);
    }
}
