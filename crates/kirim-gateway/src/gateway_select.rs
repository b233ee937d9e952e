//! Sampling utilities: random backend candidates and correlation tokens.
//!
//! Selection is uniform sampling, not load balancing; no history is kept
//! across calls.

use rand::Rng;

const ALNUM_ALPHABET: &[u8] =
    b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Draws a backend id uniformly from `min..=max`, redrawing while the
/// draw is excluded. Callers must not exclude the entire range.
pub fn draw_candidate_backend(min: u32, max: u32, excluded: &[u32]) -> u32 {
    let mut rng = rand::thread_rng();
    loop {
        let candidate = rng.gen_range(min..=max);
        if !excluded.contains(&candidate) {
            return candidate;
        }
    }
}

/// Random alphanumeric token, used for generated correlation ids and
/// per-message relay ids.
pub fn random_alnum_token(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| ALNUM_ALPHABET[rng.gen_range(0..ALNUM_ALPHABET.len())] as char)
        .collect()
}
