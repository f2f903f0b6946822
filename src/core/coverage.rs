//! Service-area matching between job locations and worker coverage tokens.
//!
//! Coverage tokens are opaque strings (zones, counties, cities, postal codes).
//! A job matches when its city or postal code equals a token after trimming
//! and case-folding. There is no substring matching and no notion of one area
//! containing another: a worker covering a county does not implicitly cover
//! the cities inside it.

/// Canonical form used for comparisons.
pub fn normalize_token(token: &str) -> String {
    token.trim().to_lowercase()
}

/// True iff the job's city or postal code equals one coverage token.
///
/// An empty coverage list matches nothing, and so does a blank city or
/// postal code.
pub fn matches<S: AsRef<str>>(job_city: &str, job_postal_code: &str, coverage: &[S]) -> bool {
    let city = normalize_token(job_city);
    let postal = normalize_token(job_postal_code);
    coverage.iter().any(|token| {
        let token = normalize_token(token.as_ref());
        !token.is_empty() && (token == city || token == postal)
    })
}
