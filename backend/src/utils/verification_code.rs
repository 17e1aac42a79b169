use rand::Rng;

/// Generates a single-use 6-digit numeric verification code.
///
/// The code is uniformly distributed over `[100000, 999999]` and returned as
/// a string so the leading digit is preserved wherever it travels.
pub fn generate_verification_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_is_six_digits() {
        for _ in 0..100 {
            let code = generate_verification_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
            assert_ne!(code.chars().next(), Some('0'));
        }
    }

    #[test]
    fn codes_vary() {
        let first = generate_verification_code();
        let distinct = (0..20).any(|_| generate_verification_code() != first);
        assert!(distinct);
    }
}
