use rand::{distr::Alphanumeric, Rng};

/// Length of the `state` parameter sent with the authorization request.
pub const STATE_LENGTH: usize = 16;

/// Random string of `length` characters from `a-z`, `A-Z` and `0-9`.
pub fn gen_random_str(length: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_requested_length_and_alphabet() {
        for length in [0, 1, 16, 64, 257] {
            let s = gen_random_str(length);
            assert_eq!(s.chars().count(), length);
            assert!(s.chars().all(|c| c.is_ascii_alphanumeric()), "{s}");
        }
    }

    #[test]
    fn successive_values_differ() {
        assert_ne!(gen_random_str(STATE_LENGTH), gen_random_str(STATE_LENGTH));
    }
}
