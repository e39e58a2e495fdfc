use rand::Rng;

/// Length of an issued access key.
pub const KEY_LENGTH: usize = 6;

const KEY_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Draw a random key of `length` characters from `A-Z0-9`.
///
/// Nothing here prevents two draws from colliding; the directory checks
/// issued keys before it stores a new one.
pub fn generate_key(length: usize) -> String {
    let mut rng = rand::rng();
    (0..length)
        .map(|_| KEY_ALPHABET[rng.random_range(0..KEY_ALPHABET.len())] as char)
        .collect()
}

/// True when `s` looks like a key this module could have issued.
pub fn is_key_format(s: &str) -> bool {
    s.len() == KEY_LENGTH
        && s
            .bytes()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_keys_use_the_key_alphabet() {
        for _ in 0..200 {
            let k = generate_key(KEY_LENGTH);
            assert_eq!(k.len(), KEY_LENGTH);
            assert!(is_key_format(&k), "unexpected key {k}");
        }
    }

    #[test]
    fn key_format_rejects_lowercase_and_separators() {
        assert!(is_key_format("AB12CD"));
        assert!(!is_key_format("ab12cd"));
        assert!(!is_key_format("AB12C"));
        assert!(!is_key_format("../ABC"));
        assert!(!is_key_format(""));
    }
}
