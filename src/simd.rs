//! Accelerated byte scans used by the string- and typed-array-handling
//! paths. Wraps [`bytecount`] where it specializes, with a scalar fallback
//! everywhere else.

/// Returns the offset of the first occurrence of `needle` in `haystack`, if
/// any.
pub fn find_byte(haystack: &[u8], needle: u8) -> Option<usize> {
    haystack.iter().position(|&b| b == needle)
}

/// Returns `true` if `needle` occurs anywhere in `haystack`.
pub fn contains_byte(haystack: &[u8], needle: u8) -> bool {
    bytecount::count(haystack, needle) > 0
}

/// Returns `true` if every byte in `s` is in the ASCII range (`< 0x80`).
///
/// Used as a fast path before falling back to full UTF-8 validation.
pub fn all_ascii(s: &[u8]) -> bool {
    let ascii_count = bytecount::num_chars(s);
    // num_chars counts UTF-8 codepoints, which equals byte length only when
    // every byte is a single-byte (ASCII) codepoint.
    ascii_count == s.len() && s.iter().all(|&b| b < 0x80)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_byte_present() {
        assert_eq!(find_byte(b"hello\0world", 0), Some(5));
    }

    #[test]
    fn find_byte_absent() {
        assert_eq!(find_byte(b"hello", 0), None);
    }

    #[test]
    fn contains_byte_works() {
        assert!(contains_byte(b"a\xffb", 0xff));
        assert!(!contains_byte(b"abc", 0xff));
    }

    #[test]
    fn all_ascii_true_for_plain_text() {
        assert!(all_ascii(b"hello world"));
    }

    #[test]
    fn all_ascii_false_for_multibyte() {
        assert!(!all_ascii("héllo".as_bytes()));
    }

    #[test]
    fn all_ascii_empty() {
        assert!(all_ascii(b""));
    }
}
