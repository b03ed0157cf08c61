//! Decoder policy and resource limits.

/// Policy flags and resource limits applied by both decoders.
///
/// Defaults match the conservative policy table: reject anything that
/// would make a document ambiguous or unsafe to re-emit, and bound every
/// resource a hostile document could try to exhaust.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Limits {
    /// Reject strings containing a NUL byte.
    pub reject_nul: bool,
    /// Reject strings that are not valid UTF-8.
    pub reject_invalid_utf8: bool,
    /// Reject objects that define the same key more than once.
    pub reject_duplicate_keys: bool,
    /// Reject any bytes remaining after a complete top-level value.
    pub reject_trailing_bytes: bool,
    /// Reject float values that are NaN or +/-Infinity.
    pub reject_nan_infinity: bool,
    /// Reject string/typed-array length prefixes that aren't the minimal
    /// encoding for their value. Off by default: spec only requires this
    /// for the string/typed-array length field, never for integer tag
    /// width selection, which decoders must always accept.
    pub reject_noncanonical_lengths: bool,
    /// Maximum container nesting depth.
    pub max_depth: usize,
    /// Maximum length, in bytes, of any single string.
    pub max_string_length: usize,
    /// Maximum number of elements in any single array or object.
    pub max_container_size: usize,
    /// Maximum total size, in bytes, of the document.
    pub max_document_size: usize,
    /// Maximum size, in bytes, of a big number's magnitude (significand).
    pub max_bignum_magnitude: usize,
    /// Maximum number of record definitions the position-map decoder's
    /// side table will hold.
    pub max_record_defs: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Limits {
            reject_nul: true,
            reject_invalid_utf8: true,
            reject_duplicate_keys: true,
            reject_trailing_bytes: true,
            reject_nan_infinity: true,
            reject_noncanonical_lengths: false,
            max_depth: 512,
            max_string_length: 10_000_000,
            max_container_size: 1_000_000,
            max_document_size: 2_000_000_000,
            max_bignum_magnitude: 8,
            max_record_defs: 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_policy_table() {
        let limits = Limits::default();
        assert!(limits.reject_nul);
        assert!(limits.reject_invalid_utf8);
        assert!(limits.reject_duplicate_keys);
        assert!(limits.reject_trailing_bytes);
        assert!(limits.reject_nan_infinity);
        assert!(!limits.reject_noncanonical_lengths);
        assert_eq!(limits.max_depth, 512);
        assert_eq!(limits.max_string_length, 10_000_000);
        assert_eq!(limits.max_container_size, 1_000_000);
        assert_eq!(limits.max_document_size, 2_000_000_000);
        assert_eq!(limits.max_bignum_magnitude, 8);
        assert_eq!(limits.max_record_defs, 1024);
    }
}
