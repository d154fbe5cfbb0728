use thiserror::Error;

/// Errors produced while reading a bit stream.
///
/// Every variant means the stream can no longer be trusted to be aligned with
/// the reader's expectations, so callers treat any `SerdeErr` as fatal for the
/// packet it came from.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerdeErr {
    /// The stream ended before the requested number of bits could be read
    #[error("Attempted to read {needed} bits but only {remaining} remain in the stream")]
    OutOfBits { needed: u32, remaining: u32 },

    /// A ranged value decoded outside of its declared bounds
    #[error("Decoded value {value} lies outside of the declared range [{min}, {max}]")]
    OutOfRange { value: i64, min: i64, max: i64 },

    /// A closed enumeration received a discriminant it does not know
    #[error("Invalid {type_name} tag: {tag}")]
    InvalidTag { type_name: &'static str, tag: u32 },

    /// A length prefix announced more data than the field allows
    #[error("Length prefix {len} exceeds the maximum of {max}")]
    LengthExceeded { len: u64, max: u64 },

    /// A string field did not contain valid UTF-8
    #[error("String field is not valid UTF-8")]
    InvalidUtf8,
}
