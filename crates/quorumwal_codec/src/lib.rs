//! # QuorumWAL Codec
//!
//! Self-describing CBOR encoding for WAL messages.
//!
//! Every loggable message encodes as a CBOR map carrying an explicit
//! variant tag, so a decoder can reconstruct the correct variant from the
//! bytes alone - no schema negotiation, no runtime type discovery.
//!
//! The heavy lifting is done by `ciborium`; this crate adds the
//! [`Encode`]/[`Decode`] seams the WAL writer is wired against and the
//! [`value`] accessors message decoders are built from.
//!
//! ## Usage
//!
//! ```
//! use quorumwal_codec::{from_cbor, to_cbor, value};
//!
//! let v = value::map([("height", value::uint(4))]);
//! let bytes = to_cbor(&v).unwrap();
//! let decoded = from_cbor(&bytes).unwrap();
//! assert_eq!(v, decoded);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
pub mod value;

pub use ciborium::value::Value;
pub use error::{CodecError, CodecResult};

/// Encodes a CBOR value to bytes.
///
/// # Errors
///
/// Returns `EncodingFailed` if serialization fails.
pub fn to_cbor(value: &Value) -> CodecResult<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::ser::into_writer(value, &mut buf)
        .map_err(|e| CodecError::encoding_failed(e.to_string()))?;
    Ok(buf)
}

/// Decodes a CBOR value from bytes.
///
/// # Errors
///
/// Returns `DecodingFailed` if the bytes are not well-formed CBOR.
pub fn from_cbor(bytes: &[u8]) -> CodecResult<Value> {
    ciborium::de::from_reader(bytes).map_err(|e| CodecError::decoding_failed(e.to_string()))
}

/// Trait for types with a self-describing CBOR encoding.
pub trait Encode {
    /// Encodes this value to CBOR bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn encode(&self) -> CodecResult<Vec<u8>>;
}

/// Trait for types decodable from self-describing CBOR.
pub trait Decode: Sized {
    /// Decodes this value from CBOR bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are malformed or the variant tag is
    /// unknown.
    fn decode(bytes: &[u8]) -> CodecResult<Self>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_map() {
        let v = value::map([
            ("height", value::uint(42)),
            ("step", value::text("prevote")),
        ]);
        let bytes = to_cbor(&v).unwrap();
        let decoded = from_cbor(&bytes).unwrap();
        assert_eq!(v, decoded);
    }

    #[test]
    fn roundtrip_nested() {
        let v = value::map([
            ("type", value::uint(2)),
            (
                "body",
                value::map([
                    ("peer", value::text("node-3")),
                    ("data", value::bytes(vec![0xCA, 0xFE])),
                ]),
            ),
        ]);
        let bytes = to_cbor(&v).unwrap();
        assert_eq!(from_cbor(&bytes).unwrap(), v);
    }

    #[test]
    fn decode_rejects_garbage() {
        // 0xFF is a lone "break" byte, not a valid top-level item
        assert!(from_cbor(&[0xFF]).is_err());
    }

    #[test]
    fn decode_rejects_empty_input() {
        assert!(from_cbor(&[]).is_err());
    }
}
