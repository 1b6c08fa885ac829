//! The pluggable value-serializer surface.
//!
//! The vault core only ever sees bytes. Strings and raw byte values go
//! through the built-in `set`/`get` and `set_bytes`/`get_bytes`
//! methods; anything richer is injected by the caller as a [`Codec`]
//! so the core never inspects user types.

use crate::errors::{Error, Result};

/// Encode and decode a user value to and from the bytes that get
/// encrypted into a vault.
pub trait Codec<T> {
    fn encode(&self, value: &T) -> Result<Vec<u8>>;
    fn decode(&self, bytes: &[u8]) -> Result<T>;
}

/// The default string codec: raw UTF-8, no byte-order mark.
pub struct Utf8Codec;

impl Codec<String> for Utf8Codec {
    fn encode(&self, value: &String) -> Result<Vec<u8>> {
        Ok(value.as_bytes().to_vec())
    }

    fn decode(&self, bytes: &[u8]) -> Result<String> {
        String::from_utf8(bytes.to_vec())
            .map_err(|_| Error::ValueEncoding("value is not valid UTF-8".into()))
    }
}

/// The default binary codec: bytes pass through untouched.
pub struct BytesCodec;

impl Codec<Vec<u8>> for BytesCodec {
    fn encode(&self, value: &Vec<u8>) -> Result<Vec<u8>> {
        Ok(value.clone())
    }

    fn decode(&self, bytes: &[u8]) -> Result<Vec<u8>> {
        Ok(bytes.to_vec())
    }
}
