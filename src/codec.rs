//! Session payload codecs.
//!
//! A [`SessionCodec`] turns a session value into the text stored in a
//! record's `payload` field and back. [`JsonCodec`] is the default. The
//! binary codecs behind the `messagepack` and `bincode` features wrap their
//! output in base64 so the payload stays a string.

use serde::{Serialize, de::DeserializeOwned};
use std::fmt::Debug;

use crate::store::Error;

/// Encodes session values into stored text and decodes them back.
pub trait SessionCodec: Clone + Debug + Send + Sync + 'static {
    /// Encodes `value`, failing with [`Error::Encode`] when it cannot be represented.
    fn encode<T>(&self, value: &T) -> Result<String, Error>
    where
        T: Serialize + ?Sized;

    /// Decodes `payload`, failing with [`Error::Decode`] when it is not valid encoded data.
    fn decode<T>(&self, payload: &str) -> Result<T, Error>
    where
        T: DeserializeOwned;
}

/// The default codec, backed by [serde_json](https://crates.io/crates/serde_json).
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonCodec;

impl SessionCodec for JsonCodec {
    fn encode<T>(&self, value: &T) -> Result<String, Error>
    where
        T: Serialize + ?Sized,
    {
        serde_json::to_string(value).map_err(|e| Error::Encode(e.to_string()))
    }

    fn decode<T>(&self, payload: &str) -> Result<T, Error>
    where
        T: DeserializeOwned,
    {
        serde_json::from_str(payload).map_err(|e| Error::Decode(e.to_string()))
    }
}

#[cfg(any(feature = "messagepack", feature = "bincode"))]
fn decode_base64(payload: &str) -> Result<Vec<u8>, Error> {
    use base64::Engine;
    use base64::prelude::BASE64_STANDARD;

    BASE64_STANDARD
        .decode(payload)
        .map_err(|e| Error::Decode(e.to_string()))
}

#[cfg(any(feature = "messagepack", feature = "bincode"))]
fn encode_base64(bytes: &[u8]) -> String {
    use base64::Engine;
    use base64::prelude::BASE64_STANDARD;

    BASE64_STANDARD.encode(bytes)
}

/// A [MessagePack](https://crates.io/crates/rmp-serde) codec.
///
/// Structs are encoded as maps so that adding a field does not break
/// previously stored sessions.
#[cfg(feature = "messagepack")]
#[derive(Clone, Copy, Debug, Default)]
pub struct MessagePackCodec;

#[cfg(feature = "messagepack")]
impl SessionCodec for MessagePackCodec {
    fn encode<T>(&self, value: &T) -> Result<String, Error>
    where
        T: Serialize + ?Sized,
    {
        let bytes = rmp_serde::to_vec_named(value).map_err(|e| Error::Encode(e.to_string()))?;
        Ok(encode_base64(&bytes))
    }

    fn decode<T>(&self, payload: &str) -> Result<T, Error>
    where
        T: DeserializeOwned,
    {
        let bytes = decode_base64(payload)?;
        rmp_serde::from_slice(&bytes).map_err(|e| Error::Decode(e.to_string()))
    }
}

/// A [bincode](https://crates.io/crates/bincode) codec.
///
/// Bincode is not self-describing: values whose `Deserialize` relies on
/// `deserialize_any` (such as `serde_json::Value`) cannot be decoded.
#[cfg(feature = "bincode")]
#[derive(Clone, Copy, Debug, Default)]
pub struct BincodeCodec;

#[cfg(feature = "bincode")]
impl SessionCodec for BincodeCodec {
    fn encode<T>(&self, value: &T) -> Result<String, Error>
    where
        T: Serialize + ?Sized,
    {
        let bytes = bincode::serde::encode_to_vec(value, bincode::config::standard())
            .map_err(|e| Error::Encode(e.to_string()))?;
        Ok(encode_base64(&bytes))
    }

    fn decode<T>(&self, payload: &str) -> Result<T, Error>
    where
        T: DeserializeOwned,
    {
        let bytes = decode_base64(payload)?;
        let (value, _) = bincode::serde::decode_from_slice(&bytes, bincode::config::standard())
            .map_err(|e| Error::Decode(e.to_string()))?;
        Ok(value)
    }
}
