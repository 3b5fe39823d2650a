use serde::{de::DeserializeOwned, Serialize};
use snafu::location;

use crate::error::{Error, Result};

/// Serializes `value` as JSON text.
pub fn encode_json<T>(value: &T) -> Result<String>
where
    T: Serialize + ?Sized,
{
    serde_json::to_string(value).map_err(|e| Error::Encoding {
        message: format!("cannot encode JSON: {e}"),
        location: location!(),
    })
}

/// Parses JSON text. The input must be valid UTF-8 before it is parsed.
pub fn decode_json<T>(input: impl AsRef<[u8]>) -> Result<T>
where
    T: DeserializeOwned,
{
    let text = std::str::from_utf8(input.as_ref()).map_err(|e| Error::Decoding {
        message: format!("JSON payload is not valid UTF-8: {e}"),
        location: location!(),
    })?;

    serde_json::from_str(text).map_err(|e| Error::Decoding {
        message: format!("cannot decode JSON: {e}"),
        location: location!(),
    })
}
