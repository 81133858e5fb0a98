use thiserror::Error;

pub const UNAUTHORIZED: u16 = 401;

/// Classified outcome of an HTTP exchange.
///
/// A 401 is not a failure payload but a signal that the session must be
/// torn down, so it gets its own variant.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum ApiResponse<T, P> {
    Ok(T),
    AuthExpired,
    Failure(P),
}

impl<T, P> ApiResponse<T, P> {
    /// Classify by status code. `ok` is only called for 2xx, `failure` only
    /// for non-2xx codes other than 401.
    pub fn classify<O, F>(status: u16, ok: O, failure: F) -> Self
    where
        O: FnOnce() -> T,
        F: FnOnce() -> P,
    {
        match status {
            UNAUTHORIZED => ApiResponse::AuthExpired,
            200..=299 => ApiResponse::Ok(ok()),
            _ => ApiResponse::Failure(failure()),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, ApiResponse::Ok(_))
    }

    pub fn is_auth_expired(&self) -> bool {
        matches!(self, ApiResponse::AuthExpired)
    }

    pub fn into_result(self) -> Result<T, ApiError<P>> {
        match self {
            ApiResponse::Ok(data) => Ok(data),
            ApiResponse::AuthExpired => Err(ApiError::AuthExpired),
            ApiResponse::Failure(payload) => Err(ApiError::Failure(payload)),
        }
    }
}

#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum ApiError<P> {
    #[error("please sign in again")]
    AuthExpired,

    #[error("request failed: {0:?}")]
    Failure(P),
}

impl<P> ApiError<P> {
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, ApiError::AuthExpired)
    }
}

#[cfg(feature = "serde")]
mod json {
    use super::{ApiResponse, UNAUTHORIZED};
    use serde::de::DeserializeOwned;
    use serde_json::{Map, Value};

    impl<T: DeserializeOwned> ApiResponse<T, Value> {
        /// Decode a response body. A success body that does not decode
        /// becomes a `Failure` carrying the decoder's message; a failure
        /// body that is not JSON is kept as a string.
        pub fn from_json(status: u16, body: &[u8]) -> Self {
            match status {
                UNAUTHORIZED => ApiResponse::AuthExpired,
                200..=299 => match serde_json::from_slice(body) {
                    Ok(data) => ApiResponse::Ok(data),
                    Err(error) => ApiResponse::Failure(Value::String(error.to_string())),
                },
                _ => ApiResponse::Failure(serde_json::from_slice(body).unwrap_or_else(|_| {
                    Value::String(String::from_utf8_lossy(body).into_owned())
                })),
            }
        }
    }

    /// Drop `null` and empty-string entries from a parameter object.
    /// `0` and `false` are kept.
    pub fn clean_params(params: Map<String, Value>) -> Map<String, Value> {
        params
            .into_iter()
            .filter(|(_, value)| !is_void(value))
            .collect()
    }

    fn is_void(value: &Value) -> bool {
        match value {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            _ => false,
        }
    }
}

#[cfg(feature = "serde")]
pub use json::clean_params;
