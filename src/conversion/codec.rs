// Canonical Codec - one JSON encoding shared by every complex attribute type

use chrono::{DateTime, NaiveDate, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::marker::PhantomData;

use crate::error::{AppError, AppResult};

/// Schema descriptor for a type that may be stored or transmitted in canonical form.
///
/// The encoding itself comes from the serde derive on the type, so registering a
/// new complex attribute only needs an impl of this trait (see [`canonical!`]).
pub trait Canonical: Serialize + DeserializeOwned + 'static {
    /// Name used in diagnostics, e.g. `List<AccessPolicy>`.
    fn type_name() -> String;
}

/// Registers record types as [`Canonical`], named after the type itself.
#[macro_export]
macro_rules! canonical {
    ($($ty:ident),+ $(,)?) => {
        $(
            impl $crate::conversion::Canonical for $ty {
                fn type_name() -> String {
                    stringify!($ty).to_string()
                }
            }
        )+
    };
}

impl<T: Canonical> Canonical for Vec<T> {
    fn type_name() -> String {
        format!("List<{}>", T::type_name())
    }
}

impl Canonical for DateTime<Utc> {
    fn type_name() -> String {
        "Instant".to_string()
    }
}

impl Canonical for NaiveDate {
    fn type_name() -> String {
        "LocalDate".to_string()
    }
}

/// Encoder/decoder pair for one canonical type.
pub struct Codec<T> {
    _type: PhantomData<fn() -> T>,
}

impl<T: Canonical> Codec<T> {
    pub const fn new() -> Self {
        Self { _type: PhantomData }
    }

    pub fn type_name(&self) -> String {
        T::type_name()
    }

    /// Encode a value into its canonical string.
    pub fn encode(&self, value: &T) -> AppResult<String> {
        serde_json::to_string(value).map_err(|e| {
            AppError::SerializationError(format!("failed to encode {}: {}", T::type_name(), e))
        })
    }

    /// Decode a canonical string. Truncated input, unknown or missing fields,
    /// wrong field types and trailing characters are all rejected.
    pub fn decode(&self, raw: &str) -> AppResult<T> {
        serde_json::from_str(raw).map_err(|e| {
            AppError::MalformedEncoding(format!(
                "not a valid encoding of {}: {}",
                T::type_name(),
                e
            ))
        })
    }

    /// Decode a value that has already been parsed into structured form.
    pub fn decode_value(&self, value: &Value) -> AppResult<T> {
        T::deserialize(value).map_err(|e| {
            AppError::MalformedEncoding(format!("not a valid {}: {}", T::type_name(), e))
        })
    }
}

impl<T: Canonical> Default for Codec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for Codec<T>
where
    T: Canonical,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Codec").field("type", &T::type_name()).finish()
    }
}
