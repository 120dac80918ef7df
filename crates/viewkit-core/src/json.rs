//! Lenient JSON converters
//!
//! Form posts and query strings (htmx `hx-vals`, hidden inputs) often carry
//! booleans and integers as strings. These converters accept either the
//! native token or its string form on read, and always write the native
//! form.
//!
//! Use them on fields with `#[serde(with = "...")]`, or wrap values in
//! [`LenientBool`] / [`LenientInt`]:
//!
//! ```rust,ignore
//! use serde::Deserialize;
//! use viewkit_core::json::{lenient_bool, lenient_opt_int};
//!
//! #[derive(Deserialize)]
//! struct Filter {
//!     #[serde(with = "lenient_bool")]
//!     active: bool,
//!     #[serde(default, with = "lenient_opt_int")]
//!     page: Option<i32>,
//! }
//!
//! let filter: Filter = serde_json::from_str(r#"{"active":"TRUE","page":"  "}"#)?;
//! assert!(filter.active);
//! assert_eq!(filter.page, None);
//! ```
//!
//! Any token that cannot be read as the target type is rejected with a
//! `cannot convert token to ...` error from the data format.

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

fn parse_bool(text: &str) -> Option<bool> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("true") {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Read a boolean from `true`/`false` or a case-insensitive string form
pub mod lenient_bool {
    use super::*;

    struct BoolVisitor;

    impl<'de> Visitor<'de> for BoolVisitor {
        type Value = bool;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a boolean or a string containing a boolean")
        }

        fn visit_bool<E: de::Error>(self, value: bool) -> Result<bool, E> {
            Ok(value)
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<bool, E> {
            parse_bool(value).ok_or_else(|| {
                E::custom(format!("cannot convert token to boolean: {:?}", value))
            })
        }

        fn visit_i64<E: de::Error>(self, _: i64) -> Result<bool, E> {
            Err(E::custom("cannot convert token to boolean: number"))
        }

        fn visit_u64<E: de::Error>(self, _: u64) -> Result<bool, E> {
            Err(E::custom("cannot convert token to boolean: number"))
        }

        fn visit_f64<E: de::Error>(self, _: f64) -> Result<bool, E> {
            Err(E::custom("cannot convert token to boolean: number"))
        }

        fn visit_unit<E: de::Error>(self) -> Result<bool, E> {
            Err(E::custom("cannot convert token to boolean: null"))
        }
    }

    /// Deserialize a lenient boolean
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        deserializer.deserialize_any(BoolVisitor)
    }

    /// Serialize as a native boolean
    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bool(*value)
    }
}

/// Read an optional `i32` from a number, a numeric string, `null`, or a blank string
pub mod lenient_opt_int {
    use super::*;

    struct IntVisitor;

    impl<'de> Visitor<'de> for IntVisitor {
        type Value = Option<i32>;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("an integer, a string containing an integer, or null")
        }

        fn visit_unit<E: de::Error>(self) -> Result<Option<i32>, E> {
            Ok(None)
        }

        fn visit_none<E: de::Error>(self) -> Result<Option<i32>, E> {
            Ok(None)
        }

        fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Option<i32>, D::Error> {
            deserializer.deserialize_any(IntVisitor)
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<Option<i32>, E> {
            i32::try_from(value)
                .map(Some)
                .map_err(|_| E::custom(format!("cannot convert token to int: {} is out of range", value)))
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<Option<i32>, E> {
            i32::try_from(value)
                .map(Some)
                .map_err(|_| E::custom(format!("cannot convert token to int: {} is out of range", value)))
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> Result<Option<i32>, E> {
            Err(E::custom(format!("cannot convert token to int: {}", value)))
        }

        fn visit_bool<E: de::Error>(self, value: bool) -> Result<Option<i32>, E> {
            Err(E::custom(format!("cannot convert token to int: {}", value)))
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Option<i32>, E> {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed
                .parse::<i32>()
                .map(Some)
                .map_err(|_| E::custom(format!("cannot convert token to int: {:?}", value)))
        }
    }

    /// Deserialize a lenient optional integer
    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<i32>, D::Error> {
        deserializer.deserialize_any(IntVisitor)
    }

    /// Serialize as a native integer or `null`
    pub fn serialize<S: Serializer>(value: &Option<i32>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => serializer.serialize_i32(*v),
            None => serializer.serialize_none(),
        }
    }
}

/// Boolean that reads leniently and writes canonically
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LenientBool(pub bool);

impl Serialize for LenientBool {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        lenient_bool::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for LenientBool {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        lenient_bool::deserialize(deserializer).map(LenientBool)
    }
}

impl From<LenientBool> for bool {
    fn from(value: LenientBool) -> Self {
        value.0
    }
}

/// Optional integer that reads leniently and writes canonically
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LenientInt(pub Option<i32>);

impl Serialize for LenientInt {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        lenient_opt_int::serialize(&self.0, serializer)
    }
}

impl<'de> Deserialize<'de> for LenientInt {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        lenient_opt_int::deserialize(deserializer).map(LenientInt)
    }
}

impl From<LenientInt> for Option<i32> {
    fn from(value: LenientInt) -> Self {
        value.0
    }
}
