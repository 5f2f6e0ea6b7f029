// Property Converter - canonical codec adapted to nullable string node properties

use crate::conversion::codec::{Canonical, Codec};
use crate::error::AppResult;

/// Storage converter for one complex attribute type.
///
/// Entity modules declare one constant per type they persist, e.g.
/// `const HIGHLIGHT_GROUPS: PropertyConverter<Vec<HighlightGroup>> = PropertyConverter::new();`
pub struct PropertyConverter<T> {
    codec: Codec<T>,
}

impl<T: Canonical> PropertyConverter<T> {
    pub const fn new() -> Self {
        Self { codec: Codec::new() }
    }

    /// Absent value maps to an absent property.
    pub fn to_storage(&self, value: Option<&T>) -> AppResult<Option<String>> {
        value.map(|v| self.codec.encode(v)).transpose()
    }

    /// Absent property maps to an absent value. A present but undecodable
    /// property is reported as `MalformedEncoding`.
    pub fn from_storage(&self, raw: Option<&str>) -> AppResult<Option<T>> {
        raw.map(|r| self.codec.decode(r)).transpose()
    }
}

impl<T: Canonical> Default for PropertyConverter<T> {
    fn default() -> Self {
        Self::new()
    }
}
