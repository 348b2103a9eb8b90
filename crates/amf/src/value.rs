use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use bytes::Bytes;

/// Ordered string keyed entries of an ECMA array or an object.
pub type AmfMap = Vec<(Arc<str>, AmfValue)>;

/// Milliseconds since the unix epoch, as carried by both AMF date types.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct AmfDate {
    /// Milliseconds since 1970-01-01T00:00:00Z. May be fractional or negative.
    pub millis: f64,
}

impl AmfDate {
    /// Create a date from epoch milliseconds.
    pub const fn from_millis(millis: f64) -> Self {
        Self { millis }
    }

    /// Convert to a [`SystemTime`]. `None` when the value is not finite or
    /// not representable on this platform.
    pub fn to_system_time(self) -> Option<SystemTime> {
        if !self.millis.is_finite() {
            return None;
        }

        let offset = Duration::try_from_secs_f64(self.millis.abs() / 1000.0).ok()?;
        if self.millis >= 0.0 {
            UNIX_EPOCH.checked_add(offset)
        } else {
            UNIX_EPOCH.checked_sub(offset)
        }
    }
}

impl From<SystemTime> for AmfDate {
    fn from(time: SystemTime) -> Self {
        let millis = match time.duration_since(UNIX_EPOCH) {
            Ok(after) => after.as_secs_f64() * 1000.0,
            Err(before) => -before.duration().as_secs_f64() * 1000.0,
        };
        Self { millis }
    }
}

/// An object, typed when `class_name` is set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AmfObject {
    /// Class alias. `None` for anonymous objects.
    pub class_name: Option<Arc<str>>,
    /// Properties in encounter order.
    pub properties: AmfMap,
}

impl AmfObject {
    /// Look up a property by name.
    pub fn get(&self, key: &str) -> Option<&AmfValue> {
        self.properties
            .iter()
            .find(|(name, _)| &**name == key)
            .map(|(_, value)| value)
    }
}

/// An AMF3 dictionary. Keys can be any value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AmfDictionary {
    /// Whether the keys are weakly referenced on the producing side.
    pub weak_keys: bool,
    /// Entries in encounter order.
    pub entries: Vec<(AmfValue, AmfValue)>,
}

/// A value of either AMF type system.
///
/// Complex values sit behind an [`Arc`]: cloning a value keeps its identity,
/// and repeated identities are written once followed by back-references.
/// Text is shared the same way, so a string that is referenced many times on
/// the wire is held once in memory.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum AmfValue {
    /// `undefined`
    #[default]
    Undefined,
    /// `null`
    Null,
    /// A boolean.
    Boolean(bool),
    /// A double precision number.
    ///
    /// Always written as an AMF3 double, even when the value is integral, so
    /// that it decodes back to `Number`. Use [`AmfValue::Integer`] for the
    /// compact variable-length form.
    Number(f64),
    /// A signed integer. Written as an AMF3 integer when it fits 29 bits,
    /// otherwise as a number.
    Integer(i32),
    /// A UTF-8 string.
    String(Arc<str>),
    /// A date.
    Date(AmfDate),
    /// A dense array.
    Array(Arc<Vec<AmfValue>>),
    /// An associative array.
    EcmaArray(Arc<AmfMap>),
    /// An anonymous or typed object.
    Object(Arc<AmfObject>),
    /// An XML document, kept as its source text.
    XmlDocument(Arc<str>),
    /// Raw bytes.
    ByteArray(Bytes),
    /// A dictionary with arbitrary keys.
    Dictionary(Arc<AmfDictionary>),
}

impl AmfValue {
    /// Anonymous object from its properties.
    pub fn object<K: Into<Arc<str>>>(properties: impl IntoIterator<Item = (K, AmfValue)>) -> Self {
        Self::Object(Arc::new(AmfObject {
            class_name: None,
            properties: properties.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }))
    }

    /// Typed object from its class alias and properties.
    pub fn typed_object<K: Into<Arc<str>>>(
        class_name: impl Into<Arc<str>>,
        properties: impl IntoIterator<Item = (K, AmfValue)>,
    ) -> Self {
        Self::Object(Arc::new(AmfObject {
            class_name: Some(class_name.into()),
            properties: properties.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }))
    }

    /// Dense array.
    pub fn array(values: impl IntoIterator<Item = AmfValue>) -> Self {
        Self::Array(Arc::new(values.into_iter().collect()))
    }

    /// Associative array.
    pub fn ecma_array<K: Into<Arc<str>>>(entries: impl IntoIterator<Item = (K, AmfValue)>) -> Self {
        Self::EcmaArray(Arc::new(
            entries.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        ))
    }

    /// Build an array from index/value pairs.
    ///
    /// When the indices are exactly `0..n` in order the result is a dense
    /// [`AmfValue::Array`]. Anything else, including holes, becomes an
    /// [`AmfValue::EcmaArray`] keyed by the decimal index.
    pub fn from_indexed(entries: impl IntoIterator<Item = (u32, AmfValue)>) -> Self {
        let entries: Vec<(u32, AmfValue)> = entries.into_iter().collect();
        let dense = entries
            .iter()
            .enumerate()
            .all(|(position, (index, _))| *index as usize == position);

        if dense {
            Self::array(entries.into_iter().map(|(_, value)| value))
        } else {
            Self::ecma_array(
                entries
                    .into_iter()
                    .map(|(index, value)| (index.to_string(), value)),
            )
        }
    }

    /// A short lower-case name of the variant, used in error messages.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Boolean(_) => "boolean",
            Self::Number(_) => "number",
            Self::Integer(_) => "integer",
            Self::String(_) => "string",
            Self::Date(_) => "date",
            Self::Array(_) => "array",
            Self::EcmaArray(_) => "ecma-array",
            Self::Object(_) => "object",
            Self::XmlDocument(_) => "xml-document",
            Self::ByteArray(_) => "byte-array",
            Self::Dictionary(_) => "dictionary",
        }
    }

    /// The numeric value of `Number` and `Integer`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Integer(i) => Some(f64::from(*i)),
            _ => None,
        }
    }

    /// The text of `String` and `XmlDocument`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) | Self::XmlDocument(s) => Some(&**s),
            _ => None,
        }
    }

    /// Property lookup on objects and ECMA arrays.
    pub fn get(&self, key: &str) -> Option<&AmfValue> {
        match self {
            Self::Object(object) => object.get(key),
            Self::EcmaArray(entries) => entries
                .iter()
                .find(|(name, _)| &**name == key)
                .map(|(_, value)| value),
            _ => None,
        }
    }
}

impl From<bool> for AmfValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<f64> for AmfValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for AmfValue {
    fn from(value: i32) -> Self {
        Self::Integer(value)
    }
}

impl From<&str> for AmfValue {
    fn from(value: &str) -> Self {
        Self::String(value.into())
    }
}

impl From<String> for AmfValue {
    fn from(value: String) -> Self {
        Self::String(value.into())
    }
}

impl From<Arc<str>> for AmfValue {
    fn from(value: Arc<str>) -> Self {
        Self::String(value)
    }
}

impl From<AmfDate> for AmfValue {
    fn from(value: AmfDate) -> Self {
        Self::Date(value)
    }
}

impl From<Bytes> for AmfValue {
    fn from(value: Bytes) -> Self {
        Self::ByteArray(value)
    }
}

impl From<Vec<AmfValue>> for AmfValue {
    fn from(values: Vec<AmfValue>) -> Self {
        Self::Array(Arc::new(values))
    }
}

impl From<AmfObject> for AmfValue {
    fn from(object: AmfObject) -> Self {
        Self::Object(Arc::new(object))
    }
}

impl From<AmfDictionary> for AmfValue {
    fn from(dictionary: AmfDictionary) -> Self {
        Self::Dictionary(Arc::new(dictionary))
    }
}

impl<T: Into<AmfValue>> From<Option<T>> for AmfValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}
