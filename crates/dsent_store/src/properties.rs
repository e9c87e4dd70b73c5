//! Marshaled record properties.

use crate::error::{StoreError, StoreResult};
use ciborium::value::Value;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;

/// The stored form of a record: named CBOR values.
///
/// Property names are unique; the map keeps them sorted so that two saves
/// of the same record compare equal.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Properties(BTreeMap<String, Value>);

impl Properties {
    /// Creates an empty property set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Marshals a serde struct into properties.
    ///
    /// # Errors
    ///
    /// Returns a codec error if the value does not serialize to a map with
    /// text keys.
    pub fn from_struct<T: Serialize + ?Sized>(value: &T) -> StoreResult<Self> {
        let value = Value::serialized(value).map_err(|e| StoreError::codec(e.to_string()))?;
        let Value::Map(entries) = value else {
            return Err(StoreError::codec("record must serialize to a map"));
        };
        let mut props = BTreeMap::new();
        for (name, value) in entries {
            let Value::Text(name) = name else {
                return Err(StoreError::codec("property names must be text"));
            };
            props.insert(name, value);
        }
        Ok(Self(props))
    }

    /// Unmarshals properties into a serde struct.
    ///
    /// # Errors
    ///
    /// Returns a codec error if the properties do not match `T`.
    pub fn to_struct<T: DeserializeOwned>(&self) -> StoreResult<T> {
        let entries = self
            .0
            .iter()
            .map(|(name, value)| (Value::Text(name.clone()), value.clone()))
            .collect();
        Value::Map(entries)
            .deserialized()
            .map_err(|e| StoreError::codec(e.to_string()))
    }

    /// Returns the value of a property.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Sets a property, returning the previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.0.insert(name.into(), value)
    }

    /// Removes a property.
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.0.remove(name)
    }

    /// Returns the number of properties.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no properties.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over properties in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }
}

/// Marshaling contract between a record type and the store.
///
/// Implementations may adjust fields on the way in or out, for example to
/// keep a derived field in sync with its stored form.
pub trait PropertyLoadSaver {
    /// Populates `self` from stored properties.
    fn load(&mut self, properties: Properties) -> StoreResult<()>;

    /// Produces the properties to store.
    fn save(&self) -> StoreResult<Properties>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Task {
        title: String,
        done: bool,
    }

    #[test]
    fn struct_properties_are_named() {
        let task = Task {
            title: "write docs".into(),
            done: false,
        };
        let props = Properties::from_struct(&task).unwrap();
        assert_eq!(props.len(), 2);
        assert_eq!(props.get("title"), Some(&Value::Text("write docs".into())));
        assert_eq!(props.to_struct::<Task>().unwrap(), task);
    }

    #[test]
    fn non_map_is_rejected() {
        let err = Properties::from_struct(&42u32).unwrap_err();
        assert!(matches!(err, StoreError::Codec { .. }));
    }

    #[test]
    fn missing_field_is_codec_error() {
        let mut props = Properties::new();
        props.insert("title", Value::Text("x".into()));
        let err = props.to_struct::<Task>().unwrap_err();
        assert!(matches!(err, StoreError::Codec { .. }));
    }
}
