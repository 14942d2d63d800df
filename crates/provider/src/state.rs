use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};

use crate::error::{ResourceError, ResourceResult};
use crate::schema::Schema;

/// Attribute store of a single resource instance.
///
/// While a partial update is open (see [`ResourceData::partial`]) writes are
/// staged and only become committed once the batch is closed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceData {
    id: Option<String>,
    attributes: Map<String, Value>,
    staged: Option<Map<String, Value>>,
}

impl ResourceData {
    /// Empty state with the schema defaults applied.
    pub fn new(schema: &Schema) -> Self {
        Self {
            id: None,
            attributes: schema.defaults(),
            staged: None,
        }
    }

    /// State handed to an importer, carrying the raw import id as its identity.
    pub fn for_import(schema: &Schema, import_id: impl Into<String>) -> Self {
        let mut state = Self::new(schema);
        state.set_id(import_id);
        state
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        let id = id.into();
        self.id = if id.is_empty() { None } else { Some(id) };
    }

    /// Marks the resource as gone.
    pub fn clear_id(&mut self) {
        self.id = None;
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.staged
            .as_ref()
            .and_then(|staged| staged.get(name))
            .or_else(|| self.attributes.get(name))
    }

    pub fn get_str(&self, name: &str) -> ResourceResult<&str> {
        self.get(name)
            .and_then(Value::as_str)
            .ok_or_else(|| ResourceError::invalid_attribute(name, "must be a string"))
    }

    pub fn get_bool(&self, name: &str) -> ResourceResult<bool> {
        self.get(name)
            .and_then(Value::as_bool)
            .ok_or_else(|| ResourceError::invalid_attribute(name, "must be a bool"))
    }

    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        let target = self.staged.as_mut().unwrap_or(&mut self.attributes);
        target.insert(name.to_string(), value.into());
    }

    /// Opens (`true`) or commits (`false`) a batch of attribute writes.
    pub fn partial(&mut self, enabled: bool) {
        if enabled {
            self.staged.get_or_insert_with(Map::new);
        } else if let Some(staged) = self.staged.take() {
            self.attributes.extend(staged);
        }
    }

    pub fn is_partial(&self) -> bool {
        self.staged.is_some()
    }

    /// Drops the writes of the open batch.
    pub fn rollback(&mut self) {
        self.staged = None;
    }

    /// Committed attributes only.
    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }

    /// Converts the current attribute view into its typed form.
    pub fn decode<T: DeserializeOwned>(&self) -> ResourceResult<T> {
        let mut view = self.attributes.clone();
        if let Some(staged) = &self.staged {
            view.extend(staged.clone());
        }
        Ok(serde_json::from_value(Value::Object(view))?)
    }

    /// Writes every field of `value` as an attribute.
    pub fn encode<T: Serialize>(&mut self, value: &T) -> ResourceResult<()> {
        match serde_json::to_value(value)? {
            Value::Object(fields) => {
                for (name, value) in fields {
                    self.set(&name, value);
                }
                Ok(())
            }
            _ => Err(ResourceError::invalid_attribute(
                "<root>",
                "must be encoded from a struct",
            )),
        }
    }
}
