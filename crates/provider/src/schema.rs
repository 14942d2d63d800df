use std::collections::BTreeMap;
use std::fmt;

use serde_json::{Map, Value};

use crate::error::{ResourceError, ResourceResult};
use crate::state::ResourceData;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeType {
    String,
    Bool,
}

impl AttributeType {
    fn accepts(&self, value: &Value) -> bool {
        match self {
            AttributeType::String => value.is_string(),
            AttributeType::Bool => value.is_boolean(),
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeType::String => f.write_str("string"),
            AttributeType::Bool => f.write_str("bool"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub ty: AttributeType,
    pub required: bool,
    pub default: Option<Value>,
    /// A change of this attribute replaces the resource instead of updating it.
    pub force_new: bool,
}

impl Attribute {
    fn new(ty: AttributeType, required: bool) -> Self {
        Self {
            ty,
            required,
            default: None,
            force_new: false,
        }
    }

    pub fn required_string() -> Self {
        Self::new(AttributeType::String, true)
    }

    pub fn optional_string() -> Self {
        Self::new(AttributeType::String, false)
    }

    pub fn optional_bool() -> Self {
        Self::new(AttributeType::Bool, false)
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }
}

/// Attribute declaration of a resource type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    attributes: BTreeMap<&'static str, Attribute>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_attribute(mut self, name: &'static str, attribute: Attribute) -> Self {
        self.attributes.insert(name, attribute);
        self
    }

    pub fn attributes(&self) -> impl Iterator<Item = (&'static str, &Attribute)> {
        self.attributes.iter().map(|(name, attribute)| (*name, attribute))
    }

    pub fn defaults(&self) -> Map<String, Value> {
        self.attributes
            .iter()
            .filter_map(|(name, attribute)| {
                attribute
                    .default
                    .clone()
                    .map(|default| (name.to_string(), default))
            })
            .collect()
    }

    /// Checks required attributes are present and every value has its declared type.
    pub fn validate(&self, state: &ResourceData) -> ResourceResult<()> {
        for (name, attribute) in self.attributes() {
            match state.get(name) {
                None | Some(Value::Null) if attribute.required => {
                    return Err(ResourceError::invalid_attribute(name, "is required"));
                }
                None | Some(Value::Null) => {}
                Some(value) if !attribute.ty.accepts(value) => {
                    return Err(ResourceError::invalid_attribute(
                        name,
                        format!("must be of type {}", attribute.ty),
                    ));
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Names of force-new attributes whose value differs between `prior` and `proposed`.
    pub fn force_new_changes(
        &self,
        prior: &ResourceData,
        proposed: &ResourceData,
    ) -> Vec<&'static str> {
        self.attributes()
            .filter(|(name, attribute)| {
                attribute.force_new && prior.get(name) != proposed.get(name)
            })
            .map(|(name, _)| name)
            .collect()
    }
}
