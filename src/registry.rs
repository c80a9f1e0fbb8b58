//! Pluggable registries for field construction and whole-graph serializers.
//!
//! Both follow the same lifecycle: populated at startup, last registration
//! wins for duplicate names, unregistering an absent name is a no-op. Field
//! lookups are permissive (warn and return `None`, the block stays usable);
//! serializer lookups fail loudly because a missing serializer corrupts a
//! save/load round trip.

use once_cell::sync::Lazy;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::block::{Block, Field, VariableModel, Workspace};
use crate::error::{Error, Result};

pub type FieldFactory = fn(&Value) -> Field;

pub struct FieldRegistry {
    map: BTreeMap<String, FieldFactory>,
}

fn field_from_options(options: &Value, kind: &str) -> Field {
    let name = options.get("name").and_then(Value::as_str).unwrap_or("");
    let text = options
        .get("text")
        .or_else(|| options.get("value"))
        .map(|v| match v {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .unwrap_or_default();
    Field::new(name, kind, &text)
}

fn label_field(options: &Value) -> Field {
    field_from_options(options, "field_label")
}

fn input_field(options: &Value) -> Field {
    field_from_options(options, "field_input")
}

fn number_field(options: &Value) -> Field {
    field_from_options(options, "field_number")
}

fn dropdown_field(options: &Value) -> Field {
    field_from_options(options, "field_dropdown")
}

fn variable_field(options: &Value) -> Field {
    field_from_options(options, "field_variable")
}

impl FieldRegistry {
    pub fn new() -> Self {
        Self {
            map: BTreeMap::new(),
        }
    }

    pub fn with_builtin_fields() -> Self {
        let mut registry = Self::new();
        registry.register("field_label", label_field);
        registry.register("field_input", input_field);
        registry.register("field_number", number_field);
        registry.register("field_dropdown", dropdown_field);
        registry.register("field_variable", variable_field);
        registry
    }

    pub fn register(&mut self, tag: &str, factory: FieldFactory) {
        if self.map.insert(tag.to_string(), factory).is_some() {
            log::debug!("field type {tag:?} re-registered");
        }
    }

    pub fn unregister(&mut self, tag: &str) {
        self.map.remove(tag);
    }

    /// Builds a field from a `{type, ...}` options mapping. An unknown or
    /// missing type tag logs and returns `None`; callers must null-check.
    pub fn from_json(&self, options: &Value) -> Option<Field> {
        let Some(tag) = options.get("type").and_then(Value::as_str) else {
            log::warn!("field options are missing a \"type\" tag: {options}");
            return None;
        };
        match self.map.get(tag) {
            Some(factory) => Some(factory(options)),
            None => {
                log::warn!("no field registered for type {tag:?}");
                None
            }
        }
    }
}

impl Default for FieldRegistry {
    fn default() -> Self {
        Self::with_builtin_fields()
    }
}

static GLOBAL_FIELDS: Lazy<Mutex<FieldRegistry>> =
    Lazy::new(|| Mutex::new(FieldRegistry::with_builtin_fields()));

pub fn global_fields() -> &'static Mutex<FieldRegistry> {
    &GLOBAL_FIELDS
}

/// A named saver/loader for one slice of workspace state.
pub trait Serializer: Send {
    fn save(&self, workspace: &Workspace) -> Value;
    fn load(&self, state: &Value, workspace: &mut Workspace) -> Result<()>;
}

pub struct SerializerRegistry {
    map: BTreeMap<String, Box<dyn Serializer>>,
}

impl SerializerRegistry {
    pub fn new() -> Self {
        Self {
            map: BTreeMap::new(),
        }
    }

    pub fn with_builtin_serializers() -> Self {
        let mut registry = Self::new();
        registry.register("blocks", Box::new(BlockSerializer));
        registry.register("variables", Box::new(VariableSerializer));
        registry
    }

    pub fn register(&mut self, name: &str, serializer: Box<dyn Serializer>) {
        if self.map.insert(name.to_string(), serializer).is_some() {
            log::debug!("serializer {name:?} re-registered");
        }
    }

    pub fn unregister(&mut self, name: &str) {
        self.map.remove(name);
    }

    pub fn get(&self, name: &str) -> Result<&dyn Serializer> {
        self.map
            .get(name)
            .map(Box::as_ref)
            .ok_or_else(|| Error::SerializerNotFound(name.to_string()))
    }

    /// Saves every registered slice under its name.
    pub fn save_workspace(&self, workspace: &Workspace) -> Value {
        let mut map = serde_json::Map::new();
        for (name, serializer) in &self.map {
            map.insert(name.clone(), serializer.save(workspace));
        }
        Value::Object(map)
    }

    /// Loads every slice present in `state` through its registered
    /// serializer. A slice with no serializer is an explicit error.
    pub fn load_workspace(&self, state: &Value, workspace: &mut Workspace) -> Result<()> {
        let Some(map) = state.as_object() else {
            return Ok(());
        };
        for (name, slice) in map {
            self.get(name)?.load(slice, workspace)?;
        }
        Ok(())
    }
}

impl Default for SerializerRegistry {
    fn default() -> Self {
        Self::with_builtin_serializers()
    }
}

static GLOBAL_SERIALIZERS: Lazy<Mutex<SerializerRegistry>> =
    Lazy::new(|| Mutex::new(SerializerRegistry::with_builtin_serializers()));

pub fn global_serializers() -> &'static Mutex<SerializerRegistry> {
    &GLOBAL_SERIALIZERS
}

pub struct BlockSerializer;

impl Serializer for BlockSerializer {
    fn save(&self, workspace: &Workspace) -> Value {
        let blocks: Vec<Value> = workspace
            .blocks
            .values()
            .map(|b| serde_json::to_value(b).unwrap_or(Value::Null))
            .collect();
        Value::Array(blocks)
    }

    fn load(&self, state: &Value, workspace: &mut Workspace) -> Result<()> {
        workspace.blocks.clear();
        let Some(items) = state.as_array() else {
            return Ok(());
        };
        for item in items {
            let block: Block = serde_json::from_value(item.clone())
                .map_err(|err| Error::MalformedEvent(format!("bad block state: {err}")))?;
            workspace.add_block(block)?;
        }
        Ok(())
    }
}

pub struct VariableSerializer;

impl Serializer for VariableSerializer {
    fn save(&self, workspace: &Workspace) -> Value {
        let variables: Vec<Value> = workspace
            .variables
            .values()
            .map(|v| serde_json::to_value(v).unwrap_or(Value::Null))
            .collect();
        Value::Array(variables)
    }

    fn load(&self, state: &Value, workspace: &mut Workspace) -> Result<()> {
        workspace.variables.clear();
        let Some(items) = state.as_array() else {
            return Ok(());
        };
        for item in items {
            let variable: VariableModel = serde_json::from_value(item.clone())
                .map_err(|err| Error::MalformedEvent(format!("bad variable state: {err}")))?;
            workspace.create_variable(variable)?;
        }
        Ok(())
    }
}
