//! In-memory block graph: workspaces, blocks, inputs, fields, connections and
//! variables. This is the model that events replay against and the layout
//! engine measures.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ConnectionKind {
    InputValue,
    OutputValue,
    NextStatement,
    PreviousStatement,
}

/// One attachment point on a block, optionally connected to another block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Connection {
    pub kind: ConnectionKind,
    pub target: Option<String>,
}

impl Connection {
    pub fn new(kind: ConnectionKind) -> Self {
        Self { kind, target: None }
    }

    pub fn to(kind: ConnectionKind, target: &str) -> Self {
        Self {
            kind,
            target: Some(target.to_string()),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.target.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InputAlign {
    #[default]
    Left,
    Centre,
    Right,
}

/// An editable widget on a block (label, text input, dropdown, ...).
///
/// The concrete widget behaviour lives in the host editor; the core only needs
/// the type tag and display text to size and replay it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub kind: String,
    pub text: String,
}

impl Field {
    pub fn new(name: &str, kind: &str, text: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: kind.to_string(),
            text: text.to_string(),
        }
    }

    pub fn label(name: &str, text: &str) -> Self {
        Self::new(name, "field_label", text)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputKind {
    Value,
    Statement,
    Dummy,
}

/// One input clause: leading fields plus an optional connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Input {
    pub name: String,
    pub kind: InputKind,
    pub align: InputAlign,
    pub fields: Vec<Field>,
    pub connection: Option<Connection>,
}

impl Input {
    pub fn value(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: InputKind::Value,
            align: InputAlign::Left,
            fields: Vec::new(),
            connection: Some(Connection::new(ConnectionKind::InputValue)),
        }
    }

    pub fn statement(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: InputKind::Statement,
            align: InputAlign::Left,
            fields: Vec::new(),
            connection: Some(Connection::new(ConnectionKind::NextStatement)),
        }
    }

    pub fn dummy(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: InputKind::Dummy,
            align: InputAlign::Left,
            fields: Vec::new(),
            connection: None,
        }
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_align(mut self, align: InputAlign) -> Self {
        self.align = align;
        self
    }

    pub fn connect(mut self, target: &str) -> Self {
        if let Some(conn) = self.connection.as_mut() {
            conn.target = Some(target.to_string());
        }
        self
    }

    pub fn connected_target(&self) -> Option<&str> {
        self.connection.as_ref()?.target.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: String,
    pub kind: String,
    pub x: f32,
    pub y: f32,
    pub inputs: Vec<Input>,
    pub icons: Vec<String>,
    pub previous: Option<Connection>,
    pub next: Option<Connection>,
    pub output: Option<Connection>,
    pub hat: bool,
    pub inputs_inline: bool,
    pub collapsed: bool,
}

impl Block {
    pub fn new(id: &str, kind: &str) -> Self {
        Self {
            id: id.to_string(),
            kind: kind.to_string(),
            x: 0.0,
            y: 0.0,
            inputs: Vec::new(),
            icons: Vec::new(),
            previous: None,
            next: None,
            output: None,
            hat: false,
            inputs_inline: false,
            collapsed: false,
        }
    }

    pub fn with_input(mut self, input: Input) -> Self {
        self.inputs.push(input);
        self
    }

    pub fn with_previous(mut self) -> Self {
        self.previous = Some(Connection::new(ConnectionKind::PreviousStatement));
        self
    }

    pub fn with_next(mut self) -> Self {
        self.next = Some(Connection::new(ConnectionKind::NextStatement));
        self
    }

    pub fn with_output(mut self) -> Self {
        self.output = Some(Connection::new(ConnectionKind::OutputValue));
        self
    }

    pub fn with_hat(mut self) -> Self {
        self.hat = true;
        self
    }

    pub fn with_inline_inputs(mut self) -> Self {
        self.inputs_inline = true;
        self
    }

    pub fn input(&self, name: &str) -> Option<&Input> {
        self.inputs.iter().find(|i| i.name == name)
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.inputs
            .iter()
            .flat_map(|i| i.fields.iter())
            .find(|f| f.name == name)
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut Field> {
        self.inputs
            .iter_mut()
            .flat_map(|i| i.fields.iter_mut())
            .find(|f| f.name == name)
    }

    /// Ids of blocks attached to this block's inputs or next connection.
    pub fn connected_children(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self
            .inputs
            .iter()
            .filter_map(|i| i.connected_target())
            .collect();
        if let Some(next) = self.next.as_ref()
            && let Some(target) = next.target.as_deref()
        {
            out.push(target);
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariableModel {
    pub id: String,
    pub name: String,
    pub var_type: String,
}

impl VariableModel {
    pub fn new(id: &str, name: &str, var_type: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            var_type: var_type.to_string(),
        }
    }
}

/// The block graph for one editing surface.
///
/// Capacity limits are consulted by clipboard paste: `max_blocks` caps the
/// total block count, `max_instances` caps individual block kinds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    pub id: String,
    pub blocks: BTreeMap<String, Block>,
    pub variables: BTreeMap<String, VariableModel>,
    pub max_blocks: Option<usize>,
    pub max_instances: BTreeMap<String, usize>,
}

impl Workspace {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            ..Self::default()
        }
    }

    pub fn block(&self, id: &str) -> Option<&Block> {
        self.blocks.get(id)
    }

    pub fn block_mut(&mut self, id: &str) -> Option<&mut Block> {
        self.blocks.get_mut(id)
    }

    pub fn add_block(&mut self, block: Block) -> Result<()> {
        if self.blocks.contains_key(&block.id) {
            return Err(Error::DuplicateId {
                kind: "block",
                id: block.id,
            });
        }
        self.blocks.insert(block.id.clone(), block);
        Ok(())
    }

    /// Removes a block and clears any connections that pointed at it.
    pub fn remove_block(&mut self, id: &str) -> Result<Block> {
        let removed = self.blocks.remove(id).ok_or_else(|| Error::StaleReference {
            kind: "block",
            id: id.to_string(),
        })?;
        for block in self.blocks.values_mut() {
            for conn in [block.previous.as_mut(), block.next.as_mut(), block.output.as_mut()]
                .into_iter()
                .flatten()
            {
                if conn.target.as_deref() == Some(id) {
                    conn.target = None;
                }
            }
            for input in &mut block.inputs {
                if let Some(conn) = input.connection.as_mut()
                    && conn.target.as_deref() == Some(id)
                {
                    conn.target = None;
                }
            }
        }
        Ok(removed)
    }

    pub fn move_block(&mut self, id: &str, x: f32, y: f32) -> Result<(f32, f32)> {
        let block = self.blocks.get_mut(id).ok_or_else(|| Error::StaleReference {
            kind: "block",
            id: id.to_string(),
        })?;
        let old = (block.x, block.y);
        block.x = x;
        block.y = y;
        Ok(old)
    }

    /// Sets a field's text, returning the previous text.
    pub fn set_field(&mut self, block_id: &str, field_name: &str, text: &str) -> Result<String> {
        let block = self
            .blocks
            .get_mut(block_id)
            .ok_or_else(|| Error::StaleReference {
                kind: "block",
                id: block_id.to_string(),
            })?;
        let field = block
            .field_mut(field_name)
            .ok_or_else(|| Error::StaleReference {
                kind: "field",
                id: format!("{block_id}.{field_name}"),
            })?;
        let old = std::mem::replace(&mut field.text, text.to_string());
        Ok(old)
    }

    pub fn create_variable(&mut self, variable: VariableModel) -> Result<()> {
        if self.variables.contains_key(&variable.id) {
            return Err(Error::DuplicateId {
                kind: "variable",
                id: variable.id,
            });
        }
        self.variables.insert(variable.id.clone(), variable);
        Ok(())
    }

    pub fn delete_variable(&mut self, id: &str) -> Result<VariableModel> {
        self.variables.remove(id).ok_or_else(|| Error::StaleReference {
            kind: "variable",
            id: id.to_string(),
        })
    }

    /// Renames a variable, returning its previous name.
    pub fn rename_variable(&mut self, id: &str, name: &str) -> Result<String> {
        let variable = self
            .variables
            .get_mut(id)
            .ok_or_else(|| Error::StaleReference {
                kind: "variable",
                id: id.to_string(),
            })?;
        let old = std::mem::replace(&mut variable.name, name.to_string());
        Ok(old)
    }

    /// Blocks that no other block connects to. Render passes start here.
    pub fn top_blocks(&self) -> Vec<&Block> {
        let mut connected: Vec<&str> = Vec::new();
        for block in self.blocks.values() {
            connected.extend(block.connected_children());
        }
        self.blocks
            .values()
            .filter(|b| !connected.contains(&b.id.as_str()))
            .collect()
    }

    pub fn count_of_kind(&self, kind: &str) -> usize {
        self.blocks.values().filter(|b| b.kind == kind).count()
    }

    pub fn remaining_capacity(&self) -> usize {
        match self.max_blocks {
            Some(max) => max.saturating_sub(self.blocks.len()),
            None => usize::MAX,
        }
    }

    pub fn remaining_capacity_of(&self, kind: &str) -> usize {
        match self.max_instances.get(kind) {
            Some(max) => max.saturating_sub(self.count_of_kind(kind)),
            None => usize::MAX,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remove_block_clears_dangling_connections() {
        let mut ws = Workspace::new("w");
        ws.add_block(Block::new("parent", "controls_if").with_input(Input::value("IF").connect("child")))
            .unwrap();
        ws.add_block(Block::new("child", "logic_boolean").with_output()).unwrap();

        ws.remove_block("child").unwrap();
        let parent = ws.block("parent").unwrap();
        assert_eq!(parent.input("IF").unwrap().connected_target(), None);
    }

    #[test]
    fn remove_missing_block_is_a_stale_reference() {
        let mut ws = Workspace::new("w");
        let err = ws.remove_block("ghost").unwrap_err();
        assert!(matches!(err, Error::StaleReference { kind: "block", .. }));
    }

    #[test]
    fn top_blocks_excludes_connected_children() {
        let mut ws = Workspace::new("w");
        ws.add_block(Block::new("a", "stmt").with_next()).unwrap();
        ws.block_mut("a").unwrap().next.as_mut().unwrap().target = Some("b".to_string());
        ws.add_block(Block::new("b", "stmt").with_previous()).unwrap();

        let tops: Vec<&str> = ws.top_blocks().iter().map(|b| b.id.as_str()).collect();
        assert_eq!(tops, vec!["a"]);
    }

    #[test]
    fn capacity_accounts_for_existing_blocks() {
        let mut ws = Workspace::new("w");
        ws.max_blocks = Some(3);
        ws.max_instances.insert("loop".to_string(), 1);
        ws.add_block(Block::new("a", "loop")).unwrap();

        assert_eq!(ws.remaining_capacity(), 2);
        assert_eq!(ws.remaining_capacity_of("loop"), 0);
        assert_eq!(ws.remaining_capacity_of("stmt"), usize::MAX);
    }
}
