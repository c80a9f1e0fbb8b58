//! Typed, serializable records of graph mutations and UI notifications.
//!
//! Every structural mutation of the block graph is described by exactly one
//! event; replaying events through [`Event::run`] is the only mutation path
//! the undo/redo machinery uses, so a forward mutation and its inverse can
//! never diverge. UI events (clicks, selection, bubbles, theme swaps, drags)
//! exist for broadcast only and refuse to replay.

pub mod history;
pub mod registry;

pub use history::UndoHistory;
pub use registry::EventRegistry;

use serde_json::Value;

use crate::block::{Block, VariableModel, Workspace};
use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub workspace_id: String,
    /// Events sharing a non-empty group id undo and redo atomically.
    pub group: String,
    pub payload: EventPayload,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventPayload {
    BlockCreate {
        block_id: String,
        block: Block,
    },
    BlockDelete {
        block_id: String,
        block: Block,
    },
    BlockMove {
        block_id: String,
        old_coordinate: (f32, f32),
        new_coordinate: (f32, f32),
    },
    BlockChange {
        block_id: String,
        element: String,
        name: String,
        old_value: String,
        new_value: String,
    },
    VarCreate {
        var_id: String,
        name: String,
        var_type: String,
    },
    VarDelete {
        var_id: String,
        name: String,
        var_type: String,
    },
    VarRename {
        var_id: String,
        old_name: String,
        new_name: String,
    },
    Click {
        block_id: Option<String>,
    },
    Selected {
        old_element: Option<String>,
        new_element: Option<String>,
    },
    BubbleOpen {
        block_id: String,
        is_open: bool,
        bubble_kind: String,
    },
    ThemeChange {
        theme_name: String,
    },
    Drag {
        block_id: String,
        is_start: bool,
    },
}

impl Event {
    fn with_payload(workspace_id: &str, payload: EventPayload) -> Self {
        Self {
            workspace_id: workspace_id.to_string(),
            group: String::new(),
            payload,
        }
    }

    pub fn block_create(workspace_id: &str, block: &Block) -> Self {
        Self::with_payload(
            workspace_id,
            EventPayload::BlockCreate {
                block_id: block.id.clone(),
                block: block.clone(),
            },
        )
    }

    /// Snapshots the whole block so the inverse replay can restore it.
    pub fn block_delete(workspace_id: &str, block: &Block) -> Self {
        Self::with_payload(
            workspace_id,
            EventPayload::BlockDelete {
                block_id: block.id.clone(),
                block: block.clone(),
            },
        )
    }

    pub fn block_move(
        workspace_id: &str,
        block_id: &str,
        old_coordinate: (f32, f32),
        new_coordinate: (f32, f32),
    ) -> Self {
        Self::with_payload(
            workspace_id,
            EventPayload::BlockMove {
                block_id: block_id.to_string(),
                old_coordinate,
                new_coordinate,
            },
        )
    }

    pub fn field_change(
        workspace_id: &str,
        block_id: &str,
        field_name: &str,
        old_value: &str,
        new_value: &str,
    ) -> Self {
        Self::with_payload(
            workspace_id,
            EventPayload::BlockChange {
                block_id: block_id.to_string(),
                element: "field".to_string(),
                name: field_name.to_string(),
                old_value: old_value.to_string(),
                new_value: new_value.to_string(),
            },
        )
    }

    pub fn var_create(workspace_id: &str, variable: &VariableModel) -> Self {
        Self::with_payload(
            workspace_id,
            EventPayload::VarCreate {
                var_id: variable.id.clone(),
                name: variable.name.clone(),
                var_type: variable.var_type.clone(),
            },
        )
    }

    pub fn var_delete(workspace_id: &str, variable: &VariableModel) -> Self {
        Self::with_payload(
            workspace_id,
            EventPayload::VarDelete {
                var_id: variable.id.clone(),
                name: variable.name.clone(),
                var_type: variable.var_type.clone(),
            },
        )
    }

    pub fn var_rename(workspace_id: &str, variable: &VariableModel, new_name: &str) -> Self {
        Self::with_payload(
            workspace_id,
            EventPayload::VarRename {
                var_id: variable.id.clone(),
                old_name: variable.name.clone(),
                new_name: new_name.to_string(),
            },
        )
    }

    pub fn click(workspace_id: &str, block_id: Option<&str>) -> Self {
        Self::with_payload(
            workspace_id,
            EventPayload::Click {
                block_id: block_id.map(str::to_string),
            },
        )
    }

    pub fn selected(workspace_id: &str, old_element: Option<&str>, new_element: Option<&str>) -> Self {
        Self::with_payload(
            workspace_id,
            EventPayload::Selected {
                old_element: old_element.map(str::to_string),
                new_element: new_element.map(str::to_string),
            },
        )
    }

    pub fn bubble_open(workspace_id: &str, block_id: &str, is_open: bool, bubble_kind: &str) -> Self {
        Self::with_payload(
            workspace_id,
            EventPayload::BubbleOpen {
                block_id: block_id.to_string(),
                is_open,
                bubble_kind: bubble_kind.to_string(),
            },
        )
    }

    pub fn theme_change(workspace_id: &str, theme_name: &str) -> Self {
        Self::with_payload(
            workspace_id,
            EventPayload::ThemeChange {
                theme_name: theme_name.to_string(),
            },
        )
    }

    pub fn drag(workspace_id: &str, block_id: &str, is_start: bool) -> Self {
        Self::with_payload(
            workspace_id,
            EventPayload::Drag {
                block_id: block_id.to_string(),
                is_start,
            },
        )
    }

    pub fn with_group(mut self, group: &str) -> Self {
        self.group = group.to_string();
        self
    }

    /// The unique string tag this event type is registered under.
    pub fn type_tag(&self) -> &'static str {
        match &self.payload {
            EventPayload::BlockCreate { .. } => "create",
            EventPayload::BlockDelete { .. } => "delete",
            EventPayload::BlockMove { .. } => "move",
            EventPayload::BlockChange { .. } => "change",
            EventPayload::VarCreate { .. } => "var_create",
            EventPayload::VarDelete { .. } => "var_delete",
            EventPayload::VarRename { .. } => "var_rename",
            EventPayload::Click { .. } => "click",
            EventPayload::Selected { .. } => "selected",
            EventPayload::BubbleOpen { .. } => "bubble_open",
            EventPayload::ThemeChange { .. } => "theme_change",
            EventPayload::Drag { .. } => "drag",
        }
    }

    /// UI notifications carry no graph mutation and never enter the undo
    /// stack.
    pub fn is_ui(&self) -> bool {
        matches!(
            self.payload,
            EventPayload::Click { .. }
                | EventPayload::Selected { .. }
                | EventPayload::BubbleOpen { .. }
                | EventPayload::ThemeChange { .. }
                | EventPayload::Drag { .. }
        )
    }

    /// Serializes to the wire mapping: discriminant fields first, variant
    /// payload layered on top.
    pub fn to_json(&self) -> Value {
        let mut map = serde_json::Map::new();
        map.insert("type".to_string(), Value::String(self.type_tag().to_string()));
        map.insert(
            "workspaceId".to_string(),
            Value::String(self.workspace_id.clone()),
        );
        if !self.group.is_empty() {
            map.insert("group".to_string(), Value::String(self.group.clone()));
        }
        match &self.payload {
            EventPayload::BlockCreate { block_id, block }
            | EventPayload::BlockDelete { block_id, block } => {
                map.insert("blockId".to_string(), Value::String(block_id.clone()));
                map.insert(
                    "block".to_string(),
                    serde_json::to_value(block).unwrap_or(Value::Null),
                );
            }
            EventPayload::BlockMove {
                block_id,
                old_coordinate,
                new_coordinate,
            } => {
                map.insert("blockId".to_string(), Value::String(block_id.clone()));
                map.insert("oldCoordinate".to_string(), coordinate_json(*old_coordinate));
                map.insert("newCoordinate".to_string(), coordinate_json(*new_coordinate));
            }
            EventPayload::BlockChange {
                block_id,
                element,
                name,
                old_value,
                new_value,
            } => {
                map.insert("blockId".to_string(), Value::String(block_id.clone()));
                map.insert("element".to_string(), Value::String(element.clone()));
                map.insert("name".to_string(), Value::String(name.clone()));
                map.insert("oldValue".to_string(), Value::String(old_value.clone()));
                map.insert("newValue".to_string(), Value::String(new_value.clone()));
            }
            EventPayload::VarCreate {
                var_id,
                name,
                var_type,
            }
            | EventPayload::VarDelete {
                var_id,
                name,
                var_type,
            } => {
                map.insert("varId".to_string(), Value::String(var_id.clone()));
                map.insert("varName".to_string(), Value::String(name.clone()));
                map.insert("varType".to_string(), Value::String(var_type.clone()));
            }
            EventPayload::VarRename {
                var_id,
                old_name,
                new_name,
            } => {
                map.insert("varId".to_string(), Value::String(var_id.clone()));
                map.insert("oldName".to_string(), Value::String(old_name.clone()));
                map.insert("newName".to_string(), Value::String(new_name.clone()));
            }
            EventPayload::Click { block_id } => {
                if let Some(id) = block_id {
                    map.insert("blockId".to_string(), Value::String(id.clone()));
                }
            }
            EventPayload::Selected {
                old_element,
                new_element,
            } => {
                if let Some(id) = old_element {
                    map.insert("oldElementId".to_string(), Value::String(id.clone()));
                }
                if let Some(id) = new_element {
                    map.insert("newElementId".to_string(), Value::String(id.clone()));
                }
            }
            EventPayload::BubbleOpen {
                block_id,
                is_open,
                bubble_kind,
            } => {
                map.insert("blockId".to_string(), Value::String(block_id.clone()));
                map.insert("isOpen".to_string(), Value::Bool(*is_open));
                map.insert("bubbleType".to_string(), Value::String(bubble_kind.clone()));
            }
            EventPayload::ThemeChange { theme_name } => {
                map.insert("themeName".to_string(), Value::String(theme_name.clone()));
            }
            EventPayload::Drag { block_id, is_start } => {
                map.insert("blockId".to_string(), Value::String(block_id.clone()));
                map.insert("isStart".to_string(), Value::Bool(*is_start));
            }
        }
        Value::Object(map)
    }

    /// Reconstructs an event from its wire mapping. Missing discriminants are
    /// malformed; missing auxiliary strings degrade to empty.
    pub fn from_json(value: &Value) -> Result<Self> {
        let tag = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::MalformedEvent("missing \"type\" tag".to_string()))?;
        let workspace_id = str_field(value, "workspaceId");
        let group = str_field(value, "group");
        let payload = match tag {
            "create" => EventPayload::BlockCreate {
                block_id: str_field(value, "blockId"),
                block: block_field(value)?,
            },
            "delete" => EventPayload::BlockDelete {
                block_id: str_field(value, "blockId"),
                block: block_field(value)?,
            },
            "move" => EventPayload::BlockMove {
                block_id: str_field(value, "blockId"),
                old_coordinate: coordinate_field(value, "oldCoordinate"),
                new_coordinate: coordinate_field(value, "newCoordinate"),
            },
            "change" => EventPayload::BlockChange {
                block_id: str_field(value, "blockId"),
                element: str_field(value, "element"),
                name: str_field(value, "name"),
                old_value: str_field(value, "oldValue"),
                new_value: str_field(value, "newValue"),
            },
            "var_create" => EventPayload::VarCreate {
                var_id: str_field(value, "varId"),
                name: str_field(value, "varName"),
                var_type: str_field(value, "varType"),
            },
            "var_delete" => EventPayload::VarDelete {
                var_id: str_field(value, "varId"),
                name: str_field(value, "varName"),
                var_type: str_field(value, "varType"),
            },
            "var_rename" => EventPayload::VarRename {
                var_id: str_field(value, "varId"),
                old_name: str_field(value, "oldName"),
                new_name: str_field(value, "newName"),
            },
            "click" => EventPayload::Click {
                block_id: opt_str_field(value, "blockId"),
            },
            "selected" => EventPayload::Selected {
                old_element: opt_str_field(value, "oldElementId"),
                new_element: opt_str_field(value, "newElementId"),
            },
            "bubble_open" => EventPayload::BubbleOpen {
                block_id: str_field(value, "blockId"),
                is_open: bool_field(value, "isOpen"),
                bubble_kind: str_field(value, "bubbleType"),
            },
            "theme_change" => EventPayload::ThemeChange {
                theme_name: str_field(value, "themeName"),
            },
            "drag" => EventPayload::Drag {
                block_id: str_field(value, "blockId"),
                is_start: bool_field(value, "isStart"),
            },
            other => return Err(Error::UnknownEventType(other.to_string())),
        };
        Ok(Self {
            workspace_id,
            group,
            payload,
        })
    }

    /// Replays this event against a workspace: `forward` applies the
    /// recorded mutation, `!forward` applies its inverse.
    ///
    /// Replaying against an entity that no longer exists is a
    /// [`Error::StaleReference`]; silently no-op-ing an undo step would
    /// corrupt the user's view of history.
    pub fn run(&self, workspace: &mut Workspace, forward: bool) -> Result<()> {
        match &self.payload {
            EventPayload::BlockCreate { block, .. } => {
                apply_block_existence(workspace, block, forward)
            }
            EventPayload::BlockDelete { block, .. } => {
                apply_block_existence(workspace, block, !forward)
            }
            EventPayload::BlockMove {
                block_id,
                old_coordinate,
                new_coordinate,
            } => {
                let (x, y) = if forward {
                    *new_coordinate
                } else {
                    *old_coordinate
                };
                workspace.move_block(block_id, x, y).map(|_| ())
            }
            EventPayload::BlockChange {
                block_id,
                element,
                name,
                old_value,
                new_value,
            } => {
                let value = if forward { new_value } else { old_value };
                match element.as_str() {
                    "field" => workspace.set_field(block_id, name, value).map(|_| ()),
                    "inline" => {
                        let block = workspace.block_mut(block_id).ok_or_else(|| {
                            Error::StaleReference {
                                kind: "block",
                                id: block_id.clone(),
                            }
                        })?;
                        block.inputs_inline = value == "true";
                        Ok(())
                    }
                    "collapsed" => {
                        let block = workspace.block_mut(block_id).ok_or_else(|| {
                            Error::StaleReference {
                                kind: "block",
                                id: block_id.clone(),
                            }
                        })?;
                        block.collapsed = value == "true";
                        Ok(())
                    }
                    other => Err(Error::MalformedEvent(format!(
                        "unknown change element {other:?}"
                    ))),
                }
            }
            EventPayload::VarCreate {
                var_id,
                name,
                var_type,
            } => apply_variable_existence(workspace, var_id, name, var_type, forward),
            EventPayload::VarDelete {
                var_id,
                name,
                var_type,
            } => apply_variable_existence(workspace, var_id, name, var_type, !forward),
            EventPayload::VarRename {
                var_id,
                old_name,
                new_name,
            } => {
                let name = if forward { new_name } else { old_name };
                workspace.rename_variable(var_id, name).map(|_| ())
            }
            EventPayload::Click { .. }
            | EventPayload::Selected { .. }
            | EventPayload::BubbleOpen { .. }
            | EventPayload::ThemeChange { .. }
            | EventPayload::Drag { .. } => Err(Error::NotReplayable(self.type_tag())),
        }
    }
}

/// Create and delete are inverses of each other; both funnel through this so
/// the two replay directions cannot drift apart.
fn apply_block_existence(workspace: &mut Workspace, block: &Block, create: bool) -> Result<()> {
    if create {
        workspace.add_block(block.clone())
    } else {
        workspace.remove_block(&block.id).map(|_| ())
    }
}

fn apply_variable_existence(
    workspace: &mut Workspace,
    var_id: &str,
    name: &str,
    var_type: &str,
    create: bool,
) -> Result<()> {
    if create {
        workspace.create_variable(VariableModel::new(var_id, name, var_type))
    } else {
        workspace.delete_variable(var_id).map(|_| ())
    }
}

fn coordinate_json((x, y): (f32, f32)) -> Value {
    serde_json::json!({ "x": x, "y": y })
}

fn str_field(value: &Value, key: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn opt_str_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

fn bool_field(value: &Value, key: &str) -> bool {
    value.get(key).and_then(Value::as_bool).unwrap_or(false)
}

fn coordinate_field(value: &Value, key: &str) -> (f32, f32) {
    let coord = value.get(key);
    let axis = |name: &str| {
        coord
            .and_then(|c| c.get(name))
            .and_then(Value::as_f64)
            .unwrap_or(0.0) as f32
    };
    (axis("x"), axis("y"))
}

fn block_field(value: &Value) -> Result<Block> {
    let raw = value
        .get("block")
        .ok_or_else(|| Error::MalformedEvent("missing \"block\" payload".to_string()))?;
    serde_json::from_value(raw.clone())
        .map_err(|err| Error::MalformedEvent(format!("bad block payload: {err}")))
}
