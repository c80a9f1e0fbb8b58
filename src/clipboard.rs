//! Copy/paste/duplicate for block subtrees.
//!
//! A copy captures the block and everything connected below it (input children
//! and next-statement chains). Pasting mints fresh ids so the same capture can
//! be pasted repeatedly, and checks the target workspace's capacity limits
//! before touching the graph.

use once_cell::sync::Lazy;
use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::block::{Block, Workspace};
use crate::error::{Error, Result};

/// Pasted roots land slightly below-right of the copied block so the copy is
/// visible next to the original.
const PASTE_OFFSET: f32 = 16.0;

/// A captured subtree, root first.
#[derive(Debug, Clone, PartialEq)]
pub struct CopyData {
    pub source_workspace: String,
    pub blocks: Vec<Block>,
    pub type_counts: BTreeMap<String, usize>,
}

impl CopyData {
    /// Captures `block_id` and its connected descendants from `workspace`.
    pub fn capture(workspace: &Workspace, block_id: &str) -> Result<Self> {
        let mut blocks: Vec<Block> = Vec::new();
        let mut pending = vec![block_id.to_string()];
        let mut seen: Vec<String> = Vec::new();
        while let Some(id) = pending.pop() {
            if seen.contains(&id) {
                continue;
            }
            let block = workspace.block(&id).ok_or_else(|| Error::StaleReference {
                kind: "block",
                id: id.clone(),
            })?;
            seen.push(id);
            pending.extend(block.connected_children().iter().map(|c| c.to_string()));
            blocks.push(block.clone());
        }
        let mut type_counts: BTreeMap<String, usize> = BTreeMap::new();
        for block in &blocks {
            *type_counts.entry(block.kind.clone()).or_insert(0) += 1;
        }
        Ok(Self {
            source_workspace: workspace.id.clone(),
            blocks,
            type_counts,
        })
    }

    fn fits(&self, workspace: &Workspace) -> bool {
        if self.blocks.len() > workspace.remaining_capacity() {
            return false;
        }
        self.type_counts
            .iter()
            .all(|(kind, count)| *count <= workspace.remaining_capacity_of(kind))
    }
}

/// Single-slot clipboard; a new copy replaces the previous one.
#[derive(Debug, Clone, Default)]
pub struct Clipboard {
    slot: Option<CopyData>,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_contents(&self) -> bool {
        self.slot.is_some()
    }

    pub fn clear(&mut self) {
        self.slot = None;
    }

    pub fn copy(&mut self, workspace: &Workspace, block_id: &str) -> Result<()> {
        self.slot = Some(CopyData::capture(workspace, block_id)?);
        Ok(())
    }

    /// Pastes the held subtree into `workspace`. Returns `false` without
    /// mutating anything when the slot is empty or the paste would exceed the
    /// workspace's capacity limits.
    pub fn paste(&self, workspace: &mut Workspace) -> bool {
        match self.slot.as_ref() {
            Some(data) => paste_data(workspace, data),
            None => false,
        }
    }

    /// Copy-then-paste in one step, without disturbing the clipboard slot.
    pub fn duplicate(&self, workspace: &mut Workspace, block_id: &str) -> Result<bool> {
        let data = CopyData::capture(workspace, block_id)?;
        Ok(paste_data(workspace, &data))
    }
}

/// Inserts a capture with freshly minted ids. Connection targets inside the
/// capture are remapped to the new ids; targets pointing outside it (the
/// original's parent, say) are dropped so the paste comes in detached.
fn paste_data(workspace: &mut Workspace, data: &CopyData) -> bool {
    if data.blocks.is_empty() || !data.fits(workspace) {
        return false;
    }

    let id_map: BTreeMap<&str, String> = data
        .blocks
        .iter()
        .map(|b| (b.id.as_str(), uuid::Uuid::new_v4().to_string()))
        .collect();

    for (index, original) in data.blocks.iter().enumerate() {
        let mut block = original.clone();
        block.id = id_map[original.id.as_str()].clone();
        if index == 0 {
            block.x += PASTE_OFFSET;
            block.y += PASTE_OFFSET;
        }
        for conn in [
            block.previous.as_mut(),
            block.next.as_mut(),
            block.output.as_mut(),
        ]
        .into_iter()
        .flatten()
        {
            conn.target = conn
                .target
                .as_deref()
                .and_then(|t| id_map.get(t).cloned());
        }
        for input in &mut block.inputs {
            if let Some(conn) = input.connection.as_mut() {
                conn.target = conn
                    .target
                    .as_deref()
                    .and_then(|t| id_map.get(t).cloned());
            }
        }
        // Ids are fresh v4 uuids, so insertion cannot collide.
        let _ = workspace.add_block(block);
    }
    true
}

static GLOBAL_CLIPBOARD: Lazy<Mutex<Clipboard>> = Lazy::new(|| Mutex::new(Clipboard::new()));

pub fn global_clipboard() -> &'static Mutex<Clipboard> {
    &GLOBAL_CLIPBOARD
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{Input, Workspace};

    fn stack_workspace() -> Workspace {
        let mut ws = Workspace::new("w");
        ws.add_block(
            Block::new("root", "controls_repeat")
                .with_input(Input::value("TIMES").connect("count"))
                .with_next(),
        )
        .unwrap();
        ws.block_mut("root").unwrap().next.as_mut().unwrap().target = Some("after".to_string());
        ws.add_block(Block::new("count", "math_number").with_output())
            .unwrap();
        ws.add_block(Block::new("after", "text_print").with_previous())
            .unwrap();
        ws
    }

    #[test]
    fn copy_captures_the_whole_subtree_root_first() {
        let ws = stack_workspace();
        let data = CopyData::capture(&ws, "root").unwrap();
        assert_eq!(data.blocks[0].id, "root");
        assert_eq!(data.blocks.len(), 3);
        assert_eq!(data.type_counts["math_number"], 1);
        assert_eq!(data.source_workspace, "w");
    }

    #[test]
    fn paste_remints_ids_and_remaps_internal_connections() {
        let mut ws = stack_workspace();
        let mut clipboard = Clipboard::new();
        clipboard.copy(&ws, "root").unwrap();
        assert!(clipboard.paste(&mut ws));
        assert_eq!(ws.blocks.len(), 6);

        let new_root = ws
            .blocks
            .values()
            .find(|b| b.kind == "controls_repeat" && b.id != "root")
            .unwrap();
        let child_id = new_root.input("TIMES").unwrap().connected_target().unwrap();
        assert_ne!(child_id, "count");
        assert!(ws.blocks.contains_key(child_id));
        assert_eq!(new_root.x, PASTE_OFFSET);
    }

    #[test]
    fn external_connections_are_dropped_on_paste() {
        let mut ws = stack_workspace();
        let mut clipboard = Clipboard::new();
        // Copy only the tail statement; its previous pointer leads outside.
        ws.block_mut("after").unwrap().previous.as_mut().unwrap().target =
            Some("root".to_string());
        clipboard.copy(&ws, "after").unwrap();
        assert!(clipboard.paste(&mut ws));

        let pasted = ws
            .blocks
            .values()
            .find(|b| b.kind == "text_print" && b.id != "after")
            .unwrap();
        assert_eq!(pasted.previous.as_ref().unwrap().target, None);
    }

    #[test]
    fn paste_with_empty_slot_returns_false_and_mutates_nothing() {
        let mut ws = stack_workspace();
        let before = ws.clone();
        let clipboard = Clipboard::new();
        assert!(!clipboard.paste(&mut ws));
        assert_eq!(ws, before);
    }

    #[test]
    fn paste_respects_total_capacity() {
        let mut ws = stack_workspace();
        ws.max_blocks = Some(4);
        let mut clipboard = Clipboard::new();
        clipboard.copy(&ws, "root").unwrap();
        let before = ws.clone();
        assert!(!clipboard.paste(&mut ws));
        assert_eq!(ws, before);
    }

    #[test]
    fn paste_respects_per_kind_capacity() {
        let mut ws = stack_workspace();
        ws.max_instances.insert("math_number".to_string(), 1);
        let mut clipboard = Clipboard::new();
        clipboard.copy(&ws, "root").unwrap();
        let before = ws.clone();
        assert!(!clipboard.paste(&mut ws));
        assert_eq!(ws, before);
    }

    #[test]
    fn duplicate_leaves_the_clipboard_slot_alone() {
        let mut ws = stack_workspace();
        let mut clipboard = Clipboard::new();
        clipboard.copy(&ws, "count").unwrap();
        let held = clipboard.slot.clone();
        assert!(clipboard.duplicate(&mut ws, "root").unwrap());
        assert_eq!(clipboard.slot, held);
        assert_eq!(ws.blocks.len(), 6);
    }

    #[test]
    fn copying_a_missing_block_is_a_stale_reference() {
        let ws = stack_workspace();
        let mut clipboard = Clipboard::new();
        assert!(clipboard.copy(&ws, "ghost").is_err());
        assert!(!clipboard.has_contents());
    }
}
