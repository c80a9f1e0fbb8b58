//! Replay-based undo/redo over the event log.

use crate::block::Workspace;
use crate::error::Result;
use crate::events::Event;

/// Maximum number of events kept on the undo stack.
const MAX_UNDO_HISTORY: usize = 100;

/// Undo/redo stacks over replayable events.
///
/// Events sharing a non-empty group id (a multi-block paste, a drag of a
/// whole stack) are undone and redone as one atomic unit.
#[derive(Debug, Clone, Default)]
pub struct UndoHistory {
    undo_stack: Vec<Event>,
    redo_stack: Vec<Event>,
}

impl UndoHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an event. New actions invalidate anything previously undone,
    /// so the redo stack is cleared. UI events are broadcast-only and are
    /// refused.
    pub fn push(&mut self, event: Event) {
        if event.is_ui() {
            log::warn!(
                "refusing to record UI event {:?} in undo history",
                event.type_tag()
            );
            return;
        }
        self.undo_stack.push(event);
        self.redo_stack.clear();
        // Evict whole groups from the front: dropping one event out of a
        // group would leave the remainder undoing as a partial unit.
        if self.undo_stack.len() > MAX_UNDO_HISTORY {
            let group = self.undo_stack[0].group.clone();
            if group.is_empty() {
                self.undo_stack.remove(0);
            } else {
                let run = self
                    .undo_stack
                    .iter()
                    .take_while(|e| e.group == group)
                    .count();
                self.undo_stack.drain(..run);
            }
        }
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    /// Undoes the trailing event group, returning how many events were
    /// replayed. A failure mid-group rolls the already-undone events forward
    /// again and restores the stack, so the group stays all-or-nothing.
    pub fn undo(&mut self, workspace: &mut Workspace) -> Result<usize> {
        let group = take_trailing_group(&mut self.undo_stack);
        let mut undone: Vec<Event> = Vec::new();
        for event in group.iter().rev() {
            if let Err(err) = event.run(workspace, false) {
                for done in undone.iter().rev() {
                    if let Err(rollback_err) = done.run(workspace, true) {
                        log::warn!(
                            "rollback of {:?} failed after undo error: {rollback_err}",
                            done.type_tag()
                        );
                    }
                }
                self.undo_stack.extend(group);
                return Err(err);
            }
            undone.push(event.clone());
        }
        let count = group.len();
        self.redo_stack.extend(group);
        Ok(count)
    }

    /// Redoes the trailing undone group; mirror image of [`Self::undo`].
    pub fn redo(&mut self, workspace: &mut Workspace) -> Result<usize> {
        let group = take_trailing_group(&mut self.redo_stack);
        let mut redone: Vec<Event> = Vec::new();
        for event in &group {
            if let Err(err) = event.run(workspace, true) {
                for done in redone.iter().rev() {
                    if let Err(rollback_err) = done.run(workspace, false) {
                        log::warn!(
                            "rollback of {:?} failed after redo error: {rollback_err}",
                            done.type_tag()
                        );
                    }
                }
                self.redo_stack.extend(group);
                return Err(err);
            }
            redone.push(event.clone());
        }
        let count = group.len();
        self.undo_stack.extend(group);
        Ok(count)
    }
}

/// Pops the trailing run of events sharing the last event's non-empty group
/// id; an ungrouped event comes off alone. Returned in chronological order.
fn take_trailing_group(stack: &mut Vec<Event>) -> Vec<Event> {
    let Some(last) = stack.last() else {
        return Vec::new();
    };
    let group = last.group.clone();
    if group.is_empty() {
        return vec![stack.pop().expect("stack is non-empty")];
    }
    let mut split = stack.len();
    while split > 0 && stack[split - 1].group == group {
        split -= 1;
    }
    stack.split_off(split)
}
