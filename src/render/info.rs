//! The layout solver: walks a block's inputs, assembles rows, measures them
//! and positions every element, producing an immutable snapshot for the
//! drawer.
//!
//! Layout never fails. Malformed model data (a connection pointing at a block
//! that no longer exists, a shape the variant's table does not know) degrades
//! to default sizes, so a program's correctness never depends on rendering
//! completing perfectly.

use crate::block::{Block, InputAlign, InputKind, Workspace};
use crate::render::Renderer;
use crate::render::constants::ConstantProvider;
use crate::render::measurables::{CornerSide, Measurable, MeasurableKind};
use crate::render::rows::{Row, RowKind};

/// Nesting deeper than this (or a connection cycle) is measured as if the
/// child were unconnected.
const MAX_NEST_DEPTH: usize = 128;

/// The complete, positioned layout for one block at one point in time.
///
/// Superseded snapshots are discarded when the block changes, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderInfo {
    pub block_id: String,
    pub rows: Vec<Row>,
    pub output: Option<Measurable>,
    /// Width of the block outline.
    pub width: f32,
    pub height: f32,
    /// Width including child blocks hanging off statement and external
    /// inputs; the space the block claims on the canvas.
    pub bounds_width: f32,
}

impl RenderInfo {
    pub fn build(workspace: &Workspace, block: &Block, renderer: &Renderer) -> Self {
        Self::build_at_depth(workspace, block, renderer, 0)
    }

    fn build_at_depth(
        workspace: &Workspace,
        block: &Block,
        renderer: &Renderer,
        depth: usize,
    ) -> Self {
        let constants = &renderer.constants;
        let mut rows = collect_rows(workspace, block, renderer, depth);

        // Measure pass: every row self-measures, independent of siblings.
        for row in &mut rows {
            row.measure();
        }

        // Width pass: the widest content row sets the outline width, then
        // narrower rows absorb the slack per their alignment policy.
        let target = rows
            .iter()
            .filter(|r| r.kind != RowKind::Spacer)
            .map(|r| r.width)
            .fold(constants.min_block_width, f32::max);
        for row in &mut rows {
            match row.kind {
                RowKind::Input => pad_row_to(row, target, renderer),
                RowKind::Spacer => {
                    row.width = target;
                    row.width_with_connected_blocks = target;
                }
                RowKind::Top | RowKind::Bottom => {}
            }
        }

        // Position pass: rows stack top-down, elements run left to right.
        let mut y = 0.0;
        for row in &mut rows {
            row.y = y;
            let mut x = 0.0;
            for element in &mut row.elements {
                element.x = x;
                element.center_y = row.y + row.height / 2.0;
                x += element.width;
            }
            y += row.height;
        }

        let height = y.max(constants.min_block_height);
        let bounds_width = rows
            .iter()
            .map(|r| r.width_with_connected_blocks)
            .fold(target, f32::max);

        let output = block.output.as_ref().map(|conn| {
            let mut m = Measurable::output_connection(constants, conn);
            m.center_y = constants.tab_offset_from_top + m.connection_height / 2.0;
            m
        });

        Self {
            block_id: block.id.clone(),
            rows,
            output,
            width: target,
            height,
            bounds_width,
        }
    }

    /// Bounding size of the block, children included.
    pub fn size(&self) -> (f32, f32) {
        (self.bounds_width, self.height)
    }

    pub fn content_rows(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter().filter(|r| r.kind != RowKind::Spacer)
    }
}

fn collect_rows(
    workspace: &Workspace,
    block: &Block,
    renderer: &Renderer,
    depth: usize,
) -> Vec<Row> {
    let constants = &renderer.constants;
    let policy = &renderer.policy;
    let square = policy.square_corners_with_connections
        && (block.previous.is_some() || block.output.is_some());
    let corner = |side: CornerSide| {
        if square {
            Measurable::square_corner(constants, side)
        } else {
            Measurable::round_corner(constants, side)
        }
    };

    let mut content: Vec<Row> = Vec::new();

    let mut top = Row::new(RowKind::Top);
    top.min_height = constants.medium_padding;
    top.push(corner(CornerSide::Left));
    if block.hat {
        top.push(Measurable::hat(constants));
    }
    if let Some(prev) = block.previous.as_ref() {
        let lead = (constants.notch_offset_left - constants.corner_radius).max(0.0);
        if lead > 0.0 {
            top.push(Measurable::in_row_spacer(constants, lead));
        }
        top.push(Measurable::previous_connection(constants, prev));
    }
    top.push(corner(CornerSide::Right));
    content.push(top);

    if block.collapsed {
        let mut row = Row::new(RowKind::Input);
        row.min_height = constants.min_block_height;
        row.push(Measurable::in_row_spacer(constants, constants.medium_padding));
        row.push(Measurable::jagged_edge(constants));
        content.push(row);
    } else {
        content.extend(collect_input_rows(workspace, block, renderer, depth));
    }

    let mut bottom = Row::new(RowKind::Bottom);
    bottom.min_height = constants.medium_padding;
    bottom.push(corner(CornerSide::Left));
    if let Some(next) = block.next.as_ref() {
        let lead = (constants.notch_offset_left - constants.corner_radius).max(0.0);
        if lead > 0.0 {
            bottom.push(Measurable::in_row_spacer(constants, lead));
        }
        bottom.push(Measurable::next_connection(constants, next));
    }
    bottom.push(corner(CornerSide::Right));
    content.push(bottom);

    // Interleave spacer rows between content rows. The spacer ahead of the
    // bottom row is a per-variant choice.
    let mut rows: Vec<Row> = Vec::new();
    let count = content.len();
    for (idx, row) in content.into_iter().enumerate() {
        let is_last = idx + 1 == count;
        if idx > 0 && !(is_last && policy.suppress_trailing_row_spacer) {
            rows.push(Row::spacer(constants, constants.medium_padding));
        }
        rows.push(row);
    }
    rows
}

/// Opens a fresh input row, draining any pending icons into its lead.
fn open_row(
    rows: &mut Vec<Row>,
    icons: &mut Vec<Measurable>,
    constants: &ConstantProvider,
    align: InputAlign,
) {
    let mut row = Row::new(RowKind::Input);
    row.min_height = constants.field_height;
    row.align = align;
    row.push(Measurable::in_row_spacer(constants, constants.medium_padding));
    for icon in icons.drain(..) {
        row.push(icon);
        row.push(Measurable::in_row_spacer(constants, constants.small_padding));
    }
    rows.push(row);
}

fn collect_input_rows(
    workspace: &Workspace,
    block: &Block,
    renderer: &Renderer,
    depth: usize,
) -> Vec<Row> {
    let constants = &renderer.constants;
    let mut rows: Vec<Row> = Vec::new();
    let mut inline_open = false;
    let mut icons: Vec<Measurable> = block
        .icons
        .iter()
        .map(|name| Measurable::icon(constants, name))
        .collect();

    for input in &block.inputs {
        let child = child_size(workspace, block, input.connected_target(), renderer, depth);
        let inline = input.kind == InputKind::Value && block.inputs_inline;

        if !inline || !inline_open {
            open_row(&mut rows, &mut icons, constants, input.align);
            inline_open = inline;
        }
        let row = rows.last_mut().expect("row was just opened");

        for field in &input.fields {
            row.push(Measurable::field(constants, field));
            row.push(Measurable::in_row_spacer(constants, constants.small_padding));
        }
        match input.kind {
            InputKind::Value if inline => {
                row.push(Measurable::inline_input(constants, input, child));
                row.push(Measurable::in_row_spacer(constants, constants.small_padding));
            }
            InputKind::Value => {
                row.push(Measurable::external_value_input(constants, input, child));
                inline_open = false;
            }
            InputKind::Statement => {
                row.push(Measurable::statement_input(constants, input, child));
                inline_open = false;
            }
            InputKind::Dummy => {
                inline_open = false;
            }
        }
    }

    if !icons.is_empty() {
        open_row(&mut rows, &mut icons, constants, InputAlign::Left);
    }
    rows
}

fn child_size(
    workspace: &Workspace,
    parent: &Block,
    target: Option<&str>,
    renderer: &Renderer,
    depth: usize,
) -> Option<(f32, f32)> {
    if depth >= MAX_NEST_DEPTH {
        return None;
    }
    let id = target?;
    // A target that vanished from the workspace measures as unconnected.
    let child = workspace.block(id)?;
    if child.id == parent.id {
        return None;
    }
    let info = RenderInfo::build_at_depth(workspace, child, renderer, depth + 1);
    Some(info.size())
}

/// Distributes the slack between a row's natural width and the block's
/// outline width.
fn pad_row_to(row: &mut Row, target: f32, renderer: &Renderer) {
    let constants = &renderer.constants;
    let slack = target - row.width;
    if slack <= 0.0 {
        return;
    }
    match row.last_content_element().map(|e| e.kind) {
        // The tab must hug the right edge, so the slack goes before it.
        Some(MeasurableKind::ExternalValueInput) => {
            let at = row.elements.len() - 1;
            row.elements
                .insert(at, Measurable::in_row_spacer(constants, slack));
        }
        // Statement rows stay short; the outline wraps around the notch.
        Some(MeasurableKind::StatementInput) => return,
        _ => match row.align {
            InputAlign::Left => {
                row.push(Measurable::in_row_spacer(constants, slack));
            }
            InputAlign::Right => {
                row.elements
                    .insert(0, Measurable::in_row_spacer(constants, slack));
            }
            InputAlign::Centre => {
                let lead = slack / 2.0;
                row.elements
                    .insert(0, Measurable::in_row_spacer(constants, lead));
                row.push(Measurable::in_row_spacer(constants, slack - lead));
            }
        },
    }
    row.measure();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{Block, Field, Input, InputAlign};
    use crate::render::geras;

    fn ws_with(block: Block) -> (Workspace, String) {
        let mut ws = Workspace::new("w");
        let id = block.id.clone();
        ws.add_block(block).unwrap();
        (ws, id)
    }

    #[test]
    fn external_value_row_is_padded_to_the_outline_tab_flush_right() {
        let renderer = geras::renderer();
        let block = Block::new("b", "math_abs").with_input(Input::value("NUM"));
        let (ws, id) = ws_with(block);

        let first = RenderInfo::build(&ws, ws.block(&id).unwrap(), &renderer);
        for _ in 0..3 {
            let info = RenderInfo::build(&ws, ws.block(&id).unwrap(), &renderer);
            assert_eq!(info, first);
            let row = info
                .content_rows()
                .find(|r| r.kind == RowKind::Input)
                .unwrap();
            // Slack lands before the tab, never after it.
            assert_eq!(row.width, info.width);
            assert_eq!(
                row.elements.last().unwrap().kind,
                MeasurableKind::ExternalValueInput
            );
        }
    }

    #[test]
    fn connected_external_child_widens_bounds_not_outline() {
        let renderer = geras::renderer();
        let mut ws = Workspace::new("w");
        ws.add_block(Block::new("parent", "math_abs").with_input(Input::value("NUM").connect("child")))
            .unwrap();
        ws.add_block(
            Block::new("child", "math_number")
                .with_output()
                .with_input(Input::dummy("D").with_field(Field::label("NUM", "1234567890"))),
        )
        .unwrap();

        let info = RenderInfo::build(&ws, ws.block("parent").unwrap(), &renderer);
        assert!(info.bounds_width > info.width);
    }

    #[test]
    fn rows_are_positioned_top_down_and_elements_left_to_right() {
        let renderer = geras::renderer();
        let block = Block::new("b", "controls_repeat")
            .with_previous()
            .with_next()
            .with_input(Input::dummy("TIMES").with_field(Field::label("N", "repeat 10 times")))
            .with_input(Input::statement("DO"));
        let (ws, id) = ws_with(block);
        let info = RenderInfo::build(&ws, ws.block(&id).unwrap(), &renderer);

        let mut last_y = -1.0;
        for row in &info.rows {
            assert!(row.y > last_y || row.height == 0.0);
            last_y = row.y;
            let mut last_x = 0.0;
            for e in &row.elements {
                assert!(e.x >= last_x - 1e-3);
                last_x = e.x + e.width;
            }
        }
        assert_eq!(info.height, info.rows.iter().map(|r| r.height).sum::<f32>());
    }

    #[test]
    fn centred_row_splits_slack_both_sides() {
        let renderer = geras::renderer();
        let block = Block::new("b", "text_print")
            .with_input(
                Input::dummy("MSG")
                    .with_field(Field::label("T", "hi"))
                    .with_align(InputAlign::Centre),
            )
            .with_input(Input::dummy("LONG").with_field(Field::label("T2", "a much longer label")));
        let (ws, id) = ws_with(block);
        let info = RenderInfo::build(&ws, ws.block(&id).unwrap(), &renderer);

        let narrow = info
            .content_rows()
            .find(|r| r.kind == RowKind::Input && r.align == InputAlign::Centre)
            .unwrap();
        assert_eq!(narrow.width, info.width);
        assert!(narrow.elements.first().unwrap().kind.is_spacer());
        assert!(narrow.elements.last().unwrap().kind.is_spacer());
    }

    #[test]
    fn stale_connection_target_measures_as_unconnected() {
        let renderer = geras::renderer();
        let c = &renderer.constants;
        let connected = Block::new("b", "math_abs").with_input(Input::value("NUM").connect("ghost"));
        let (ws, id) = ws_with(connected);
        let info = RenderInfo::build(&ws, ws.block(&id).unwrap(), &renderer);
        let row = info
            .content_rows()
            .find(|r| r.kind == RowKind::Input)
            .unwrap();
        assert_eq!(row.connected_block_widths, 0.0);
        assert!(row.width >= c.tab_width);
    }

    #[test]
    fn collapsed_block_renders_a_jagged_edge() {
        let renderer = geras::renderer();
        let mut block = Block::new("b", "controls_if")
            .with_input(Input::value("IF0"))
            .with_input(Input::statement("DO0"));
        block.collapsed = true;
        let (ws, id) = ws_with(block);
        let info = RenderInfo::build(&ws, ws.block(&id).unwrap(), &renderer);
        assert!(info.rows.iter().any(|r| {
            r.elements
                .iter()
                .any(|e| e.kind == MeasurableKind::JaggedEdge)
        }));
        assert!(!info.rows.iter().any(|r| r.has_statement_input()));
    }

    #[test]
    fn icons_lead_the_first_input_row() {
        let renderer = geras::renderer();
        let mut block = Block::new("b", "controls_if")
            .with_input(Input::dummy("IF").with_field(Field::label("L", "if")));
        block.icons.push("comment".to_string());
        let (ws, id) = ws_with(block);
        let info = RenderInfo::build(&ws, ws.block(&id).unwrap(), &renderer);

        let row = info
            .content_rows()
            .find(|r| r.kind == RowKind::Input)
            .unwrap();
        let icon_at = row
            .elements
            .iter()
            .position(|e| e.kind == MeasurableKind::Icon)
            .unwrap();
        let field_at = row
            .elements
            .iter()
            .position(|e| e.kind.is_field())
            .unwrap();
        assert!(icon_at < field_at);
    }

    #[test]
    fn block_with_only_icons_still_gets_an_icon_row() {
        let renderer = geras::renderer();
        let mut block = Block::new("b", "annotated");
        block.icons.push("comment".to_string());
        block.icons.push("warning".to_string());
        let (ws, id) = ws_with(block);
        let info = RenderInfo::build(&ws, ws.block(&id).unwrap(), &renderer);

        let row = info
            .content_rows()
            .find(|r| r.kind == RowKind::Input)
            .unwrap();
        let icons = row
            .elements
            .iter()
            .filter(|e| e.kind == MeasurableKind::Icon)
            .count();
        assert_eq!(icons, 2);
        assert!(info.height > 0.0);
    }

    #[test]
    fn superseded_snapshot_is_replaced_not_mutated() {
        let renderer = geras::renderer();
        let block = Block::new("b", "text_print")
            .with_input(Input::dummy("MSG").with_field(Field::label("T", "hi")));
        let (mut ws, id) = ws_with(block);

        let before = RenderInfo::build(&ws, ws.block(&id).unwrap(), &renderer);
        ws.set_field(&id, "T", "a considerably longer text").unwrap();
        let after = RenderInfo::build(&ws, ws.block(&id).unwrap(), &renderer);

        assert!(after.width > before.width);
        // The old snapshot still reports its original geometry.
        assert!(before.width < after.width);
    }
}
