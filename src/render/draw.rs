//! Turns a finalized [`RenderInfo`] into path-drawing instructions.
//!
//! The drawer walks rows top to bottom and elements left to right and emits an
//! SVG path string for the block outline (plus an offset shadow path when the
//! variant asks for one). Writing the result onto the visual surface is the
//! host's job, reached through [`PathRenderer`]. Output is deterministic for a
//! given snapshot.

use crate::render::Renderer;
use crate::render::info::RenderInfo;
use crate::render::measurables::MeasurableKind;
use crate::render::rows::RowKind;

/// The computed path strings for one block.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockPaths {
    pub outline: String,
    /// Shadow outline offset down-right, for variants with a lowlight edge.
    pub dark: Option<String>,
}

/// External collaborator that owns the actual drawing surface.
pub trait PathRenderer {
    fn set_paths(&mut self, block_id: &str, paths: BlockPaths);
}

pub fn draw(info: &RenderInfo, renderer: &Renderer) -> BlockPaths {
    let outline = outline_path(info, renderer, 0.0);
    let dark = if renderer.policy.dark_path {
        Some(outline_path(info, renderer, renderer.constants.dark_path_offset))
    } else {
        None
    };
    BlockPaths { outline, dark }
}

pub fn draw_into(info: &RenderInfo, renderer: &Renderer, out: &mut dyn PathRenderer) {
    let paths = draw(info, renderer);
    out.set_paths(&info.block_id, paths);
}

struct PathBuilder {
    d: String,
    dx: f32,
    dy: f32,
}

impl PathBuilder {
    fn new(dx: f32, dy: f32) -> Self {
        Self {
            d: String::new(),
            dx,
            dy,
        }
    }

    fn push(&mut self, segment: &str) {
        if !self.d.is_empty() {
            self.d.push(' ');
        }
        self.d.push_str(segment);
    }

    fn move_to(&mut self, x: f32, y: f32) {
        let segment = format!("M {:.1},{:.1}", x + self.dx, y + self.dy);
        self.push(&segment);
    }

    fn line_to(&mut self, x: f32, y: f32) {
        let segment = format!("L {:.1},{:.1}", x + self.dx, y + self.dy);
        self.push(&segment);
    }

    fn arc_to(&mut self, radius: f32, x: f32, y: f32) {
        let segment = format!(
            "A {radius:.1},{radius:.1} 0 0,1 {:.1},{:.1}",
            x + self.dx,
            y + self.dy
        );
        self.push(&segment);
    }

    fn rel(&mut self, segment: String) {
        self.push(&segment);
    }

    fn close(&mut self) {
        self.push("z");
    }

    fn finish(self) -> String {
        self.d
    }
}

/// Statement notch, drawn left-to-right (`flip` reverses it for the bottom
/// edge).
fn notch_segment(width: f32, height: f32, flip: bool) -> String {
    let step = width / 3.0;
    if flip {
        format!(
            "l {:.1},{:.1} {:.1},0 {:.1},{:.1}",
            -step, height, -step, -step, -height
        )
    } else {
        format!(
            "l {:.1},{:.1} {:.1},0 {:.1},{:.1}",
            step, height, step, step, -height
        )
    }
}

/// Puzzle tab on a vertical edge. `down` walks the right edge top-to-bottom;
/// the left-edge output tab walks bottom-to-top.
fn tab_segment(width: f32, height: f32, down: bool) -> String {
    let quarter = height / 4.0;
    if down {
        format!(
            "l {:.1},{:.1} 0,{:.1} {:.1},{:.1}",
            -width,
            quarter,
            height / 2.0,
            width,
            quarter
        )
    } else {
        format!(
            "l {:.1},{:.1} 0,{:.1} {:.1},{:.1}",
            -width,
            -quarter,
            -height / 2.0,
            width,
            -quarter
        )
    }
}

fn hat_segment(width: f32, height: f32) -> String {
    format!(
        "c {:.1},{:.1} {:.1},{:.1} {:.1},0",
        width * 0.3,
        -height,
        width * 0.7,
        -height,
        width
    )
}

fn outline_path(info: &RenderInfo, renderer: &Renderer, offset: f32) -> String {
    let constants = &renderer.constants;
    let width = info.width;
    let height = info.height;
    let mut p = PathBuilder::new(offset, offset);

    let top_row = info.rows.iter().find(|r| r.kind == RowKind::Top);
    let bottom_row = info.rows.iter().find(|r| r.kind == RowKind::Bottom);
    let square = top_row
        .and_then(|r| r.elements.first())
        .map(|e| matches!(e.kind, MeasurableKind::SquareCorner(_)))
        .unwrap_or(false);
    let radius = if square { 0.0 } else { constants.corner_radius };

    // Top edge, left to right.
    if radius > 0.0 {
        p.move_to(0.0, radius);
        p.arc_to(radius, radius, 0.0);
    } else {
        p.move_to(0.0, 0.0);
    }
    if let Some(row) = top_row {
        for element in &row.elements {
            match element.kind {
                MeasurableKind::Hat => {
                    p.line_to(element.x, 0.0);
                    p.rel(hat_segment(element.width, constants.hat_height));
                }
                MeasurableKind::PreviousConnection => {
                    p.line_to(element.x, 0.0);
                    p.rel(notch_segment(
                        element.connection_width,
                        element.connection_height,
                        false,
                    ));
                }
                _ => {}
            }
        }
    }
    if radius > 0.0 {
        p.line_to(width - radius, 0.0);
        p.arc_to(radius, width, radius);
    } else {
        p.line_to(width, 0.0);
    }

    // Right edge, walking rows downward. Statement rows cut inward, external
    // value rows get a tab cutout.
    for row in info.content_rows() {
        if row.kind != RowKind::Input {
            continue;
        }
        if row.has_statement_input() {
            let inner_x = row.width;
            p.line_to(width, row.y);
            p.line_to(inner_x, row.y);
            p.line_to(inner_x, row.y + row.height);
            p.line_to(width, row.y + row.height);
        } else if row.has_external_value_input() {
            let tab_y = row.y + constants.tab_offset_from_top;
            p.line_to(width, tab_y);
            p.rel(tab_segment(constants.tab_width, constants.tab_height, true));
        }
    }

    // Bottom edge, right to left.
    if radius > 0.0 {
        p.line_to(width, height - radius);
        p.arc_to(radius, width - radius, height);
    } else {
        p.line_to(width, height);
    }
    if let Some(row) = bottom_row
        && let Some(next) = row
            .elements
            .iter()
            .find(|e| e.kind == MeasurableKind::NextConnection)
    {
        p.line_to(next.x + next.connection_width, height);
        p.rel(notch_segment(
            next.connection_width,
            next.connection_height,
            true,
        ));
    }
    if radius > 0.0 {
        p.line_to(radius, height);
        p.arc_to(radius, 0.0, height - radius);
    } else {
        p.line_to(0.0, height);
    }

    // Left edge, bottom to top, with the output tab pointing outward.
    if let Some(output) = info.output.as_ref() {
        let tab_bottom = constants.tab_offset_from_top + output.connection_height;
        p.line_to(0.0, tab_bottom);
        p.rel(tab_segment(
            output.connection_width,
            output.connection_height,
            false,
        ));
    }
    p.close();
    p.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{Block, Field, Input, Workspace};
    use crate::render::{geras, zelos};

    struct Capture {
        last: Option<(String, BlockPaths)>,
    }

    impl PathRenderer for Capture {
        fn set_paths(&mut self, block_id: &str, paths: BlockPaths) {
            self.last = Some((block_id.to_string(), paths));
        }
    }

    fn statement_block() -> (Workspace, String) {
        let mut ws = Workspace::new("w");
        let block = Block::new("b", "controls_repeat")
            .with_previous()
            .with_next()
            .with_input(Input::dummy("TIMES").with_field(Field::label("N", "repeat")))
            .with_input(Input::statement("DO"));
        ws.add_block(block).unwrap();
        (ws, "b".to_string())
    }

    #[test]
    fn drawing_is_deterministic() {
        let renderer = geras::renderer();
        let (ws, id) = statement_block();
        let info = RenderInfo::build(&ws, ws.block(&id).unwrap(), &renderer);
        let first = draw(&info, &renderer);
        let second = draw(&info, &renderer);
        assert_eq!(first, second);
    }

    #[test]
    fn geras_emits_a_dark_path_zelos_does_not() {
        let (ws, id) = statement_block();

        let geras = geras::renderer();
        let info = RenderInfo::build(&ws, ws.block(&id).unwrap(), &geras);
        assert!(draw(&info, &geras).dark.is_some());

        let zelos = zelos::renderer();
        let info = RenderInfo::build(&ws, ws.block(&id).unwrap(), &zelos);
        assert!(draw(&info, &zelos).dark.is_none());
    }

    #[test]
    fn outline_mentions_every_edge_feature() {
        let renderer = geras::renderer();
        let (ws, id) = statement_block();
        let info = RenderInfo::build(&ws, ws.block(&id).unwrap(), &renderer);
        let paths = draw(&info, &renderer);
        assert!(paths.outline.starts_with("M "));
        assert!(paths.outline.ends_with('z'));
        // Round corners produce arcs; the two notches produce relative runs.
        assert!(paths.outline.contains("A "));
        assert!(paths.outline.matches("l ").count() >= 2);
    }

    #[test]
    fn paths_land_on_the_collaborator() {
        let renderer = geras::renderer();
        let (ws, id) = statement_block();
        let info = RenderInfo::build(&ws, ws.block(&id).unwrap(), &renderer);
        let mut sink = Capture { last: None };
        draw_into(&info, &renderer, &mut sink);
        let (block_id, paths) = sink.last.unwrap();
        assert_eq!(block_id, "b");
        assert!(!paths.outline.is_empty());
    }
}
