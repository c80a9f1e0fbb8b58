//! The touch-friendly renderer: larger geometry, dynamically sized rounded
//! value connectors, no trailing row spacer, and square corners on blocks
//! that plug into something.

use crate::block::ConnectionKind;
use crate::render::constants::{ConstantProvider, Shape};
use crate::render::{Renderer, RowPolicy};

fn rounded_width(element_height: f32) -> f32 {
    element_height / 2.0
}

fn rounded_height(element_height: f32) -> f32 {
    element_height
}

fn rounded_offset(element_height: f32) -> f32 {
    element_height / 2.0
}

fn no_offset(_element_height: f32) -> f32 {
    0.0
}

pub fn constants() -> ConstantProvider {
    let mut c = ConstantProvider::base();
    c.name = "zelos";
    c.corner_radius = 4.0;
    c.notch_width = 24.0;
    c.notch_height = 6.0;
    c.notch_offset_left = 18.0;
    c.min_block_height = 32.0;
    c.empty_inline_input_width = 32.0;
    c.empty_inline_input_height = 32.0;
    c.field_height = 24.0;
    c.large_padding = 12.0;
    c.embedded_css = ".blockPath { stroke-width: 1.5; }\n".to_string();
    c.set_shape(
        ConnectionKind::PreviousStatement,
        Shape::Fixed {
            width: 24.0,
            height: 6.0,
        },
    );
    c.set_shape(
        ConnectionKind::NextStatement,
        Shape::Fixed {
            width: 24.0,
            height: 6.0,
        },
    );
    let rounded = Shape::Dynamic {
        width: rounded_width,
        height: rounded_height,
        connection_offset_x: no_offset,
        connection_offset_y: rounded_offset,
    };
    c.set_shape(ConnectionKind::OutputValue, rounded);
    c.set_shape(ConnectionKind::InputValue, rounded);
    c
}

pub fn renderer() -> Renderer {
    Renderer {
        name: "zelos".to_string(),
        constants: constants(),
        policy: RowPolicy {
            suppress_trailing_row_spacer: true,
            square_corners_with_connections: true,
            dark_path: false,
        },
    }
}
