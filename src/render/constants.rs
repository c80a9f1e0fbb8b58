//! Geometric constants and connector shape tables for one renderer variant.
//!
//! A provider is immutable once built and shared read-only by every measurable
//! and row produced during its renderer's lifetime. Swapping renderer or theme
//! replaces the whole provider rather than mutating it in place.

use std::collections::BTreeMap;

use crate::block::{Connection, ConnectionKind};

/// A connector shape: either fixed-size, or sized against the height of the
/// element it attaches to.
#[derive(Debug, Clone, Copy)]
pub enum Shape {
    Fixed {
        width: f32,
        height: f32,
    },
    Dynamic {
        width: fn(f32) -> f32,
        height: fn(f32) -> f32,
        connection_offset_x: fn(f32) -> f32,
        connection_offset_y: fn(f32) -> f32,
    },
}

impl Shape {
    pub fn zero() -> Self {
        Shape::Fixed {
            width: 0.0,
            height: 0.0,
        }
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, Shape::Dynamic { .. })
    }

    pub fn width_for(&self, element_height: f32) -> f32 {
        match self {
            Shape::Fixed { width, .. } => *width,
            Shape::Dynamic { width, .. } => width(element_height),
        }
        .max(0.0)
    }

    pub fn height_for(&self, element_height: f32) -> f32 {
        match self {
            Shape::Fixed { height, .. } => *height,
            Shape::Dynamic { height, .. } => height(element_height),
        }
        .max(0.0)
    }

    pub fn offset_x_for(&self, element_height: f32) -> f32 {
        match self {
            Shape::Fixed { .. } => 0.0,
            Shape::Dynamic {
                connection_offset_x,
                ..
            } => connection_offset_x(element_height),
        }
    }

    pub fn offset_y_for(&self, element_height: f32) -> f32 {
        match self {
            Shape::Fixed { .. } => 0.0,
            Shape::Dynamic {
                connection_offset_y,
                ..
            } => connection_offset_y(element_height),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConstantProvider {
    pub name: &'static str,
    pub small_padding: f32,
    pub medium_padding: f32,
    pub large_padding: f32,
    pub corner_radius: f32,
    pub notch_width: f32,
    pub notch_height: f32,
    pub notch_offset_left: f32,
    pub tab_width: f32,
    pub tab_height: f32,
    pub tab_offset_from_top: f32,
    pub min_block_width: f32,
    pub min_block_height: f32,
    pub empty_inline_input_width: f32,
    pub empty_inline_input_height: f32,
    pub external_value_input_padding: f32,
    pub field_height: f32,
    pub field_char_width: f32,
    pub field_padding_x: f32,
    pub icon_size: f32,
    pub hat_width: f32,
    pub hat_height: f32,
    pub jagged_edge_width: f32,
    pub jagged_edge_height: f32,
    pub dark_path_offset: f32,
    pub embedded_css: String,
    shapes: BTreeMap<ConnectionKind, Shape>,
}

impl ConstantProvider {
    /// Baseline geometry shared by the concrete variants. Each variant
    /// constructor starts here and overrides what diverges.
    pub fn base() -> Self {
        let mut provider = Self {
            name: "base",
            small_padding: 3.0,
            medium_padding: 5.0,
            large_padding: 10.0,
            corner_radius: 8.0,
            notch_width: 15.0,
            notch_height: 4.0,
            notch_offset_left: 15.0,
            tab_width: 8.0,
            tab_height: 15.0,
            tab_offset_from_top: 5.0,
            min_block_width: 12.0,
            min_block_height: 24.0,
            empty_inline_input_width: 22.5,
            empty_inline_input_height: 26.0,
            external_value_input_padding: 2.0,
            field_height: 16.0,
            field_char_width: 8.0,
            field_padding_x: 5.0,
            icon_size: 16.0,
            hat_width: 100.0,
            hat_height: 15.0,
            jagged_edge_width: 15.0,
            jagged_edge_height: 20.0,
            dark_path_offset: 0.0,
            embedded_css: String::new(),
            shapes: BTreeMap::new(),
        };
        provider.set_shape(
            ConnectionKind::PreviousStatement,
            Shape::Fixed {
                width: 15.0,
                height: 4.0,
            },
        );
        provider.set_shape(
            ConnectionKind::NextStatement,
            Shape::Fixed {
                width: 15.0,
                height: 4.0,
            },
        );
        provider.set_shape(
            ConnectionKind::OutputValue,
            Shape::Fixed {
                width: 8.0,
                height: 15.0,
            },
        );
        provider.set_shape(
            ConnectionKind::InputValue,
            Shape::Fixed {
                width: 8.0,
                height: 15.0,
            },
        );
        provider
    }

    pub fn set_shape(&mut self, kind: ConnectionKind, shape: Shape) {
        self.shapes.insert(kind, shape);
    }

    pub fn clear_shape(&mut self, kind: ConnectionKind) {
        self.shapes.remove(&kind);
    }

    /// Looks up the connector shape for a connection. A variant whose table
    /// has no entry for the kind gets a zero-size shape back; the block stays
    /// renderable.
    pub fn shape_for(&self, connection: &Connection) -> Shape {
        self.shapes
            .get(&connection.kind)
            .copied()
            .unwrap_or_else(Shape::zero)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shape_lookup_covers_every_kind_in_base() {
        let provider = ConstantProvider::base();
        for kind in [
            ConnectionKind::InputValue,
            ConnectionKind::OutputValue,
            ConnectionKind::NextStatement,
            ConnectionKind::PreviousStatement,
        ] {
            let shape = provider.shape_for(&Connection::new(kind));
            assert!(shape.width_for(0.0) > 0.0);
        }
    }

    #[test]
    fn missing_shape_falls_back_to_zero_size() {
        let mut provider = ConstantProvider::base();
        provider.clear_shape(ConnectionKind::OutputValue);
        let shape = provider.shape_for(&Connection::new(ConnectionKind::OutputValue));
        assert_eq!(shape.width_for(20.0), 0.0);
        assert_eq!(shape.height_for(20.0), 0.0);
        assert!(!shape.is_dynamic());
    }

    #[test]
    fn dynamic_shape_evaluates_against_element_height() {
        fn half(h: f32) -> f32 {
            h / 2.0
        }
        fn full(h: f32) -> f32 {
            h
        }
        fn none(_h: f32) -> f32 {
            0.0
        }
        let shape = Shape::Dynamic {
            width: half,
            height: full,
            connection_offset_x: none,
            connection_offset_y: half,
        };
        assert!(shape.is_dynamic());
        assert_eq!(shape.width_for(30.0), 15.0);
        assert_eq!(shape.height_for(30.0), 30.0);
        assert_eq!(shape.offset_y_for(30.0), 15.0);
    }
}
