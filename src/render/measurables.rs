//! Measurable elements: the typed value objects a row is assembled from.
//!
//! Each constructor derives geometry once, synchronously, from the constant
//! provider and the source model object. Measurables are created fresh on
//! every re-measure pass and owned exclusively by the render info that built
//! them; `source` is a non-owning name of the model object measured.

use crate::block::{Connection, Field, Input};
use crate::render::constants::ConstantProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CornerSide {
    Left,
    Right,
}

/// Closed enumeration of everything that can appear in a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasurableKind {
    Field,
    Icon,
    Hat,
    JaggedEdge,
    RoundCorner(CornerSide),
    SquareCorner(CornerSide),
    InRowSpacer,
    PreviousConnection,
    NextConnection,
    OutputConnection,
    InlineInput,
    ExternalValueInput,
    StatementInput,
}

impl MeasurableKind {
    pub fn is_spacer(&self) -> bool {
        matches!(self, MeasurableKind::InRowSpacer)
    }

    pub fn is_field(&self) -> bool {
        matches!(self, MeasurableKind::Field)
    }

    pub fn is_corner(&self) -> bool {
        matches!(
            self,
            MeasurableKind::RoundCorner(_) | MeasurableKind::SquareCorner(_)
        )
    }

    pub fn is_input(&self) -> bool {
        matches!(
            self,
            MeasurableKind::InlineInput
                | MeasurableKind::ExternalValueInput
                | MeasurableKind::StatementInput
        )
    }

    /// Inputs count as connections: they carry an attachment point.
    pub fn is_connection(&self) -> bool {
        self.is_input()
            || matches!(
                self,
                MeasurableKind::PreviousConnection
                    | MeasurableKind::NextConnection
                    | MeasurableKind::OutputConnection
            )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Measurable {
    pub kind: MeasurableKind,
    pub width: f32,
    pub height: f32,
    /// Set by the position pass; zero until then.
    pub x: f32,
    pub center_y: f32,
    pub connection_width: f32,
    pub connection_height: f32,
    pub connection_offset_x: f32,
    pub connection_offset_y: f32,
    pub is_dynamic_shape: bool,
    /// Bounding box of the connected child block, zero when unconnected.
    pub connected_block_width: f32,
    pub connected_block_height: f32,
    pub source: Option<String>,
}

impl Measurable {
    fn sized(kind: MeasurableKind, width: f32, height: f32) -> Self {
        Self {
            kind,
            width: width.max(0.0),
            height: height.max(0.0),
            x: 0.0,
            center_y: 0.0,
            connection_width: 0.0,
            connection_height: 0.0,
            connection_offset_x: 0.0,
            connection_offset_y: 0.0,
            is_dynamic_shape: false,
            connected_block_width: 0.0,
            connected_block_height: 0.0,
            source: None,
        }
    }

    pub fn field(constants: &ConstantProvider, field: &Field) -> Self {
        let chars = field.text.chars().count() as f32;
        let width = chars * constants.field_char_width + 2.0 * constants.field_padding_x;
        let mut m = Self::sized(MeasurableKind::Field, width, constants.field_height);
        m.source = Some(field.name.clone());
        m
    }

    pub fn icon(constants: &ConstantProvider, name: &str) -> Self {
        let mut m = Self::sized(MeasurableKind::Icon, constants.icon_size, constants.icon_size);
        m.source = Some(name.to_string());
        m
    }

    pub fn hat(constants: &ConstantProvider) -> Self {
        Self::sized(MeasurableKind::Hat, constants.hat_width, constants.hat_height)
    }

    pub fn jagged_edge(constants: &ConstantProvider) -> Self {
        Self::sized(
            MeasurableKind::JaggedEdge,
            constants.jagged_edge_width,
            constants.jagged_edge_height,
        )
    }

    pub fn round_corner(constants: &ConstantProvider, side: CornerSide) -> Self {
        Self::sized(
            MeasurableKind::RoundCorner(side),
            constants.corner_radius,
            constants.corner_radius,
        )
    }

    pub fn square_corner(constants: &ConstantProvider, side: CornerSide) -> Self {
        Self::sized(
            MeasurableKind::SquareCorner(side),
            constants.corner_radius,
            constants.corner_radius,
        )
    }

    pub fn in_row_spacer(constants: &ConstantProvider, width: f32) -> Self {
        Self::sized(MeasurableKind::InRowSpacer, width, constants.medium_padding)
    }

    pub fn previous_connection(constants: &ConstantProvider, connection: &Connection) -> Self {
        Self::statement_notch(constants, connection, MeasurableKind::PreviousConnection)
    }

    pub fn next_connection(constants: &ConstantProvider, connection: &Connection) -> Self {
        Self::statement_notch(constants, connection, MeasurableKind::NextConnection)
    }

    fn statement_notch(
        constants: &ConstantProvider,
        connection: &Connection,
        kind: MeasurableKind,
    ) -> Self {
        let shape = constants.shape_for(connection);
        let height = shape.height_for(constants.min_block_height);
        let width = shape.width_for(constants.min_block_height);
        let mut m = Self::sized(kind, width, height);
        m.connection_width = width;
        m.connection_height = height;
        m.is_dynamic_shape = shape.is_dynamic();
        m
    }

    /// Output connections have no row height to size against yet, so dynamic
    /// shapes are evaluated against the minimum block height.
    pub fn output_connection(constants: &ConstantProvider, connection: &Connection) -> Self {
        let shape = constants.shape_for(connection);
        let hint = constants.min_block_height;
        let mut m = Self::sized(
            MeasurableKind::OutputConnection,
            shape.width_for(hint),
            shape.height_for(hint),
        );
        m.connection_width = m.width;
        m.connection_height = m.height;
        m.connection_offset_x = shape.offset_x_for(hint);
        m.connection_offset_y = shape.offset_y_for(hint);
        m.is_dynamic_shape = shape.is_dynamic();
        m
    }

    /// An inline value input renders its connected child inside the block, so
    /// the child's bounding box is part of the element width.
    pub fn inline_input(
        constants: &ConstantProvider,
        input: &Input,
        child: Option<(f32, f32)>,
    ) -> Self {
        let shape = input
            .connection
            .as_ref()
            .map(|c| constants.shape_for(c))
            .unwrap_or_else(crate::render::constants::Shape::zero);
        let (child_w, child_h) = child.unwrap_or((0.0, 0.0));
        let height = child_h.max(constants.empty_inline_input_height);
        let width = if child.is_some() {
            child_w + shape.width_for(height) + 2.0 * constants.small_padding
        } else {
            constants.empty_inline_input_width
        };
        let mut m = Self::sized(MeasurableKind::InlineInput, width, height);
        m.connection_width = shape.width_for(height);
        m.connection_height = shape.height_for(height);
        m.connection_offset_x = shape.offset_x_for(height);
        m.connection_offset_y = shape.offset_y_for(height);
        m.is_dynamic_shape = shape.is_dynamic();
        m.connected_block_width = child_w;
        m.connected_block_height = child_h;
        m.source = Some(input.name.clone());
        m
    }

    /// External value inputs only contribute the connector tab to the row;
    /// the connected child hangs outside the outline and is tracked
    /// separately so the layout engine can reserve space for it.
    pub fn external_value_input(
        constants: &ConstantProvider,
        input: &Input,
        child: Option<(f32, f32)>,
    ) -> Self {
        let shape = input
            .connection
            .as_ref()
            .map(|c| constants.shape_for(c))
            .unwrap_or_else(crate::render::constants::Shape::zero);
        let (child_w, child_h) = child.unwrap_or((0.0, 0.0));
        let height = child_h.max(constants.tab_height);
        let width = shape.width_for(height) + constants.external_value_input_padding;
        let mut m = Self::sized(MeasurableKind::ExternalValueInput, width, height);
        m.connection_width = shape.width_for(height);
        m.connection_height = shape.height_for(height);
        m.connection_offset_x = shape.offset_x_for(height);
        m.connection_offset_y = shape.offset_y_for(height);
        m.is_dynamic_shape = shape.is_dynamic();
        m.connected_block_width = child_w;
        m.connected_block_height = child_h;
        m.source = Some(input.name.clone());
        m
    }

    pub fn statement_input(
        constants: &ConstantProvider,
        input: &Input,
        child: Option<(f32, f32)>,
    ) -> Self {
        let shape = input
            .connection
            .as_ref()
            .map(|c| constants.shape_for(c))
            .unwrap_or_else(crate::render::constants::Shape::zero);
        let (child_w, child_h) = child.unwrap_or((0.0, 0.0));
        let height = child_h.max(constants.min_block_height);
        let width = constants.notch_offset_left + shape.width_for(height);
        let mut m = Self::sized(MeasurableKind::StatementInput, width, height);
        m.connection_width = shape.width_for(height);
        m.connection_height = shape.height_for(height);
        m.is_dynamic_shape = shape.is_dynamic();
        m.connected_block_width = child_w;
        m.connected_block_height = child_h;
        m.source = Some(input.name.clone());
        m
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::{Connection, ConnectionKind, Field, Input};
    use crate::render::constants::Shape;

    fn constants() -> ConstantProvider {
        ConstantProvider::base()
    }

    #[test]
    fn all_variants_have_non_negative_dimensions() {
        let c = constants();
        let input = Input::value("VAL");
        let statement = Input::statement("DO");
        let variants = vec![
            Measurable::field(&c, &Field::label("L", "")),
            Measurable::field(&c, &Field::label("L", "repeat")),
            Measurable::icon(&c, "comment"),
            Measurable::hat(&c),
            Measurable::jagged_edge(&c),
            Measurable::round_corner(&c, CornerSide::Left),
            Measurable::square_corner(&c, CornerSide::Right),
            Measurable::in_row_spacer(&c, 4.0),
            Measurable::previous_connection(&c, &Connection::new(ConnectionKind::PreviousStatement)),
            Measurable::next_connection(&c, &Connection::new(ConnectionKind::NextStatement)),
            Measurable::output_connection(&c, &Connection::new(ConnectionKind::OutputValue)),
            Measurable::inline_input(&c, &input, None),
            Measurable::inline_input(&c, &input, Some((40.0, 30.0))),
            Measurable::external_value_input(&c, &input, None),
            Measurable::statement_input(&c, &statement, Some((60.0, 48.0))),
        ];
        for m in variants {
            assert!(m.width >= 0.0, "{:?} has negative width", m.kind);
            assert!(m.height >= 0.0, "{:?} has negative height", m.kind);
        }
    }

    #[test]
    fn connected_inline_input_inherits_child_bounding_box() {
        let c = constants();
        let input = Input::value("VAL");
        let m = Measurable::inline_input(&c, &input, Some((40.0, 30.0)));
        assert_eq!(m.connected_block_width, 40.0);
        assert_eq!(m.connected_block_height, 30.0);
        assert!(m.width > 40.0);
        assert_eq!(m.height, 30.0);
    }

    #[test]
    fn unconnected_inputs_fall_back_to_placeholder_sizes() {
        let c = constants();
        let input = Input::value("VAL");
        let m = Measurable::inline_input(&c, &input, None);
        assert_eq!(m.width, c.empty_inline_input_width);
        assert_eq!(m.height, c.empty_inline_input_height);

        let ext = Measurable::external_value_input(&c, &input, None);
        assert_eq!(ext.width, c.tab_width + c.external_value_input_padding);
        assert_eq!(ext.connected_block_width, 0.0);
    }

    #[test]
    fn external_input_excludes_child_width_from_element_width() {
        let c = constants();
        let input = Input::value("VAL");
        let m = Measurable::external_value_input(&c, &input, Some((80.0, 20.0)));
        assert_eq!(m.width, c.tab_width + c.external_value_input_padding);
        assert_eq!(m.connected_block_width, 80.0);
    }

    #[test]
    fn dynamic_shape_sizes_against_own_height() {
        fn half(h: f32) -> f32 {
            h / 2.0
        }
        fn full(h: f32) -> f32 {
            h
        }
        fn zero(_h: f32) -> f32 {
            0.0
        }
        let mut c = constants();
        c.set_shape(
            ConnectionKind::InputValue,
            Shape::Dynamic {
                width: half,
                height: full,
                connection_offset_x: zero,
                connection_offset_y: half,
            },
        );
        let input = Input::value("VAL");
        let m = Measurable::inline_input(&c, &input, Some((40.0, 32.0)));
        assert!(m.is_dynamic_shape);
        assert_eq!(m.connection_width, 16.0);
        assert_eq!(m.connection_height, 32.0);
        assert_eq!(m.connection_offset_y, 16.0);
    }

    #[test]
    fn category_predicates_partition_sensibly() {
        assert!(MeasurableKind::InRowSpacer.is_spacer());
        assert!(!MeasurableKind::InRowSpacer.is_connection());
        assert!(MeasurableKind::StatementInput.is_input());
        assert!(MeasurableKind::StatementInput.is_connection());
        assert!(MeasurableKind::PreviousConnection.is_connection());
        assert!(!MeasurableKind::PreviousConnection.is_input());
        assert!(MeasurableKind::RoundCorner(CornerSide::Left).is_corner());
    }
}
