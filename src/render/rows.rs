//! Rows group measurables into the horizontal bands of a block.

use crate::block::InputAlign;
use crate::render::constants::ConstantProvider;
use crate::render::measurables::{Measurable, MeasurableKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowKind {
    Top,
    Bottom,
    Input,
    Spacer,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    pub kind: RowKind,
    pub elements: Vec<Measurable>,
    pub width: f32,
    pub height: f32,
    pub min_width: f32,
    pub min_height: f32,
    /// Set by the position pass; zero until then.
    pub x: f32,
    pub y: f32,
    pub align: InputAlign,
    /// Total width of child blocks hanging off statement/external inputs in
    /// this row. Kept apart from `width` so connector shapes are not counted
    /// twice when reserving space.
    pub connected_block_widths: f32,
    pub width_with_connected_blocks: f32,
}

impl Row {
    pub fn new(kind: RowKind) -> Self {
        Self {
            kind,
            elements: Vec::new(),
            width: 0.0,
            height: 0.0,
            min_width: 0.0,
            min_height: 0.0,
            x: 0.0,
            y: 0.0,
            align: InputAlign::Left,
            connected_block_widths: 0.0,
            width_with_connected_blocks: 0.0,
        }
    }

    /// A fixed-size separator between two content rows. Never re-measured.
    pub fn spacer(constants: &ConstantProvider, height: f32) -> Self {
        let mut row = Self::new(RowKind::Spacer);
        row.height = height;
        row.min_height = height;
        row.elements
            .push(Measurable::in_row_spacer(constants, 0.0));
        row
    }

    pub fn push(&mut self, element: Measurable) {
        self.elements.push(element);
    }

    /// Aggregates width and height from the elements. Idempotent: measuring
    /// twice without touching the elements yields identical results.
    ///
    /// Spacer elements contribute to row width but never to content height,
    /// so alignment edges are set by real content only.
    pub fn measure(&mut self) {
        if self.kind == RowKind::Spacer {
            return;
        }
        let mut width = 0.0;
        let mut height = self.min_height;
        let mut connected = 0.0;
        for element in &self.elements {
            width += element.width;
            if !element.kind.is_spacer() {
                height = height.max(element.height);
            }
            connected += element.connected_block_width;
        }
        self.width = width.max(self.min_width);
        self.height = height;
        self.connected_block_widths = connected;
        self.width_with_connected_blocks = self.width + connected;
    }

    pub fn last_content_element(&self) -> Option<&Measurable> {
        self.elements.iter().rev().find(|e| !e.kind.is_spacer())
    }

    /// Whether a trailing alignment spacer belongs at the end of this row.
    ///
    /// Rows ending in an external-value or statement connector already get
    /// visual padding from the connector shape; adding a spacer there would
    /// double the padding at the connector boundary.
    pub fn ends_with_elem_spacer(&self) -> bool {
        if self.kind == RowKind::Spacer {
            return false;
        }
        !matches!(
            self.last_content_element().map(|e| e.kind),
            Some(MeasurableKind::ExternalValueInput) | Some(MeasurableKind::StatementInput)
        )
    }

    pub fn has_statement_input(&self) -> bool {
        self.elements
            .iter()
            .any(|e| e.kind == MeasurableKind::StatementInput)
    }

    pub fn has_external_value_input(&self) -> bool {
        self.elements
            .iter()
            .any(|e| e.kind == MeasurableKind::ExternalValueInput)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Input;
    use crate::render::constants::ConstantProvider;
    use crate::render::measurables::CornerSide;

    fn constants() -> ConstantProvider {
        ConstantProvider::base()
    }

    fn field_row(c: &ConstantProvider) -> Row {
        let mut row = Row::new(RowKind::Input);
        row.push(Measurable::field(c, &crate::block::Field::label("A", "set")));
        row.push(Measurable::in_row_spacer(c, c.small_padding));
        row.push(Measurable::field(c, &crate::block::Field::label("B", "x")));
        row
    }

    #[test]
    fn measure_is_idempotent() {
        let c = constants();
        let mut row = field_row(&c);
        row.measure();
        let first = (row.width, row.height);
        row.measure();
        assert_eq!((row.width, row.height), first);
    }

    #[test]
    fn measure_sums_widths_and_takes_max_content_height() {
        let c = constants();
        let mut row = field_row(&c);
        row.measure();
        let expected_width = (3.0 * c.field_char_width + 2.0 * c.field_padding_x)
            + c.small_padding
            + (1.0 * c.field_char_width + 2.0 * c.field_padding_x);
        assert_eq!(row.width, expected_width);
        assert_eq!(row.height, c.field_height);
    }

    #[test]
    fn tall_spacer_does_not_set_row_height() {
        let c = constants();
        let mut row = Row::new(RowKind::Input);
        row.push(Measurable::field(&c, &crate::block::Field::label("A", "x")));
        let mut spacer = Measurable::in_row_spacer(&c, 4.0);
        spacer.height = 100.0;
        row.push(spacer);
        row.measure();
        assert_eq!(row.height, c.field_height);
    }

    #[test]
    fn connected_block_widths_tracked_separately() {
        let c = constants();
        let mut row = Row::new(RowKind::Input);
        let input = Input::value("VAL");
        row.push(Measurable::external_value_input(&c, &input, Some((50.0, 20.0))));
        row.measure();
        assert_eq!(row.connected_block_widths, 50.0);
        assert_eq!(row.width_with_connected_blocks, row.width + 50.0);
    }

    #[test]
    fn trailing_spacer_policy_by_last_connector() {
        let c = constants();
        let input = Input::value("VAL");

        let mut fields = field_row(&c);
        fields.measure();
        assert!(fields.ends_with_elem_spacer());

        let mut external = Row::new(RowKind::Input);
        external.push(Measurable::external_value_input(&c, &input, None));
        assert!(!external.ends_with_elem_spacer());

        let mut statement = Row::new(RowKind::Input);
        statement.push(Measurable::statement_input(&c, &Input::statement("DO"), None));
        // A trailing in-row spacer does not change the policy.
        statement.push(Measurable::in_row_spacer(&c, 2.0));
        assert!(!statement.ends_with_elem_spacer());
    }

    #[test]
    fn spacer_rows_are_never_re_measured() {
        let c = constants();
        let mut row = Row::spacer(&c, 6.0);
        row.push(Measurable::round_corner(&c, CornerSide::Left));
        row.measure();
        assert_eq!(row.height, 6.0);
        assert_eq!(row.width, 0.0);
    }
}
