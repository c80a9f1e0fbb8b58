//! A modern take on the classic renderer: same row construction, slightly
//! airier geometry, no lowlight path.

use crate::render::constants::ConstantProvider;
use crate::render::{Renderer, RowPolicy};

pub fn constants() -> ConstantProvider {
    let mut c = ConstantProvider::base();
    c.name = "thrasos";
    c.medium_padding = 8.0;
    c.min_block_height = 26.0;
    c.field_height = 18.0;
    c.embedded_css = ".blockPath { stroke-width: 1; }\n".to_string();
    c
}

pub fn renderer() -> Renderer {
    Renderer {
        name: "thrasos".to_string(),
        constants: constants(),
        policy: RowPolicy::default(),
    }
}
