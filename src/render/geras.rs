//! The classic renderer: rounded corners and a one-pixel lowlight edge drawn
//! as a second, offset path.

use crate::render::constants::ConstantProvider;
use crate::render::{Renderer, RowPolicy};

pub fn constants() -> ConstantProvider {
    let mut c = ConstantProvider::base();
    c.name = "geras";
    c.dark_path_offset = 1.0;
    c.embedded_css = "\
.blockPath { stroke-width: 1; }\n\
.blockPathDark { fill-opacity: 0.4; }\n"
        .to_string();
    c
}

pub fn renderer() -> Renderer {
    Renderer {
        name: "geras".to_string(),
        constants: constants(),
        policy: RowPolicy {
            dark_path: true,
            ..RowPolicy::default()
        },
    }
}
