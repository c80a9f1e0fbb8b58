//! Bare-bones renderer: square everything, no hats, no extra styling. Useful
//! as a measurement baseline and in tests.

use crate::render::constants::ConstantProvider;
use crate::render::{Renderer, RowPolicy};

pub fn constants() -> ConstantProvider {
    let mut c = ConstantProvider::base();
    c.name = "minimalist";
    c.corner_radius = 0.0;
    c.hat_height = 0.0;
    c.dark_path_offset = 0.0;
    c
}

pub fn renderer() -> Renderer {
    Renderer {
        name: "minimalist".to_string(),
        constants: constants(),
        policy: RowPolicy::default(),
    }
}
