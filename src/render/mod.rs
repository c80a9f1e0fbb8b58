//! Rendering/measurement pipeline: constant providers, measurables, rows,
//! the layout solver and the path drawer, bundled into named renderer
//! strategies.

pub mod constants;
pub mod draw;
pub mod geras;
pub mod info;
pub mod measurables;
pub mod minimalist;
pub mod rows;
pub mod thrasos;
pub mod zelos;

pub use constants::{ConstantProvider, Shape};
pub use draw::{BlockPaths, PathRenderer, draw, draw_into};
pub use info::RenderInfo;

use once_cell::sync::Lazy;
use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::block::{Block, Workspace};
use crate::error::{Error, Result};

/// Per-variant layout choices. Variants diverge here instead of subclassing
/// the layout engine.
#[derive(Debug, Clone)]
pub struct RowPolicy {
    /// Skip the spacer row ahead of the bottom row.
    pub suppress_trailing_row_spacer: bool,
    /// Square the corners of blocks that carry a previous or output
    /// connection.
    pub square_corners_with_connections: bool,
    /// Emit the offset shadow path.
    pub dark_path: bool,
}

impl Default for RowPolicy {
    fn default() -> Self {
        Self {
            suppress_trailing_row_spacer: false,
            square_corners_with_connections: false,
            dark_path: false,
        }
    }
}

/// A named bundle of constants and layout policy, selected per workspace.
#[derive(Debug, Clone)]
pub struct Renderer {
    pub name: String,
    pub constants: ConstantProvider,
    pub policy: RowPolicy,
}

impl Renderer {
    /// Full pipeline for one block: layout, then path generation against the
    /// finished snapshot.
    pub fn render_block(&self, workspace: &Workspace, block: &Block) -> (RenderInfo, BlockPaths) {
        let info = RenderInfo::build(workspace, block, self);
        let paths = draw::draw(&info, self);
        (info, paths)
    }
}

pub type RendererFactory = fn() -> Renderer;

/// Lays out every top-level block and assembles a standalone SVG document.
/// Dark paths go under their outlines so the offset reads as a drop shadow.
pub fn workspace_svg(workspace: &Workspace, renderer: &Renderer) -> String {
    const MARGIN: f32 = 8.0;
    let mut body = String::new();
    let mut width = 0.0f32;
    let mut height = 0.0f32;
    for block in workspace.top_blocks() {
        let (info, paths) = renderer.render_block(workspace, block);
        width = width.max(block.x + info.bounds_width);
        height = height.max(block.y + info.height);
        body.push_str(&format!(
            "  <g transform=\"translate({:.1},{:.1})\" data-block-id=\"{}\">\n",
            block.x, block.y, info.block_id
        ));
        if let Some(dark) = &paths.dark {
            body.push_str(&format!(
                "    <path class=\"block-path-dark\" d=\"{dark}\"/>\n"
            ));
        }
        body.push_str(&format!(
            "    <path class=\"block-path\" d=\"{}\"/>\n",
            paths.outline
        ));
        body.push_str("  </g>\n");
    }
    let doc_width = width + 2.0 * MARGIN;
    let doc_height = height + 2.0 * MARGIN;
    let mut svg = format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{doc_width:.1}\" height=\"{doc_height:.1}\" viewBox=\"{:.1} {:.1} {doc_width:.1} {doc_height:.1}\">\n",
        -MARGIN, -MARGIN
    );
    if !renderer.constants.embedded_css.is_empty() {
        svg.push_str(&format!(
            "  <style>{}</style>\n",
            renderer.constants.embedded_css
        ));
    }
    svg.push_str(&body);
    svg.push_str("</svg>\n");
    svg
}

/// Mapping from renderer name to factory. Registration is last-writer-wins;
/// lookups for unregistered names fail loudly.
pub struct RendererRegistry {
    map: BTreeMap<String, RendererFactory>,
}

impl RendererRegistry {
    pub fn new() -> Self {
        Self {
            map: BTreeMap::new(),
        }
    }

    pub fn with_builtin_renderers() -> Self {
        let mut registry = Self::new();
        registry.register("geras", geras::renderer);
        registry.register("zelos", zelos::renderer);
        registry.register("thrasos", thrasos::renderer);
        registry.register("minimalist", minimalist::renderer);
        registry
    }

    pub fn register(&mut self, name: &str, factory: RendererFactory) {
        if self.map.insert(name.to_string(), factory).is_some() {
            log::debug!("renderer {name:?} re-registered, replacing previous factory");
        }
    }

    pub fn get(&self, name: &str) -> Result<Renderer> {
        let factory = self
            .map
            .get(name)
            .ok_or_else(|| Error::RendererNotFound(name.to_string()))?;
        Ok(factory())
    }

    pub fn names(&self) -> Vec<&str> {
        self.map.keys().map(String::as_str).collect()
    }
}

impl Default for RendererRegistry {
    fn default() -> Self {
        Self::with_builtin_renderers()
    }
}

static GLOBAL_RENDERERS: Lazy<Mutex<RendererRegistry>> =
    Lazy::new(|| Mutex::new(RendererRegistry::with_builtin_renderers()));

pub fn global_renderers() -> &'static Mutex<RendererRegistry> {
    &GLOBAL_RENDERERS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_of_unregistered_name_fails_not_found() {
        let registry = RendererRegistry::with_builtin_renderers();
        let err = registry.get("vaporware").unwrap_err();
        assert!(matches!(err, Error::RendererNotFound(name) if name == "vaporware"));
    }

    #[test]
    fn builtin_renderers_are_all_resolvable() {
        let registry = RendererRegistry::with_builtin_renderers();
        for name in ["geras", "zelos", "thrasos", "minimalist"] {
            let renderer = registry.get(name).unwrap();
            assert_eq!(renderer.name, name);
        }
    }

    #[test]
    fn re_registration_replaces_the_factory() {
        let mut registry = RendererRegistry::new();
        registry.register("custom", geras::renderer);
        registry.register("custom", zelos::renderer);
        assert_eq!(registry.get("custom").unwrap().name, "zelos");
        assert_eq!(registry.names(), vec!["custom"]);
    }

    #[test]
    fn each_lookup_builds_a_fresh_provider() {
        let registry = RendererRegistry::with_builtin_renderers();
        let a = registry.get("geras").unwrap();
        let b = registry.get("geras").unwrap();
        // Same constants, distinct instances: re-theming swaps providers
        // wholesale instead of mutating a shared one.
        assert_eq!(a.constants.corner_radius, b.constants.corner_radius);
    }
}
