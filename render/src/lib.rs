//! Quest script backends for the `qdl` compiler.

pub mod backend;
pub mod block_renderer;
pub mod card;
pub mod normalize;
pub mod outline;
pub mod xml;

pub use backend::Backend;
pub use block_renderer::BlockRenderer;
pub use normalize::QuestAttrs;
pub use outline::{OutlineBackend, OutlineNode};
pub use xml::{Element, Node, XmlBackend};

use qdl::Compiler;

pub type XmlCompiler = Compiler<BlockRenderer<XmlBackend>>;
pub type OutlineCompiler = Compiler<BlockRenderer<OutlineBackend>>;

/// Compile quest script `source` to XML.
pub fn render_xml(source: &str) -> XmlCompiler {
    let mut compiler = Compiler::new(BlockRenderer::new(XmlBackend));
    compiler.render_source(source);
    compiler
}

/// Compile quest script `source` to an outline.
pub fn render_outline(source: &str) -> OutlineCompiler {
    let mut compiler = Compiler::new(BlockRenderer::new(OutlineBackend));
    compiler.render_source(source);
    compiler
}
