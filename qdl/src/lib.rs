pub mod block;
pub mod compiler;
pub mod diagnostic;
pub mod pattern;
pub mod render;

pub use block::{Block, BlockId, BlockList, RenderState};
pub use compiler::Compiler;
pub use diagnostic::{Categorized, Code, Diagnostic, Log, Severity};
pub use render::{Meta, Rendered, Renderer, Unit};
