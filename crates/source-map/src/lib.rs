//! Source position tracking for the uiml toolchain.
//!
//! Every token, AST node and diagnostic in the workspace is positioned with a
//! [`Span`] (a half-open byte range). [`LineIndex`] converts byte offsets into
//! line/column pairs when a diagnostic is reported.

mod line_index;
mod span;

pub use line_index::{LineCol, LineIndex};
pub use span::{ByteOffset, Span};
