//! HTML codec: the document's only persisted and interchange format.

mod dom;
mod parse;
mod serialize;

#[cfg(test)]
mod tests;

pub use parse::parse_html;
pub use serialize::{RenderOptions, render_html, to_html};
