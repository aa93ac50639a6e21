//! Pipeline stages between a math node and its embedded image.
//!
//! ## Data Flow
//!
//! ```text
//! "$x^2$" ──▶ render ──▶ embed ──▶ <img embedmath-tex=…>
//!             (latex,     (base64,
//!              dvisvgm)    markup)
//!
//! <img embedmath-tex=…> ──▶ markup ──▶ embed::decode_tex_attribute ──▶ "$x^2$"
//! ```
//!
//! 1. [`render`]: write the LaTeX template to a temp dir and run the TeX
//!    toolchain through a [`crate::runner::ToolRunner`]
//! 2. [`embed`]: base64-wrap the SVG and build the bit-exact markup;
//!    escape and unescape the `embedmath-tex` attribute
//! 3. [`markup`]: locate the first element of a raw HTML fragment and its
//!    attributes, for decoding

pub mod embed;
pub mod markup;
pub mod render;
