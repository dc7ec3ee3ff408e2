//! Pipeline stages for page-to-PDF conversion.
//!
//! Each submodule implements exactly one transformation step, so each can be
//! tested without the others and the renderer can be swapped without
//! touching extraction.
//!
//! ## Data Flow
//!
//! ```text
//! fetch ──▶ extract ──▶ rewrite ──▶ render
//! (bytes)   (title,     (HTML       (temp file →
//!            date,       document)   wkhtmltopdf → PDF)
//!            fragment)
//! ```
//!
//! 1. [`fetch`]    : single HTTP GET, the only stage with network I/O
//! 2. [`extract`]  : fixed-shape DOM queries with `scraper`
//! 3. [`rewrite`]  : image `src` rewriting with `lol_html`, document assembly
//! 4. [`render`]   : external engine on the blocking pool; [`filename`]
//!    decides where the PDF goes

pub mod extract;
pub mod fetch;
pub mod filename;
pub mod render;
pub mod rewrite;
