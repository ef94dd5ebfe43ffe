//! Pipeline stages for table extraction.
//!
//! Each submodule implements exactly one transformation step, so every stage
//! is testable on its own and the two external capabilities (pdfium and the
//! LLM) can be swapped for fakes.
//!
//! ## Data Flow
//!
//! ```text
//!                       ┌──▶ llm ──▶ postprocess   (rent-roll JSON)
//! input ──▶ extract ────┤
//! (URL/upload) (pdfium) └──▶ merge                 (CSV attachment)
//! ```
//!
//! 1. [`input`]  : fetch the PDF from a URL, or persist an upload to a
//!    scoped temporary file
//! 2. [`extract`]: run table detection page by page; runs in
//!    `spawn_blocking` because pdfium is not async-safe
//! 3. [`layout`] : the pure geometry behind `extract`: positioned text → grids
//! 4. [`llm`]    : drive the text-generation call with bounded retry; the
//!    only stage besides `input` with network I/O
//! 5. [`postprocess`]: deterministic reply cleanup and validation
//! 6. [`merge`]  : positional concatenation and CSV serialisation

pub mod extract;
pub mod input;
pub mod layout;
pub mod llm;
pub mod merge;
pub mod postprocess;
