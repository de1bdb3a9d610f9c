//! Pipeline stages for Markdown-to-PDF conversion.
//!
//! Each submodule implements one step; [`crate::convert::Pipeline`] wires
//! them together.
//!
//! ## Data Flow
//!
//! ```text
//! command ──▶ converter ──▶ browser ──▶ (artifact removed)
//! (argv)      (pandoc)      (Chromium)
//! ```
//!
//! 1. [`command`]   — build pandoc's argument vector from paths + config
//! 2. [`converter`] — run pandoc as a child process, capture its output
//! 3. [`artifact`]  — own the intermediate HTML file and delete it on drop
//! 4. [`browser`]   — load the HTML in headless Chromium and print to PDF
//! 5. [`typeset`]   — the best-effort math step inside the browser

pub mod artifact;
pub mod browser;
pub mod command;
pub mod converter;
pub mod typeset;
