//! Output module for assembling and writing the final document
//!
//! This module handles:
//! - Assembling page content in navigation order, with an optional TOC
//! - Generating unique heading anchors
//! - Writing the document to disk
//! - Reporting the outcome of a run

mod anchors;
mod assembler;
pub mod report;
mod writer;

pub use anchors::{slugify, AnchorRegistry};
pub use assembler::{assemble, heading_level, AssembleOptions, TOC_HEADING};
pub use report::{format_report, print_report, FailedPage, ScrapeReport};
pub use writer::write_document;
