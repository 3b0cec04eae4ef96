//! Getting text in and reports out.
//!
//! [`ingest`] turns files into [`Document`](rw_domain::report::Document)s,
//! rejecting unsupported or oversized files before reading them.
//! [`export`] turns markdown-like report text into a block model and
//! hands it to a [`DocumentEncoder`](export::DocumentEncoder).

pub mod export;
pub mod ingest;

pub use export::{parse_blocks, Block, DocumentEncoder, ExportedFile, HtmlEncoder, Span};
pub use ingest::{DocumentLoader, IngestFailure, IngestOutcome, TextExtractor};
