//! # docpipe
//!
//! A toolchain driver for AsciiDoc: converts AsciiDoc text documents to
//! HTML, EPUB, PDF, man pages and other formats by chaining external
//! document-processing tools (`asciidoc`, `xsltproc`, `dblatex`, `fop`,
//! `w3m`, `lynx`, `xmllint`, `epubcheck`).
//!
//! docpipe contains no markup parsing, layout or rendering logic of its
//! own. Its job is option validation, pipeline dispatch, resource
//! bookkeeping (copying the images and stylesheets referenced by the
//! generated output), and EPUB archive assembly.
//!
//! ## Quick start
//!
//! ```no_run
//! use clap::Parser;
//! use docpipe::{Cli, Config};
//!
//! let cli = Cli::parse_from(["docpipe", "-f", "xhtml", "doc.txt"]);
//! let config = Config::new(&cli)?;
//! let artifact = docpipe::run(&config)?;
//! # Ok::<(), docpipe::Error>(())
//! ```

pub mod config;
pub mod epub;
pub mod error;
pub mod pipeline;
pub mod resources;
pub mod scan;
pub mod shell;

pub use config::{Cli, Config, Doctype, Format};
pub use error::{Error, Result};
pub use pipeline::run;
