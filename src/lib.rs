//! castscrape — castxml dump → typed C type AST.
//!
//! Runs the `castxml` C/C++ AST dumper over a header and resolves the flat,
//! id-referenced XML graph it emits into an in-memory, cycle-safe AST of C
//! type information: fundamental types, pointers, arrays, cv-qualified
//! types, structs/unions, enums, typedefs and function signatures.
//!
//! # Quick start
//!
//! Parse a header (requires a castxml binary on PATH):
//!
//! ```no_run
//! use std::path::Path;
//!
//! let ast = castscrape::parse_file(Path::new("library.h")).unwrap();
//! for &decl in &ast.roots {
//!     println!("{}", ast.types.describe(decl));
//! }
//! ```
//!
//! Or resolve an existing dump without invoking the tool:
//!
//! ```no_run
//! use std::path::Path;
//!
//! let ast = castscrape::parse_xml_file(Path::new("library.xml")).unwrap();
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

pub mod castxml;
pub mod config;
pub mod error;
pub mod extract;
pub mod model;
pub mod xml;

pub use castxml::{CastXml, Dump};
pub use config::Config;
pub use error::ParseError;
pub use extract::{Extractor, extract};
pub use model::{Ast, TypeArena, TypeId, TypeNode};
pub use xml::{Document, Element, ElementGraph, ElementId};

/// Run the full pipeline with default settings: dump `header` with castxml,
/// load the dump, and resolve it into an AST.
pub fn parse_file(header: &Path) -> Result<Ast> {
    parse_with(&Config::default(), header)
}

/// Run the full pipeline as described by `cfg`.
pub fn parse_with(cfg: &Config, header: &Path) -> Result<Ast> {
    let tool = cfg.castxml();
    let dump = tool.dump(header, None)?;

    if let Some(dir) = &cfg.save_xml {
        let saved = dump.save_in(dir)?;
        info!(path = %saved.path().display(), "saved intermediate dump");
    }

    let document = dump.to_document()?;
    let ast =
        extract(&document).with_context(|| format!("resolving {}", header.display()))?;

    info!(
        declarations = ast.roots.len(),
        nodes = ast.types.len(),
        "parsed header"
    );
    Ok(ast)
}

/// Resolve an existing castxml dump file.
pub fn parse_xml_file(path: &Path) -> Result<Ast> {
    let document =
        Document::from_file(path).with_context(|| format!("loading {}", path.display()))?;
    Ok(extract(&document)?)
}

/// Resolve castxml XML text.
pub fn parse_xml_str(xml: &str) -> Result<Ast, ParseError> {
    let document = Document::parse(xml)?;
    extract(&document)
}
