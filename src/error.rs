//! Error types for dump resolution.

use thiserror::Error;

/// Errors produced while resolving a castxml dump into the type AST.
///
/// None of these are recovered internally and there is no retry: a failure
/// while resolving any element aborts the whole parse.
#[derive(Debug, Error)]
#[must_use = "errors must not be silently ignored"]
pub enum ParseError {
    /// An element tag has no dispatcher entry.
    #[error("unsupported element [{tag}]")]
    UnsupportedNode { tag: String },

    /// A reference attribute names an element that is not in the document.
    #[error("element with id \"{id}\" could not be found")]
    MissingReference { id: String },

    /// An ellipsis marker appeared before any positional argument.
    #[error("ellipsis cannot be the first entry of an argument list")]
    MalformedSignature,

    /// The document root does not look like castxml output.
    #[error("document root is <{root}>, expected <CastXML>")]
    InvalidInput { root: String },

    /// The input is not well-formed XML.
    #[error("malformed xml: {0}")]
    Xml(#[from] roxmltree::Error),

    /// Reading the dump file failed.
    #[error("failed to read dump: {0}")]
    Io(#[from] std::io::Error),
}
