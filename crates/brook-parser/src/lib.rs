#![doc = include_str!("../README.md")]

pub mod chars;
mod dtd;
mod error;
mod event;
mod lexer;
mod limit;
mod normalize;
mod parser;
#[cfg(test)]
mod tests;

pub use crate::dtd::{
    AttDef, AttType, ContentParticle, ContentSpec, DefaultDecl, Dtd, EntityDecl, EntityDef,
    ExternalId, IntSubset, Quantifier,
};
pub use crate::error::Error;
pub use crate::event::Production;
pub use crate::limit::LimitTracker;
pub use crate::parser::{parse_dtd, EntityResolver, Parser, UnknownEncodingHandler};

pub use brook_encoding::{Decode, Encoding};

/// Split a name at its first `:` into `(prefix, local)`.
///
/// This is the only namespace awareness the parser offers; prefix
/// resolution belongs to the consumer.
///
/// ```rust
/// assert_eq!(brook_parser::split_name("svg:rect"), ("svg", "rect"));
/// assert_eq!(brook_parser::split_name("rect"), ("", "rect"));
/// assert_eq!(brook_parser::split_name("a:b:c"), ("a", "b:c"));
/// ```
pub fn split_name(name: &str) -> (&str, &str) {
    match name.split_once(':') {
        Some((prefix, local)) => (prefix, local),
        None => ("", name),
    }
}
