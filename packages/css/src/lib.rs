pub mod ast;
pub mod error;
pub mod parser;
pub mod printer;
pub mod scan;
pub mod visit;

pub use ast::{Flavor, StyleTree};
pub use error::{ParseError, ParseResult};
pub use parser::parse;
