pub mod ast;
pub mod error;
pub mod parser;
pub mod printer;
pub mod tokenizer;
pub mod value;
pub mod visitor;

pub use ast::MarkupTree;
pub use error::{ParseError, ParseResult};
pub use parser::{parse, parse_snippet};
pub use printer::Serializer;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_print_round_trip() {
        let source = "const App = () => <div className=\"a\" />;\n";
        let tree = parse(source).unwrap();
        assert_eq!(tree.print(), source);
    }
}
