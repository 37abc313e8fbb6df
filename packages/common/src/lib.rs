pub mod line_index;
pub mod span;

pub use line_index::*;
pub use span::*;
