pub mod expr_parser;
pub mod line_parser;

pub use expr_parser::{Expr, ExprError, parse_expr};
pub use line_parser::{LineError, is_blank_or_comment, split_words};
