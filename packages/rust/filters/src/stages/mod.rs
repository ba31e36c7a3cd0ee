//! Built-in filter stages.
//!
//! Every built-in stage is line oriented and streams through
//! [`LineFilter`](crate::line::LineFilter), so memory use is bounded by the
//! longest line rather than the file size.

mod prefix_lines;
mod replace_regexp;
mod replace_tokens;
mod tab_to_spaces;

pub use prefix_lines::PrefixLines;
pub use replace_regexp::ReplaceRegexp;
pub use replace_tokens::ReplaceTokens;
pub use tab_to_spaces::TabToSpaces;
