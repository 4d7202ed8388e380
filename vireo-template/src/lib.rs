pub mod bind;
pub mod compile;
pub mod error;
pub mod source;
pub mod template_parse;

pub use bind::{bind, interpolate, placeholders, resolve_path};
pub use compile::compile;
pub use error::{BindError, CompileError, ParseError};
pub use source::{SourceKind, SourceNode};
pub use template_parse::{parse_root, parse_template};
