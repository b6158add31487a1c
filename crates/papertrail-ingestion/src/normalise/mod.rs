//! Record normalisation.
//!
//! - `identity`: canonical locator used as the dedup key
//! - `text`: HTML stripping, whitespace cleanup, author splitting
//! - `dates`: flexible publication date parsing

pub mod dates;
pub mod identity;
pub mod text;

pub use dates::{find_date_in_text, parse_date};
pub use identity::{canonical_identity, resolve_link, IdentityError};
pub use text::{clean_abstract, clean_text, split_authors, strip_html};
