//! Schema Layer — declarative validators for every boundary structure.
//!
//! See [`issue`] for the shared `Validate`/`parse`/`safe_parse` machinery
//! every other module in this file implements against.

pub mod canvas;
pub mod intent;
pub mod issue;
pub mod qa_profile;
pub mod requests;
pub mod suggestion;
pub mod ticket;

pub use issue::{safe_parse, safe_parse_value, Issue, IssueCode, Validate, ValidationError};
