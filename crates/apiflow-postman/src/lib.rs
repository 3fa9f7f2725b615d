//! apiflow-postman: Legacy Postman collection output
//!
//! Takes the scenarios built by apiflow-core and packages them into the
//! classic collection envelope, rendering assertion descriptors into the
//! old `tests[...]` script dialect along the way.

pub mod assemble;
pub mod collection;
pub mod scripts;

pub use assemble::Assembler;
pub use collection::{Collection, Folder, HeaderEntry, QueryEntry, Request, generate_schema};
pub use scripts::ScriptRenderer;
