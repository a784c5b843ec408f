//! Field documentation inference: code lists, value domains, catalogs.

mod catalog;
mod codelist;
mod enumeration;

pub use catalog::FieldCatalogBuilder;
pub use codelist::{CodeListExtractor, CodeLists, parse_code_table_name};
pub use enumeration::EnumerationPolicy;
