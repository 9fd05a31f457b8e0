//! Conversion of expense amounts into the company currency.
//!
//! Exchange rates come from an external reference service; this module only
//! applies a rate that has already been supplied.

pub mod conversion;

pub use conversion::{convert_amount, to_company_currency};
