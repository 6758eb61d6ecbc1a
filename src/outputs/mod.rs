//! Report generation.
//!
//! - [`csv`]: writes the classified articles as a UTF-8 CSV file, one row per
//!   article in calendar order

pub mod csv;
