//! This module handles conversion from iCal exports into [`NormalizedTask`](crate::task::NormalizedTask)s
//!
//! It is a thin layer over the `ical` crate: the crate does the tokenizing, this module does the validation and normalization

mod parser;
pub use parser::parse;
pub use parser::IcalParseResult;
pub use parser::MAX_ICAL_SIZE;
