//! Structural recovery of oracle output
//!
//! `scanner` holds the string-aware lexical pieces; `recovery` runs them in
//! order and validates what comes out.

pub mod recovery;
pub mod scanner;

pub use recovery::{validate_element, ResponseRecoveryParser};
pub use scanner::DepthScanner;
