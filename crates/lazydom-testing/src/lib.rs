//! Testing utilities and harness for lazydom

pub mod test_rule;

pub use test_rule::*;
