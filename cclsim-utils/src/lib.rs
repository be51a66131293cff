//! Small shared helpers used by the `cclsim` crate.

pub mod serde;
