//! Integration test crate for StabKit.
//!
//! This crate exists solely to hold cross-crate integration tests.
//! It depends on the other stabkit crates to verify they work together.

#[cfg(test)]
mod stabilizer;

#[cfg(test)]
mod tracking;
