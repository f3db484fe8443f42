//! Integration test crate for OBS.
//!
//! This crate is `publish = false` and has no library code. The tests in
//! `tests/` drive the credential, storage and configuration crates together.

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
