// SPDX-License-Identifier: MIT

//! Helpers shared by the integration tests of the binextractor crates.
pub mod cmdline;
pub mod fixtures;
