//! Core module - Request key normalization and common utilities
//!
//! This module provides:
//! - Site-relative key derivation for intercepted request URLs
//! - Hashing and timestamp helpers shared by the disk store

pub mod paths;
pub mod util;
