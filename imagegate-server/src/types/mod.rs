//! API types for imagegate.
//!
//! `images` holds the public request/response bodies, `replicate` the
//! provider's prediction objects.

pub mod images;
pub mod replicate;
