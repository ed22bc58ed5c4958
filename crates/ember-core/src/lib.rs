//! # ember-core
//! Foundation types, proof codec, and difficulty control for the Ember beacon.

pub mod codec;
pub mod constants;
pub mod crypto;
pub mod difficulty;
pub mod error;
pub mod types;
