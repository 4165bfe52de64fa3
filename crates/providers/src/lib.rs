//! Oracle provider implementations for IronLoop.
//!
//! All providers implement the `ironloop_core::Provider` trait.
//! `build_from_config` selects and builds the configured one.

pub mod factory;
pub mod openai_compat;

pub use factory::{ConfiguredProvider, build_from_config};
pub use openai_compat::OpenAiCompatProvider;
