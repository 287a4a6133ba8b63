//! LLM provider client for docsmith.
//!
//! The single supported upstream protocol is an OpenAI-compatible
//! chat-completions endpoint; [`OpenAiCompatProvider`] implements the
//! `docsmith_core::Provider` trait against it.

pub mod openai_compat;

pub use openai_compat::OpenAiCompatProvider;
