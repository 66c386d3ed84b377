//! # chorus-types
//!
//! Core type definitions for the chorus skill engine.
//!
//! This crate is the foundation of the dependency graph -- all other
//! chorus crates depend on it. It contains:
//!
//! - **[`error`]** -- [`ChorusError`] and [`CompileError`] error types
//! - **[`config`]** -- Configuration schema
//! - **[`locale`]** -- Normalized locale identifiers with fallback chains
//! - **[`skill`]** -- Skill metadata and device permissions

pub mod config;
pub mod error;
pub mod locale;
pub mod skill;

pub use error::{ChorusError, CompileError, Result};
pub use locale::Locale;
pub use skill::{Permission, SkillInfo};
