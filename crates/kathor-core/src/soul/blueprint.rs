//! The built-in persona blueprint.

/// Persona used when `[soul].persona_path` is not set.
pub const DEFAULT_PERSONA: &str = include_str!("../../persona/kathor.md");
