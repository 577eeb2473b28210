// ABOUTME: Deployment state marker types for the type state pattern.
// ABOUTME: Zero-sized types enforce valid stage ordering at compile time.

/// Initial state: webhook accepted, nothing persisted yet.
/// Available actions: `acquire_lock()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Received;

/// Lock held, In-Progress record persisted.
/// Available actions: `update_sources()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Locked;

/// Working copy up to date.
/// Available actions: `resolve_config()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Updated;

/// Deployment config resolved.
/// Available actions: `execute()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Configured;

/// Compose run finished (or skipped for pull deployments).
/// Available actions: `verify()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Executed;

/// Healthchecks passed. Terminal; hand off to the finalizer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Verified;
