// crates/rfc-bridge-cli/src/lib.rs
// ============================================================================
// Module: RFC Bridge CLI Library
// Description: Shared helpers for the rfc-bridge command-line interface.
// Purpose: Keep settings resolution and operator messages testable.
// Dependencies: rfc-bridge-config, rfc-bridge-core
// ============================================================================

//! ## Overview
//! This library houses the pieces of the `rfc-bridge` binary that do not
//! need a runtime: layering file, environment, and command-line connection
//! settings, and rendering the startup and `config check` lines. The binary
//! entry point (`src/main.rs`) imports these helpers.

// ============================================================================
// SECTION: Modules
// ============================================================================

/// Settings resolution and operator-facing summaries.
pub mod startup;
