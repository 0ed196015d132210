//! Tracing/logging setup shared by the console binaries.

/// Initialize process-wide logging.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(tracing::Format::Json);
}

/// Initialize human-readable logging (interactive terminals).
pub fn init_pretty() {
    tracing::init(tracing::Format::Pretty);
}

/// Tracing configuration (filters, layers).
pub mod tracing;
