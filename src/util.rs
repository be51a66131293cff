//! Small standalone helpers that don't belong to any one module.

/// Initializes the `log` facade with `pretty_env_logger`, honoring `RUST_LOG`. Only the binary
/// should call this; library code only ever calls into the `log` macros.
pub fn init_logging() {
    let _ = pretty_env_logger::try_init();
}
