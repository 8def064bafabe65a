pub mod config;
pub mod debounce;
pub mod state;
pub mod workspace;

pub use config::EngineConfig;
pub use state::WorkspaceState;
pub use workspace::Workspace;

/// Initializes logging for a component. Delegates to the core logging module.
pub fn init_logging(component: &str, to_stderr: bool) -> impl Drop {
    phpscope_core::logging::init_logging(component, to_stderr)
}
