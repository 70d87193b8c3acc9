//! Library half of the `vectorvista` binary, split out so the pieces can be
//! tested without a terminal.

pub mod clipboard;
pub mod context;
pub mod logging;
pub mod output;
pub mod shell;

pub use context::AppContext;
pub use logging::{init_tracing, init_tracing_with_config};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Runtime for the binary. Single-threaded: the shell blocks in
/// `readline` between commands and every command awaits its own calls.
pub fn runtime() -> std::io::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
}

#[cfg(test)]
mod tests {
    use tokio::runtime::RuntimeFlavor;

    #[test]
    fn runtime_is_single_threaded() {
        let rt = super::runtime().unwrap();
        assert_eq!(rt.handle().runtime_flavor(), RuntimeFlavor::CurrentThread);
    }
}
