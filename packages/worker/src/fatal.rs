//! Process-wide panic handling for the relay binaries.

use std::panic::{self, PanicHookInfo};

/// Exit status of a process taken down by a panic.
pub const PANIC_EXIT_CODE: i32 = 1;

pub type PanicHook = Box<dyn Fn(&PanicHookInfo<'_>) + Send + Sync + 'static>;

/// Build a hook that logs the panic and hands the exit status to `exit`.
pub fn panic_hook<F>(exit: F) -> PanicHook
where
    F: Fn(i32) + Send + Sync + 'static,
{
    Box::new(move |info| {
        tracing::error!("Unhandled panic: {}", info);
        exit(PANIC_EXIT_CODE);
    })
}

/// Log any panic, then exit the process.
pub fn install_panic_hook() {
    panic::set_hook(panic_hook(|code| std::process::exit(code)));
}
