use std::io;

use tokio::runtime::{Builder, Runtime};

/// Build the multi-threaded runtime that backs an FFI-facing object.
///
/// Foreign callers invoke us from their UI thread, which never polls a Rust
/// future, so the runtime needs its own worker to make progress. A single
/// worker is plenty: the only work is waiting on native callbacks.
pub fn build(thread_name: &str) -> io::Result<Runtime> {
    Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name(thread_name)
        .enable_time()
        .build()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn runs_futures_without_an_outer_runtime() {
        let rt = build("bioauth-test").unwrap();
        let name = rt.block_on(async {
            tokio::spawn(async {
                std::thread::current().name().map(str::to_owned)
            })
            .await
            .unwrap()
        });
        assert_eq!(name.as_deref(), Some("bioauth-test"));
    }
}
