use std::sync::Arc;
use std::thread;

use anyhow::{Context as _, Result};
use tether_engine::context::{ContextInit, ContextRuntime, HeadlessPlatform, PeerInfo};

/// Walks a shared context pair through a cross-thread deferred destroy on
/// the headless backend and logs each step.
pub fn run() -> Result<()> {
    let platform = Arc::new(HeadlessPlatform::new());
    let runtime = ContextRuntime::headless(platform.clone());
    let peer = PeerInfo::from_raw(1);

    let main = runtime
        .create_context_with(peer, None, ContextInit::labeled("main"))
        .context("failed to create main context")?;
    let loader = runtime
        .create_context_with(peer, Some(&main), ContextInit::labeled("loader"))
        .context("failed to create loader context")?;
    log::info!("library references: {}", runtime.library_refs());

    // The loader thread keeps its context current until told to let go.
    let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();
    let (ready_tx, ready_rx) = std::sync::mpsc::channel::<()>();
    let worker = {
        let runtime = runtime.clone();
        let loader = loader.clone();
        thread::spawn(move || -> Result<()> {
            loader.make_current()?;
            ready_tx.send(()).context("demo stopped waiting for the loader")?;
            release_rx.recv().context("release signal never arrived")?;
            runtime
                .release_current_context()
                .context("failed to release loader context")
        })
    };

    ready_rx.recv().context("loader thread exited early")?;
    loader.destroy().context("destroy request failed")?;
    log::info!(
        "{loader}: destroy requested while current on {:?}, pending = {}",
        loader.owner(),
        loader.is_destroy_pending()
    );

    release_tx.send(()).context("loader thread exited before release")?;
    worker
        .join()
        .map_err(|_| anyhow::anyhow!("loader thread panicked"))?
        .context("loader thread failed")?;
    log::info!("{loader}: destroyed = {}", loader.is_destroyed());

    main.make_current()?;
    main.set_swap_interval(1)?;
    runtime.swap_buffers()?;
    main.destroy()?;

    log::info!(
        "native calls: {:?}, library loaded = {}",
        platform.calls(),
        platform.library_loaded()
    );
    Ok(())
}
