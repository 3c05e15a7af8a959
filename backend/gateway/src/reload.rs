//! Template hot-reload.
//!
//! Watches both template files and swaps the published snapshot when either
//! changes. A reload that fails to parse keeps the previous snapshot; the
//! proxy never serves a half-loaded template.

use std::sync::Arc;

use anyhow::Result;
use notify::{RecursiveMode, Watcher};
use promptgate_template::TemplateStore;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Watch the store's template files and reload on modification. The watcher
/// lives for the process lifetime inside the spawned task.
pub fn spawn_template_watcher(store: Arc<TemplateStore>) -> Result<()> {
    let (tx, mut rx) = mpsc::channel(16);

    let mut watcher = notify::recommended_watcher(move |res| {
        if let Err(e) = tx.blocking_send(res) {
            error!("Failed to send template file event: {:?}", e);
        }
    })?;

    for path in store.watched_paths() {
        watcher.watch(path, RecursiveMode::NonRecursive)?;
        info!("Watching template file for changes: {:?}", path);
    }

    tokio::spawn(async move {
        // keep watcher alive
        let _w = watcher;
        while let Some(res) = rx.recv().await {
            match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        info!("Template file changed; reloading");
                        if let Err(e) = store.reload().await {
                            warn!(error = %e, "Template reload failed; keeping previous snapshot");
                        }
                    }
                }
                Err(e) => warn!("Template watch error: {:?}", e),
            }
        }
    });

    Ok(())
}
