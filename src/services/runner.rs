//! Concurrent execution of a migration batch.

use std::path::Path;
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex, Semaphore};
use tracing::{error, info};

use crate::config::Settings;
use crate::models::{ItemStatus, MigrationItem};
use crate::services::migration::Migrator;
use crate::services::registry::StatusRegistry;

/// Upper bound on simultaneously open browsers.
const MAX_CONCURRENT: usize = 20;

/// Migrators parked after their run so the browser windows stay open
/// for manual review; they live until the server exits.
pub type ParkedMigrators = Arc<Mutex<Vec<Migrator>>>;

/// Detached batch run, as kicked off by the start endpoint.
pub fn spawn_batch(
    registry: StatusRegistry,
    settings: Settings,
    generation: u64,
    parked: ParkedMigrators,
) {
    tokio::spawn(run_batch(registry, settings, generation, parked));
}

/// Run every pending item of the given generation to completion.
pub async fn run_batch(
    registry: StatusRegistry,
    settings: Settings,
    generation: u64,
    parked: ParkedMigrators,
) {
    let items = registry.snapshot().await;
    let pending: Vec<usize> = items
        .iter()
        .enumerate()
        .filter(|(_, item)| item.status == ItemStatus::Pending)
        .map(|(idx, _)| idx)
        .collect();
    if pending.is_empty() {
        info!("No pending items to run");
        return;
    }

    let workers = pending.len().min(MAX_CONCURRENT);
    info!(
        "Running {} item(s) with {} worker(s)",
        pending.len(),
        workers
    );
    let semaphore = Arc::new(Semaphore::new(workers));

    let mut handles = Vec::new();
    for idx in pending {
        let registry = registry.clone();
        let settings = settings.clone();
        let parked = parked.clone();
        let semaphore = semaphore.clone();
        let item = items[idx].clone();
        let handle = tokio::spawn(async move {
            let Ok(_permit) = semaphore.acquire_owned().await else {
                return;
            };
            process_item(&registry, &settings, generation, idx, &item, &parked).await;
        });
        handles.push((idx, handle));
    }

    for (idx, handle) in handles {
        if let Err(e) = handle.await {
            error!("Worker for item {idx} crashed: {e}");
            registry
                .finish_error(generation, idx, &format!("Erro na execução: {e}"))
                .await;
        }
    }
    info!("Batch finished");
}

async fn process_item(
    registry: &StatusRegistry,
    settings: &Settings,
    generation: u64,
    idx: usize,
    item: &MigrationItem,
    parked: &ParkedMigrators,
) {
    if !registry.start_item(generation, idx).await {
        // Already claimed, or the batch was replaced underneath us.
        return;
    }
    info!("Item {idx}: migrating protocol {}", item.protocol);

    let folder = Path::new(&item.folder_path);
    let mut migrator = Migrator::new(settings.clone(), &item.protocol, Some(folder));

    let (tx, mut rx) = mpsc::unbounded_channel();
    let pump_registry = registry.clone();
    let pump = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            pump_registry.apply_event(generation, idx, &event).await;
        }
    });

    let result = migrator.run(&tx).await;
    drop(tx);
    let _ = pump.await;

    match result {
        Ok(_) => {
            registry
                .finish_ok(
                    generation,
                    idx,
                    "Migração concluída! Navegador aberto para verificação manual.",
                )
                .await;
        }
        Err(e) => {
            registry
                .finish_error(generation, idx, &format!("Erro: {e}"))
                .await;
        }
    }
    // Parked instead of dropped so the browser stays open for review.
    parked.lock().await.push(migrator);
}
