//! mesh Client - Main Entry Point
//!
//! Loads the board page, connects the push stream and keeps the in-memory
//! board in sync, logging every applied update.

use anyhow::Context;
use mesh_board::{Board, BoardConfig, DropScan, PushStreamClient};
use mesh_dom::RectMap;
use mesh_net::ResourceLoader;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut config = BoardConfig::from_env();
    if let Some(base) = std::env::args().nth(1) {
        config.base_url = base;
    }

    tracing::info!("Starting mesh client for {}", config.base_url);
    smol::block_on(run(config))
}

async fn run(config: BoardConfig) -> anyhow::Result<()> {
    let loader = ResourceLoader::new()?;
    let response = loader
        .fetch(&config.base_url)
        .await
        .with_context(|| format!("loading {}", config.base_url))?;
    let html = String::from_utf8_lossy(&response.body);
    let document = mesh_html::parse_document(&html, &config.base_url);

    let mut board = Board::new(document, config.clone())?;
    board.connect()?;
    log_board(&board);

    let mut stream = PushStreamClient::http(&config)?;
    while let Some(report) = stream.next_update(&mut board).await {
        if report.is_empty() {
            continue;
        }
        tracing::info!(
            "Applied {:?}, missing {:?}, {} malformed",
            report.applied,
            report.missing,
            report.malformed
        );
        log_board(&board);
    }
    Ok(())
}

/// Log each container with its items, in order
fn log_board(board: &Board) {
    let config = board.config();
    let drag = board.drag();
    let tree = board.document().tree();
    let no_layout = RectMap::new();
    let mut scopes = vec![tree.root()];
    while let Some(scope) = scopes.pop() {
        for node in tree.descendants(scope) {
            if let Some(shadow) = tree.shadow_root(node) {
                scopes.push(shadow);
            }
            if tree.tag_name(node) != Some(config.container_selector.as_str()) {
                continue;
            }
            let scan = DropScan::scan(
                tree,
                node,
                drag.item_selector(),
                drag.dragging_class(),
                &no_layout,
                0.0,
            );
            let items: Vec<&str> = scan
                .items
                .iter()
                .filter_map(|&item| drag.item_id(tree, item))
                .collect();
            tracing::info!(
                "{} {}: {:?}",
                config.container_selector,
                tree.element_id(node).unwrap_or("?"),
                items
            );
        }
    }
}
