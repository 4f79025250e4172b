use crate::context::AppContext;
use crate::scoring::MAX_SCORE;
use crate::snapshot::Snapshot;
use anyhow::Result;
use log::info;
use std::path::PathBuf;

pub async fn run(app: &AppContext, input: Option<PathBuf>, top: usize) -> Result<Snapshot> {
    let path = input.unwrap_or_else(|| app.settings().output_path.clone());
    let snapshot = Snapshot::load_from_file(&path)?;
    info!(
        "{} updated {}: {} stocks across {} markets",
        path.display(),
        snapshot.updated,
        snapshot.total_stocks(),
        snapshot.markets.len()
    );

    for (id, market) in snapshot.markets.iter() {
        println!("\n{} [{}] - {} stocks", market.name, id, market.stocks.len());
        for (rank, stock) in market.stocks.iter().take(top).enumerate() {
            println!(
                "  {:>3}. {:<10} {:>3}/{}  {:>12.2} {:<3}  {}",
                rank + 1,
                stock.symbol,
                stock.score,
                MAX_SCORE,
                stock.price,
                stock.currency,
                stock.name
            );
        }
    }

    Ok(snapshot)
}
