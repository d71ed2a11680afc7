//! Cache reset command.

use anyhow::Result;
use attest_core::cache::SummaryCacheRepository;
use attest_infrastructure::JsonDirSummaryCache;
use clap::Args;

#[derive(Args)]
pub struct ResetArgs {
    /// Identifier of the product whose cached report and answers to clear
    #[arg(long)]
    pub product_id: String,
}

pub async fn run(args: ResetArgs) -> Result<()> {
    let cache = JsonDirSummaryCache::new()?;
    cache.clear(&args.product_id).await?;
    println!("Cleared cached report and answers for {}.", args.product_id);
    Ok(())
}
