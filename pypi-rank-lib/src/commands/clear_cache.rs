use super::Host;
use super::common::CommonArgs;
use crate::Result;
use clap::Args;
use std::io::Write;

#[derive(Args, Debug)]
pub struct ClearCacheArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

pub async fn clear_cache<H: Host>(host: &mut H, args: &ClearCacheArgs) -> Result<()> {
    let _ = args.common.init()?;
    let cache = args.common.open_cache().await?;
    cache.clear()?;

    let _ = writeln!(host.error(), "Cleared cache at '{}'", cache.dir().display());
    Ok(())
}
