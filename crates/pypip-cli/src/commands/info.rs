use super::AppContext;
use crate::display::format_package_info;
use anyhow::{Context, Result};
use clap::Args;
use pypip_info::PackageRegistry;
use tokio::runtime::Runtime;

#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Package name
    pub package: String,

    /// Include the full project description
    #[arg(short = 'v', long)]
    pub verbose: bool,
}

/// Fetch package metadata and format it
pub async fn package_info<R: PackageRegistry + ?Sized>(registry: &R, name: &str, verbose: bool) -> Result<String> {
    let info = registry
        .fetch_pypi(name)
        .await
        .with_context(|| format!("Failed to fetch package info for '{}'", name))?;
    Ok(format_package_info(&info, verbose))
}

pub fn handle_info_command(ctx: &AppContext, args: InfoArgs) -> Result<()> {
    let registry = ctx.registry()?;
    let runtime = Runtime::new().context("Failed to create tokio runtime")?;

    let output = runtime.block_on(package_info(&registry, &args.package, args.verbose))?;
    print!("{}", output);
    Ok(())
}
