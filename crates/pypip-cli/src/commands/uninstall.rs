use super::AppContext;
use crate::display::format_report;
use crate::installer::PipInstaller;
use anyhow::Result;
use clap::Args;
use pypip_deps::ProjectSync;

#[derive(Args, Debug)]
pub struct UninstallArgs {
    /// Packages to uninstall
    #[arg(value_name = "PACKAGES", required = true)]
    pub packages: Vec<String>,

    /// Optional dependency group to remove the packages from
    #[arg(short = 'g', long = "dependency-group", value_name = "GROUP")]
    pub group: Option<String>,

    /// Show what would change without running pip or writing files
    #[arg(long)]
    pub dry_run: bool,
}

pub fn handle_uninstall_command(ctx: &AppContext, args: UninstallArgs) -> Result<()> {
    let project = ctx.project()?;
    let section = ctx.section(args.group.as_deref())?;
    let options = ctx.sync_options(section, args.dry_run);

    tracing::info!(packages = args.packages.len(), section = %options.section, "uninstalling");

    let manifest_path = project.manifest_path();
    let sync = ProjectSync::new(project, PipInstaller::new());
    let report = sync.uninstall(&args.packages, &options)?;

    print!("{}", format_report(&report, &options.section, &manifest_path, args.dry_run));
    Ok(())
}
