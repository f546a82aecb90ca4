use super::AppContext;
use crate::display::format_report;
use crate::installer::PipInstaller;
use anyhow::{bail, Context, Result};
use clap::Args;
use pypip_deps::{ProjectSync, RequirementsFile};
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct InstallArgs {
    /// Packages to install (`requests`, `click>=8`, `uvicorn[standard]`)
    #[arg(value_name = "PACKAGES")]
    pub packages: Vec<String>,

    /// Also install every package listed in a requirements file
    #[arg(short = 'r', long = "requirement", visible_alias = "requirements", value_name = "FILE")]
    pub requirement: Option<PathBuf>,

    /// Upgrade packages that are already installed
    #[arg(short = 'U', long)]
    pub upgrade: bool,

    /// Install in editable mode
    #[arg(short = 'e', long)]
    pub editable: bool,

    /// Optional dependency group to record the packages in
    #[arg(short = 'g', long = "dependency-group", value_name = "GROUP")]
    pub group: Option<String>,

    /// Show what would change without running pip or writing files
    #[arg(long)]
    pub dry_run: bool,
}

/// Collect package specs from the arguments and `-r`
pub fn collect_specs(args: &InstallArgs) -> Result<Vec<String>> {
    let mut specs = args.packages.clone();
    if let Some(path) = &args.requirement {
        let file = RequirementsFile::load(path)
            .with_context(|| format!("Failed to read requirements from {}", path.display()))?;
        specs.extend(file.package_specs());
    }

    if specs.is_empty() {
        bail!("Nothing to install: give package names or -r FILE");
    }
    Ok(specs)
}

pub fn handle_install_command(ctx: &AppContext, args: InstallArgs) -> Result<()> {
    let specs = collect_specs(&args)?;
    let project = ctx.project()?;
    let section = ctx.section(args.group.as_deref())?;

    let mut options = ctx.sync_options(section, args.dry_run);
    options.upgrade = args.upgrade;
    options.editable = args.editable;

    tracing::info!(packages = specs.len(), section = %options.section, "installing");

    let manifest_path = project.manifest_path();
    let sync = ProjectSync::new(project, PipInstaller::new());
    let report = sync.install(&specs, &options)?;

    print!("{}", format_report(&report, &options.section, &manifest_path, args.dry_run));
    Ok(())
}
