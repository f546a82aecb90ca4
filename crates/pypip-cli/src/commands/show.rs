use super::AppContext;
use crate::display::format_section;
use anyhow::Result;
use clap::Args;
use colored::*;
use pypip_deps::{ManifestDocument, ManifestSection};

#[derive(Args, Debug, Default)]
pub struct ShowArgs {
    /// Optional dependency group to list
    #[arg(short = 'g', long = "dependency-group", value_name = "GROUP")]
    pub group: Option<String>,

    /// List every dependency section in the project
    #[arg(long, conflicts_with = "group")]
    pub all: bool,
}

/// Text for `pypip show`
pub fn render_show(ctx: &AppContext, doc: &ManifestDocument, args: &ShowArgs) -> Result<String> {
    let mut out = String::new();
    if let Some(name) = doc.project_name() {
        out.push_str(&format!("{}\n\n", name.bold()));
    }

    if args.all {
        let sections = doc.sections()?;
        if sections.is_empty() {
            out.push_str("No dependency sections\n");
        }
        for (i, section) in sections.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&format_section(section));
        }
        return Ok(out);
    }

    let key = ctx.section(args.group.as_deref())?;
    doc.ensure_available(&key)?;
    let entries = doc.section(&key)?.unwrap_or_default();
    out.push_str(&format_section(&ManifestSection { key, entries }));
    Ok(out)
}

pub fn handle_show_command(ctx: &AppContext, args: ShowArgs) -> Result<()> {
    let project = ctx.project()?;
    let doc = project.load_manifest()?;
    print!("{}", render_show(ctx, &doc, &args)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pypip_config::Settings;

    const MANIFEST: &str = r#"[project]
name = "demo"
dependencies = ["requests>=2.0"]

[project.optional-dependencies]
dev = ["pytest", "ruff"]

[tool.hatch.envs.lint]
dependencies = ["mypy"]
"#;

    fn ctx(hatch_env: Option<&str>) -> AppContext {
        AppContext::new(Settings::default(), None, hatch_env.map(str::to_string))
    }

    #[test]
    fn test_show_default_section() {
        colored::control::set_override(false);
        let doc = ManifestDocument::parse(MANIFEST).unwrap();
        let text = render_show(&ctx(None), &doc, &ShowArgs::default()).unwrap();
        assert_eq!(text, "demo\n\ndependencies:\n  requests>=2.0\n");
    }

    #[test]
    fn test_show_group_and_hatch_env() {
        colored::control::set_override(false);
        let doc = ManifestDocument::parse(MANIFEST).unwrap();

        let args = ShowArgs {
            group: Some("dev".to_string()),
            all: false,
        };
        let text = render_show(&ctx(None), &doc, &args).unwrap();
        assert!(text.ends_with("optional-dependencies.dev:\n  pytest\n  ruff\n"));

        let text = render_show(&ctx(Some("lint")), &doc, &ShowArgs::default()).unwrap();
        assert!(text.ends_with("hatch.lint:\n  mypy\n"));

        let args = ShowArgs {
            group: Some("docs".to_string()),
            all: false,
        };
        let text = render_show(&ctx(None), &doc, &args).unwrap();
        assert!(text.ends_with("optional-dependencies.docs:\n  (none)\n"));
    }

    #[test]
    fn test_show_all() {
        colored::control::set_override(false);
        let doc = ManifestDocument::parse(MANIFEST).unwrap();
        let args = ShowArgs { group: None, all: true };
        let text = render_show(&ctx(None), &doc, &args).unwrap();
        assert!(text.contains("dependencies:\n  requests>=2.0\n\noptional-dependencies.dev:"));
        assert!(text.contains("hatch.lint:\n  mypy\n"));
    }

    #[test]
    fn test_show_hatch_env_without_hatch() {
        let doc = ManifestDocument::parse("[project]\nname = \"demo\"\ndependencies = []\n").unwrap();
        assert!(render_show(&ctx(Some("test")), &doc, &ShowArgs::default()).is_err());
    }
}
