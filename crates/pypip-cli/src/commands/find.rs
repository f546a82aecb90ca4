use super::AppContext;
use crate::display::format_search_hits;
use anyhow::{Context, Result};
use clap::Args;
use pypip_info::PackageRegistry;
use tokio::runtime::Runtime;

#[derive(Args, Debug)]
pub struct FindArgs {
    /// Search terms
    pub query: String,

    /// Maximum number of results
    #[arg(short = 'n', long, default_value_t = 20)]
    pub limit: usize,
}

/// Search the registry and format the hits
pub async fn find_packages<R: PackageRegistry + ?Sized>(registry: &R, query: &str, limit: usize) -> Result<String> {
    let hits = registry
        .search(query, limit)
        .await
        .with_context(|| format!("Search for '{}' failed", query))?;
    Ok(format_search_hits(query, &hits))
}

pub fn handle_find_command(ctx: &AppContext, args: FindArgs) -> Result<()> {
    let registry = ctx.registry()?;
    let runtime = Runtime::new().context("Failed to create tokio runtime")?;

    let output = runtime.block_on(find_packages(&registry, &args.query, args.limit))?;
    print!("{}", output);
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use async_trait::async_trait;
    use pypip_info::{PackageInfo, PackageVersions, SearchHit};
    use std::collections::BTreeMap;

    /// Canned registry answers for one package
    pub(crate) struct FakeRegistry {
        pub info: Option<PackageInfo>,
        pub hits: Vec<SearchHit>,
    }

    pub(crate) fn package_info(name: &str) -> PackageInfo {
        PackageInfo {
            name: name.to_string(),
            version: "1.2.0".to_string(),
            summary: Some("A demo package".to_string()),
            description: Some("## Usage\n\nRun `demo`.".to_string()),
            description_content_type: Some("text/markdown".to_string()),
            license: None,
            requires_python: None,
            author: None,
            homepage: None,
            repository: None,
            project_urls: BTreeMap::new(),
            released_at: None,
            release_count: 3,
        }
    }

    #[async_trait]
    impl PackageRegistry for FakeRegistry {
        async fn query(&self, name: &str) -> pypip_info::Result<PackageVersions> {
            let info = self.fetch_pypi(name).await?;
            Ok(PackageVersions {
                name: info.name,
                versions: vec!["1.0.0".to_string(), "1.2.0".to_string()],
                summary: info.summary,
            })
        }

        async fn fetch_pypi(&self, name: &str) -> pypip_info::Result<PackageInfo> {
            self.info
                .clone()
                .filter(|info| info.name == name)
                .ok_or_else(|| pypip_info::Error::PackageNotFound(name.to_string(), "PyPI".to_string()))
        }

        async fn search(&self, _query: &str, limit: usize) -> pypip_info::Result<Vec<SearchHit>> {
            Ok(self.hits.iter().take(limit).cloned().collect())
        }
    }

    #[tokio::test]
    async fn test_find_packages_respects_limit() {
        colored::control::set_override(false);
        let hit = |name: &str| SearchHit {
            name: name.to_string(),
            version: "0.1.0".to_string(),
            description: String::new(),
            released_at: None,
        };
        let registry = FakeRegistry {
            info: None,
            hits: vec![hit("flask"), hit("flask-cors"), hit("flask-login")],
        };

        let output = find_packages(&registry, "flask", 2).await.unwrap();
        assert_eq!(output.lines().count(), 2);
        assert!(output.starts_with("flask "));
        assert!(!output.contains("flask-login"));
    }

    #[tokio::test]
    async fn test_find_packages_no_hits() {
        colored::control::set_override(false);
        let registry = FakeRegistry { info: None, hits: vec![] };
        let output = find_packages(&registry, "zzzz", 5).await.unwrap();
        assert_eq!(output, "No packages found for 'zzzz'\n");
    }
}
