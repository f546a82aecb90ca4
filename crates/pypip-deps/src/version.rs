//! PEP 440 versions and version specifiers

use crate::{Error, Result};
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::sync::OnceLock;

fn version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?xi)^
            v?
            (?:(?P<epoch>[0-9]+)!)?
            (?P<release>[0-9]+(?:\.[0-9]+)*)
            (?:[-_.]?(?P<pre_l>alpha|beta|preview|pre|rc|a|b|c)[-_.]?(?P<pre_n>[0-9]+)?)?
            (?:-(?P<post_n1>[0-9]+)|[-_.]?(?P<post_l>post|rev|r)[-_.]?(?P<post_n2>[0-9]+)?)?
            (?:[-_.]?(?P<dev_l>dev)[-_.]?(?P<dev_n>[0-9]+)?)?
            (?:\+(?P<local>[a-z0-9]+(?:[-_.][a-z0-9]+)*))?
            $",
        )
        .expect("PEP 440 version pattern is valid")
    })
}

fn clause_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(?P<op>===|~=|==|!=|<=|>=|<|>)?\s*(?P<version>.*)$")
            .expect("specifier clause pattern is valid")
    })
}

/// Pre-release phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PreRelease {
    /// Alpha (`a`, `alpha`)
    Alpha,
    /// Beta (`b`, `beta`)
    Beta,
    /// Release candidate (`rc`, `c`, `pre`, `preview`)
    Rc,
}

impl PreRelease {
    fn from_label(label: &str) -> Self {
        match label.to_ascii_lowercase().as_str() {
            "a" | "alpha" => Self::Alpha,
            "b" | "beta" => Self::Beta,
            _ => Self::Rc,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Alpha => "a",
            Self::Beta => "b",
            Self::Rc => "rc",
        }
    }
}

/// A parsed PEP 440 version (e.g. `1.0`, `2!1.2.3rc1.post2.dev0+local`)
#[derive(Debug, Clone)]
pub struct PyVersion {
    /// Version epoch (`N!`), 0 when absent
    pub epoch: u64,
    /// Release segments (`1.2.3` -> `[1, 2, 3]`)
    pub release: Vec<u64>,
    /// Pre-release phase and number
    pub pre: Option<(PreRelease, u64)>,
    /// Post-release number
    pub post: Option<u64>,
    /// Development release number
    pub dev: Option<u64>,
    /// Local version label, normalized to lowercase with `.` separators
    pub local: Option<String>,
}

fn parse_number(raw: Option<regex::Match<'_>>, input: &str) -> Result<u64> {
    match raw {
        Some(m) => m
            .as_str()
            .parse()
            .map_err(|e| Error::InvalidVersionSpecifier(input.to_string(), format!("{}", e))),
        None => Ok(0),
    }
}

impl PyVersion {
    /// Parse a version string
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let caps = version_regex().captures(trimmed).ok_or_else(|| {
            Error::InvalidVersionSpecifier(input.to_string(), "not a PEP 440 version".to_string())
        })?;

        let epoch = parse_number(caps.name("epoch"), input)?;
        let release = caps["release"]
            .split('.')
            .map(|seg| {
                seg.parse::<u64>()
                    .map_err(|e| Error::InvalidVersionSpecifier(input.to_string(), e.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        let pre = match caps.name("pre_l") {
            Some(label) => Some((
                PreRelease::from_label(label.as_str()),
                parse_number(caps.name("pre_n"), input)?,
            )),
            None => None,
        };

        let post = if caps.name("post_n1").is_some() {
            Some(parse_number(caps.name("post_n1"), input)?)
        } else if caps.name("post_l").is_some() {
            Some(parse_number(caps.name("post_n2"), input)?)
        } else {
            None
        };

        let dev = match caps.name("dev_l") {
            Some(_) => Some(parse_number(caps.name("dev_n"), input)?),
            None => None,
        };

        let local = caps
            .name("local")
            .map(|m| m.as_str().to_ascii_lowercase().replace(['-', '_'], "."));

        Ok(Self {
            epoch,
            release,
            pre,
            post,
            dev,
            local,
        })
    }

    /// True for alpha, beta, rc and dev releases
    pub fn is_prerelease(&self) -> bool {
        self.pre.is_some() || self.dev.is_some()
    }

    /// True for plain releases: no pre, post, dev or local part
    pub fn is_final_release(&self) -> bool {
        self.pre.is_none() && self.post.is_none() && self.dev.is_none() && self.local.is_none()
    }

    fn release_cmp(&self, other: &Self) -> Ordering {
        let len = self.release.len().max(other.release.len());
        (0..len)
            .map(|i| {
                let a = self.release.get(i).copied().unwrap_or(0);
                let b = other.release.get(i).copied().unwrap_or(0);
                a.cmp(&b)
            })
            .find(|o| *o != Ordering::Equal)
            .unwrap_or(Ordering::Equal)
    }

    // A dev release of a final version sorts before its pre-releases.
    fn pre_key(&self) -> (i8, u64) {
        match (self.pre, self.post, self.dev) {
            (None, None, Some(_)) => (-1, 0),
            (None, _, _) => (3, 0),
            (Some((phase, n)), _, _) => (phase as i8, n),
        }
    }

    fn dev_key(&self) -> (u8, u64) {
        match self.dev {
            Some(n) => (0, n),
            None => (1, 0),
        }
    }
}

impl PartialEq for PyVersion {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PyVersion {}

impl PartialOrd for PyVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PyVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        self.epoch
            .cmp(&other.epoch)
            .then_with(|| self.release_cmp(other))
            .then_with(|| self.pre_key().cmp(&other.pre_key()))
            .then_with(|| self.post.cmp(&other.post))
            .then_with(|| self.dev_key().cmp(&other.dev_key()))
            .then_with(|| self.local.cmp(&other.local))
    }
}

impl fmt::Display for PyVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.epoch != 0 {
            write!(f, "{}!", self.epoch)?;
        }
        let release: Vec<String> = self.release.iter().map(u64::to_string).collect();
        write!(f, "{}", release.join("."))?;
        if let Some((phase, n)) = self.pre {
            write!(f, "{}{}", phase.as_str(), n)?;
        }
        if let Some(n) = self.post {
            write!(f, ".post{}", n)?;
        }
        if let Some(n) = self.dev {
            write!(f, ".dev{}", n)?;
        }
        if let Some(local) = &self.local {
            write!(f, "+{}", local)?;
        }
        Ok(())
    }
}

/// Comparison operator of a specifier clause
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `===`
    ArbitraryEqual,
    /// `~=`
    Compatible,
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `<=`
    LessEqual,
    /// `>=`
    GreaterEqual,
    /// `<`
    Less,
    /// `>`
    Greater,
}

impl Operator {
    fn parse(op: &str) -> Option<Self> {
        Some(match op {
            "===" => Self::ArbitraryEqual,
            "~=" => Self::Compatible,
            "==" => Self::Equal,
            "!=" => Self::NotEqual,
            "<=" => Self::LessEqual,
            ">=" => Self::GreaterEqual,
            "<" => Self::Less,
            ">" => Self::Greater,
            _ => return None,
        })
    }

    /// The operator as written in a specifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ArbitraryEqual => "===",
            Self::Compatible => "~=",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::LessEqual => "<=",
            Self::GreaterEqual => ">=",
            Self::Less => "<",
            Self::Greater => ">",
        }
    }
}

/// One clause of a specifier set, e.g. `>=2.0`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionSpecifier {
    /// Comparison operator
    pub operator: Operator,
    /// Version text as given (may end in `.*` for `==`/`!=`)
    pub version: String,
}

impl VersionSpecifier {
    /// Parse a single clause. A bare version is read as `==version`.
    pub fn parse(clause: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidVersionSpecifier(clause.to_string(), reason.to_string());

        let trimmed = clause.trim();
        if trimmed.is_empty() {
            return Err(invalid("empty specifier"));
        }

        let caps = clause_regex()
            .captures(trimmed)
            .ok_or_else(|| invalid("unrecognized specifier"))?;
        let operator = match caps.name("op") {
            Some(op) => Operator::parse(op.as_str()).ok_or_else(|| invalid("unknown operator"))?,
            None => Operator::Equal,
        };
        let version = caps["version"].trim();
        if version.is_empty() {
            return Err(invalid("missing version"));
        }
        if version.chars().any(char::is_whitespace) {
            return Err(invalid("unexpected whitespace in version"));
        }

        if operator == Operator::ArbitraryEqual {
            return Ok(Self {
                operator,
                version: version.to_string(),
            });
        }

        if let Some(prefix) = version.strip_suffix(".*") {
            if !matches!(operator, Operator::Equal | Operator::NotEqual) {
                return Err(invalid("wildcards are only allowed with == and !="));
            }
            let parsed = PyVersion::parse(prefix).map_err(|_| invalid("not a PEP 440 version"))?;
            if parsed.local.is_some() {
                return Err(invalid("local versions cannot use wildcards"));
            }
        } else {
            let parsed = PyVersion::parse(version).map_err(|_| invalid("not a PEP 440 version"))?;
            if parsed.local.is_some() && !matches!(operator, Operator::Equal | Operator::NotEqual) {
                return Err(invalid("local versions are only allowed with == and !="));
            }
            if operator == Operator::Compatible && parsed.release.len() < 2 {
                return Err(invalid("~= requires at least two release segments"));
            }
        }

        Ok(Self {
            operator,
            version: version.to_string(),
        })
    }
}

impl fmt::Display for VersionSpecifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.operator.as_str(), self.version)
    }
}

/// A comma separated set of specifier clauses, e.g. `>=2.0,<3`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionSpecifiers(Vec<VersionSpecifier>);

impl VersionSpecifiers {
    /// Parse a specifier set
    ///
    /// # Errors
    /// Returns `InvalidVersionSpecifier` naming the whole input if any clause is invalid
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Err(Error::InvalidVersionSpecifier(
                raw.to_string(),
                "empty specifier".to_string(),
            ));
        }
        let clauses = raw
            .split(',')
            .map(|clause| {
                VersionSpecifier::parse(clause).map_err(|e| match e {
                    Error::InvalidVersionSpecifier(_, reason) => {
                        Error::InvalidVersionSpecifier(raw.to_string(), reason)
                    }
                    other => other,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self(clauses))
    }

    /// The individual clauses
    pub fn clauses(&self) -> &[VersionSpecifier] {
        &self.0
    }
}

impl fmt::Display for VersionSpecifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let clauses: Vec<String> = self.0.iter().map(ToString::to_string).collect();
        write!(f, "{}", clauses.join(","))
    }
}

/// Pick the highest final release from a list of version strings
///
/// Unparseable strings are skipped, pre/post/dev releases ignored.
pub fn latest_final<'a, I>(versions: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    versions
        .into_iter()
        .filter_map(|raw| PyVersion::parse(raw).ok().map(|v| (v, raw)))
        .filter(|(v, _)| v.is_final_release())
        .max_by(|(a, _), (b, _)| a.cmp(b))
        .map(|(_, raw)| raw)
}

/// Sort version strings in ascending PEP 440 order, dropping unparseable ones
pub fn sort_versions(versions: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut parsed: Vec<(PyVersion, String)> = versions
        .into_iter()
        .filter_map(|raw| PyVersion::parse(&raw).ok().map(|v| (v, raw)))
        .collect();
    parsed.sort_by(|(a, _), (b, _)| a.cmp(b));
    parsed.into_iter().map(|(_, raw)| raw).collect()
}
