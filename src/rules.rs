//! Substitution rules and the three pass families.
//!
//! A [`Rule`] is a regular expression plus a replacement, applied to every
//! non-overlapping match in a document. A [`RuleSet`] is the ordered list of
//! rules for one [`PassFamily`]; later rules see the output of earlier ones.
//!
//! ## Pass Families
//!
//! | Family | Rules (in order) |
//! |--------|------------------|
//! | [`PassFamily::Links`] | `href="x/index.html"` → `href="x/"`, then `href="x.html"` → `href="x"` |
//! | [`PassFamily::Paths`] | local `css/`/`js/` under configured dirs → `/<dir>/css/…`, then `(../)*css/` → `/css/`, `(../)*js/` → `/js/` |
//! | [`PassFamily::TrailingSlashes`] | `href="/dir"` → `href="/dir/"` unless it ends in `/` or a reserved extension |
//!
//! ## Limitations
//!
//! Rules operate on raw markup, not on a parsed document. They can match inside
//! comments or inline scripts, any attribute whose name ends in `href`/`src`
//! (e.g. `data-href`), and they treat `#fragment` and `?query` suffixes as part
//! of the value. Values containing an escaped quote are cut at the quote.
//!
//! The `regex` crate has no look-behind, so the trailing-slash guard is a
//! predicate on the captured value rather than part of the pattern.

use crate::config::RewriteConfig;
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::fmt;

/// One of the independent rule sets, applied in its own traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PassFamily {
    /// Strip `index.html` and `.html` suffixes from `href` values.
    Links,
    /// Rewrite relative `css/` and `js/` asset references to absolute paths.
    Paths,
    /// Append `/` to absolute directory-like `href` values.
    TrailingSlashes,
}

impl PassFamily {
    /// All families in the order a combined run applies them.
    pub const ALL: [PassFamily; 3] = [
        PassFamily::Links,
        PassFamily::Paths,
        PassFamily::TrailingSlashes,
    ];

    /// What the family fixes, as used in per-file report lines.
    pub fn subject(self) -> &'static str {
        match self {
            PassFamily::Links => "links",
            PassFamily::Paths => "paths",
            PassFamily::TrailingSlashes => "trailing slashes",
        }
    }

    /// Line printed once a traversal for this family completes.
    pub fn completion_message(self) -> &'static str {
        match self {
            PassFamily::Links => "Link fixing complete!",
            PassFamily::Paths => "Path fixing complete!",
            PassFamily::TrailingSlashes => "Trailing slash fixing complete!",
        }
    }
}

impl fmt::Display for PassFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.subject())
    }
}

/// Which documents a rule applies to.
#[derive(Debug, Clone)]
pub enum Scope {
    Everywhere,
    /// Only documents whose relative directory contains one of these strings.
    DirContains(Vec<String>),
}

impl Scope {
    fn includes(&self, relative_dir: &str) -> bool {
        match self {
            Scope::Everywhere => true,
            Scope::DirContains(fragments) => {
                fragments.iter().any(|f| relative_dir.contains(f.as_str()))
            }
        }
    }
}

/// How a match is replaced. Every pattern captures the attribute value (or the
/// part of it that survives) as group 1.
#[derive(Debug, Clone)]
pub enum Replacement {
    /// `regex` expansion template (`${1}` refers to the capture).
    Template(&'static str),
    /// `<attr>="/<relative_dir>/<folder>/<capture>"`, with the document's
    /// relative directory embedded verbatim.
    RootedAtDocument {
        attr: &'static str,
        folder: &'static str,
    },
    /// `href="<capture>/"` unless the capture already ends in `/` or in one of
    /// the extensions (stored with their leading dot).
    TrailingSlash { reserved_suffixes: Vec<String> },
}

/// A single named substitution.
#[derive(Debug, Clone)]
pub struct Rule {
    name: &'static str,
    pattern: Regex,
    replacement: Replacement,
    scope: Scope,
}

impl Rule {
    /// Build a rule from a constant pattern. Panics if the pattern is invalid,
    /// which can only happen through a programming error.
    pub fn new(name: &'static str, pattern: &str, replacement: Replacement) -> Self {
        Self {
            name,
            pattern: Regex::new(pattern).expect("rule pattern must compile"),
            replacement,
            scope: Scope::Everywhere,
        }
    }

    /// Restrict the rule to documents in matching directories.
    pub fn scoped(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Apply the rule to every match in `content`.
    ///
    /// Returns `Cow::Borrowed` when the rule is out of scope or nothing matched.
    pub fn apply<'a>(&self, content: &'a str, relative_dir: &str) -> Cow<'a, str> {
        if !self.scope.includes(relative_dir) {
            return Cow::Borrowed(content);
        }
        match &self.replacement {
            Replacement::Template(template) => self.pattern.replace_all(content, *template),
            Replacement::RootedAtDocument { attr, folder } => {
                self.pattern.replace_all(content, |caps: &Captures| {
                    format!("{attr}=\"/{relative_dir}/{folder}/{}\"", &caps[1])
                })
            }
            Replacement::TrailingSlash { reserved_suffixes } => {
                self.pattern.replace_all(content, |caps: &Captures| {
                    let value = &caps[1];
                    if needs_trailing_slash(value, reserved_suffixes) {
                        format!("href=\"{value}/\"")
                    } else {
                        caps[0].to_string()
                    }
                })
            }
        }
    }
}

/// Whether an absolute href value looks like a directory missing its slash.
fn needs_trailing_slash(value: &str, reserved_suffixes: &[String]) -> bool {
    !value.ends_with('/') && !reserved_suffixes.iter().any(|s| value.ends_with(s.as_str()))
}

/// The ordered rules of one pass family.
#[derive(Debug, Clone)]
pub struct RuleSet {
    family: PassFamily,
    rules: Vec<Rule>,
}

impl RuleSet {
    /// Compile the rules for `family`, taking tunables from `config`.
    pub fn new(family: PassFamily, config: &RewriteConfig) -> Self {
        let rules = match family {
            PassFamily::Links => link_rules(),
            PassFamily::Paths => path_rules(&config.paths.local_asset_dirs),
            PassFamily::TrailingSlashes => {
                trailing_slash_rules(&config.trailing_slashes.reserved_extensions)
            }
        };
        Self { family, rules }
    }

    pub fn family(&self) -> PassFamily {
        self.family
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Run every rule in order over `content`.
    pub fn apply<'a>(&self, content: &'a str, relative_dir: &str) -> Cow<'a, str> {
        let mut current = Cow::Borrowed(content);
        for rule in &self.rules {
            let next = match rule.apply(&current, relative_dir) {
                Cow::Owned(text) => Some(text),
                Cow::Borrowed(_) => None,
            };
            if let Some(text) = next {
                current = Cow::Owned(text);
            }
        }
        current
    }
}

fn link_rules() -> Vec<Rule> {
    vec![
        Rule::new(
            "index-suffix",
            r#"href="([^"]*)/index\.html""#,
            Replacement::Template(r#"href="${1}/""#),
        ),
        Rule::new(
            "html-suffix",
            r#"href="([^"]*)\.html""#,
            Replacement::Template(r#"href="${1}""#),
        ),
    ]
}

// The local rules run first: the generic rules also match bare `css/` and
// `js/` values (zero `../` segments) and would root them at `/`.
fn path_rules(local_asset_dirs: &[String]) -> Vec<Rule> {
    let local = Scope::DirContains(local_asset_dirs.to_vec());
    vec![
        Rule::new(
            "local-css",
            r#"href="css/([^"]+)""#,
            Replacement::RootedAtDocument {
                attr: "href",
                folder: "css",
            },
        )
        .scoped(local.clone()),
        Rule::new(
            "local-js",
            r#"src="js/([^"]+)""#,
            Replacement::RootedAtDocument {
                attr: "src",
                folder: "js",
            },
        )
        .scoped(local),
        Rule::new(
            "css",
            r#"href="(?:\.\./)*css/([^"]+)""#,
            Replacement::Template(r#"href="/css/${1}""#),
        ),
        Rule::new(
            "js",
            r#"src="(?:\.\./)*js/([^"]+)""#,
            Replacement::Template(r#"src="/js/${1}""#),
        ),
    ]
}

fn trailing_slash_rules(reserved_extensions: &[String]) -> Vec<Rule> {
    let reserved_suffixes = reserved_extensions
        .iter()
        .map(|ext| format!(".{}", ext.trim_start_matches('.')))
        .collect();
    vec![Rule::new(
        "trailing-slash",
        r#"href="(/[^"]*)""#,
        Replacement::TrailingSlash { reserved_suffixes },
    )]
}
