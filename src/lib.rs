//! # sitefix
//!
//! Rewrites link and asset paths inside a static site's HTML files after a
//! generation or migration step. The tool walks a directory tree, applies an
//! ordered set of regular-expression substitutions to every `.html` file, and
//! writes back only the files whose content changed.
//!
//! # Pass Families
//!
//! Rules come in three independent families. One traversal applies one family;
//! `sitefix all` runs them in sequence.
//!
//! ```text
//! links             href="docs/index.html"      →  href="docs/"
//!                   href="about.html"           →  href="about"
//! paths             href="../../css/site.css"   →  href="/css/site.css"
//!                   src="../js/main.js"         →  src="/js/main.js"
//!                   (in */mortgage-calculator*/) href="css/calc.css"
//!                                               →  href="/<dir>/css/calc.css"
//! trailing-slashes  href="/about"               →  href="/about/"
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`walk`] | Finds `.html` files under the root, with their relative directories |
//! | [`rules`] | Substitution rules and the three pass families |
//! | [`rewrite`] | Per-file transform, change-detection write policy, tree traversal |
//! | [`config`] | Optional `sitefix.toml` loading and validation |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Regex Over Raw Markup
//!
//! No HTML parser is involved. Each rule matches `attr="value"` text directly,
//! which keeps the rewrite byte-exact everywhere else in the file. The cost is
//! that matches inside comments, inline scripts, or values with escaped quotes
//! are rewritten too; see [`rules`] for the details.
//!
//! ## Change-Detection Writes
//!
//! A file is written only when its rewritten content differs from the original.
//! Untouched files keep their modification time, which matters for deploy tools
//! that sync by mtime. Writes go through a temp file and a rename so a crash
//! never leaves a half-written page.
//!
//! ## Explicit Root
//!
//! Every entry point takes the root directory as a parameter; the CLI defaults
//! it to the current directory.
//!
//! ## Optional Configuration
//!
//! The rule set is fixed: `mortgage-calculator` is the only directory with
//! local assets, and nine extensions (`html css js xml txt svg jpg png gif`)
//! are reserved from trailing slashes. A `sitefix.toml` in the root may extend
//! those lists or cap the worker count, but nothing requires it. Without the
//! file every pass behaves exactly as the defaults in [`config`].

pub mod config;
pub mod output;
pub mod rewrite;
pub mod rules;
pub mod walk;
