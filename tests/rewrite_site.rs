//! End-to-end runs of every pass family over a small calculator site.
//!
//! The fixture mirrors the layout these rewrites were written for: shared
//! assets under `/css` and `/js`, pages nested a few directories deep, and a
//! mortgage calculator that ships its own stylesheet and scripts.

use sitefix::config::RewriteConfig;
use sitefix::rewrite::{RewriteOptions, rewrite_families, rewrite_tree};
use sitefix::rules::{PassFamily, RuleSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tempfile::TempDir;

const HOME: &str = r#"<!DOCTYPE html>
<html>
<head>
<link rel="stylesheet" href="css/style.css">
</head>
<body>
<nav>
<a href="/index.html">Home</a>
<a href="/finance/index.html">Finance</a>
<a href="/health/bmi/bmi-calculator/index.html">BMI</a>
<a href="about.html">About</a>
<a href="mailto:hello@example.com">Contact</a>
</nav>
<img href="/images/logo.png">
<script src="js/main.js"></script>
</body>
</html>
"#;

const LOAN: &str = r#"<html>
<head><link rel="stylesheet" href="../../../css/style.css"></head>
<body>
<a href="/finance/mortgage/mortgage-calculator/index.html">Mortgage</a>
<a href="/sitemap.xml">Sitemap</a>
<script src="../../../js/main.js"></script>
<script src="js/loan-calculator.js"></script>
</body>
</html>
"#;

const MORTGAGE: &str = r#"<html>
<head>
<link rel="stylesheet" href="../../../css/style.css">
<link rel="stylesheet" href="css/mortgage-calculator.css">
</head>
<body>
<a href="/finance">Finance</a>
<script src="js/mortgage-calculator.js"></script>
<script src="../../../js/dark-mode.js"></script>
</body>
</html>
"#;

const PLAIN: &str = "<html><body><p>No links here.</p></body></html>\n";

const SCRIPT: &str = r#"document.querySelector('a[href="about.html"]');"#;

fn write(root: &Path, rel: &str, content: &str) -> PathBuf {
    let path = root.join(rel);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path
}

fn setup_site() -> TempDir {
    let tmp = TempDir::new().unwrap();
    write(tmp.path(), "index.html", HOME);
    write(tmp.path(), "finance/loan/loan-calculator/index.html", LOAN);
    write(
        tmp.path(),
        "finance/mortgage/mortgage-calculator/index.html",
        MORTGAGE,
    );
    write(tmp.path(), "legal/privacy.html", PLAIN);
    write(tmp.path(), "js/main.js", SCRIPT);
    tmp
}

fn options() -> RewriteOptions {
    RewriteOptions {
        dry_run: false,
        threads: 2,
    }
}

fn run(root: &Path, family: PassFamily) -> usize {
    let rules = RuleSet::new(family, &RewriteConfig::default());
    rewrite_tree(root, &rules, &options(), None)
        .unwrap()
        .changed
        .len()
}

fn read(root: &Path, rel: &str) -> String {
    fs::read_to_string(root.join(rel)).unwrap()
}

fn mtime(path: &Path) -> SystemTime {
    fs::metadata(path).unwrap().modified().unwrap()
}

/// Snapshot of every file's content, sorted by relative path.
fn snapshot(root: &Path) -> Vec<(PathBuf, String)> {
    let mut files: Vec<(PathBuf, String)> = walkdir::WalkDir::new(root)
        .into_iter()
        .map(|e| e.unwrap())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e.path().strip_prefix(root).unwrap().to_path_buf();
            (rel, fs::read_to_string(e.path()).unwrap())
        })
        .collect();
    files.sort();
    files
}

#[test]
fn links_pass_rewrites_suffixes() {
    let site = setup_site();
    assert_eq!(run(site.path(), PassFamily::Links), 2);

    let home = read(site.path(), "index.html");
    assert!(home.contains(r#"<a href="/">Home</a>"#));
    assert!(home.contains(r#"<a href="/finance/">Finance</a>"#));
    assert!(home.contains(r#"<a href="/health/bmi/bmi-calculator/">BMI</a>"#));
    assert!(home.contains(r#"<a href="about">About</a>"#));
    assert!(home.contains(r#"<a href="mailto:hello@example.com">Contact</a>"#));
}

#[test]
fn paths_pass_roots_shared_assets_and_keeps_local_ones() {
    let site = setup_site();
    assert_eq!(run(site.path(), PassFamily::Paths), 3);

    let home = read(site.path(), "index.html");
    assert!(home.contains(r#"href="/css/style.css""#));
    assert!(home.contains(r#"src="/js/main.js""#));

    let loan = read(site.path(), "finance/loan/loan-calculator/index.html");
    assert!(loan.contains(r#"href="/css/style.css""#));
    assert!(loan.contains(r#"src="/js/main.js""#));
    // Not a local-asset directory: bare js/ is rooted at the site
    assert!(loan.contains(r#"src="/js/loan-calculator.js""#));

    let dir = Path::new("finance/mortgage/mortgage-calculator")
        .to_string_lossy()
        .into_owned();
    let mortgage = read(site.path(), "finance/mortgage/mortgage-calculator/index.html");
    assert!(mortgage.contains(r#"href="/css/style.css""#));
    assert!(mortgage.contains(&format!(r#"href="/{dir}/css/mortgage-calculator.css""#)));
    assert!(mortgage.contains(&format!(r#"src="/{dir}/js/mortgage-calculator.js""#)));
    assert!(mortgage.contains(r#"src="/js/dark-mode.js""#));
}

#[test]
fn trailing_slash_pass_only_touches_directory_paths() {
    let site = setup_site();
    assert_eq!(run(site.path(), PassFamily::TrailingSlashes), 1);

    let mortgage = read(site.path(), "finance/mortgage/mortgage-calculator/index.html");
    assert!(mortgage.contains(r#"<a href="/finance/">Finance</a>"#));

    // Reserved extensions are left alone
    let home = read(site.path(), "index.html");
    assert!(home.contains(r#"href="/index.html""#));
    assert!(home.contains(r#"href="/images/logo.png""#));
    let loan = read(site.path(), "finance/loan/loan-calculator/index.html");
    assert!(loan.contains(r#"href="/sitemap.xml""#));
}

#[test]
fn non_html_files_are_never_written() {
    let site = setup_site();
    let script = site.path().join("js/main.js");
    let before = mtime(&script);

    rewrite_families(
        site.path(),
        &PassFamily::ALL,
        &RewriteConfig::default(),
        &options(),
        None,
    )
    .unwrap();

    assert_eq!(fs::read_to_string(&script).unwrap(), SCRIPT);
    assert_eq!(mtime(&script), before);
}

#[test]
fn files_without_matches_are_never_written() {
    let site = setup_site();
    let privacy = site.path().join("legal/privacy.html");
    let before = mtime(&privacy);

    let summaries = rewrite_families(
        site.path(),
        &PassFamily::ALL,
        &RewriteConfig::default(),
        &options(),
        None,
    )
    .unwrap();

    assert_eq!(mtime(&privacy), before);
    assert!(summaries.iter().all(|s| !s.changed.contains(&privacy)));
}

#[test]
fn every_family_is_idempotent_on_the_tree() {
    for family in PassFamily::ALL {
        let site = setup_site();
        run(site.path(), family);
        let first = snapshot(site.path());
        assert_eq!(run(site.path(), family), 0, "{family} changed files twice");
        assert_eq!(snapshot(site.path()), first);
    }
}

#[test]
fn combined_run_reaches_a_fixed_point() {
    let site = setup_site();
    let config = RewriteConfig::default();

    rewrite_families(site.path(), &PassFamily::ALL, &config, &options(), None).unwrap();
    let first = snapshot(site.path());

    // Re-running any family, in any number of repetitions, changes nothing.
    for _ in 0..2 {
        let summaries =
            rewrite_families(site.path(), &PassFamily::ALL, &config, &options(), None).unwrap();
        assert!(summaries.iter().all(|s| s.changed.is_empty()));
    }
    assert_eq!(snapshot(site.path()), first);

    let home = read(site.path(), "index.html");
    assert!(home.contains(r#"<a href="/">Home</a>"#));
    assert!(home.contains(r#"<a href="/finance/">Finance</a>"#));
    assert!(home.contains(r#"<a href="about">About</a>"#));
}

#[test]
fn dry_run_leaves_tree_untouched() {
    let site = setup_site();
    let before = snapshot(site.path());
    let options = RewriteOptions {
        dry_run: true,
        threads: 1,
    };

    let summaries = rewrite_families(
        site.path(),
        &PassFamily::ALL,
        &RewriteConfig::default(),
        &options,
        None,
    )
    .unwrap();

    assert_eq!(snapshot(site.path()), before);
    assert_eq!(summaries[0].changed.len(), 2);
    assert!(summaries.iter().all(|s| s.dry_run));
}

#[test]
fn config_file_extends_local_asset_dirs() {
    let site = setup_site();
    write(
        site.path(),
        "sitefix.toml",
        "[paths]\nlocal_asset_dirs = [\"mortgage-calculator\", \"loan-calculator\"]\n",
    );
    let config = sitefix::config::load_config(site.path()).unwrap();

    rewrite_families(site.path(), &[PassFamily::Paths], &config, &options(), None).unwrap();

    let dir = Path::new("finance/loan/loan-calculator")
        .to_string_lossy()
        .into_owned();
    let loan = read(site.path(), "finance/loan/loan-calculator/index.html");
    assert!(loan.contains(&format!(r#"src="/{dir}/js/loan-calculator.js""#)));
}
