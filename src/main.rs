use clap::{Parser, Subcommand, ValueEnum};
use sitefix::rewrite::{self, RewriteOptions};
use sitefix::rules::PassFamily;
use sitefix::{config, output};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sitefix")]
#[command(about = "Rewrite link and asset paths inside a static site's HTML files")]
#[command(long_about = "\
Rewrite link and asset paths inside a static site's HTML files

Every .html file under the root is run through one family of substitutions.
Files are written back only when their content changes.

Families:

  links             href=\"docs/index.html\"     -> href=\"docs/\"
                    href=\"about.html\"          -> href=\"about\"
  paths             href=\"../../css/site.css\"  -> href=\"/css/site.css\"
                    src=\"../js/main.js\"        -> src=\"/js/main.js\"
                    pages under */mortgage-calculator*/ keep their own css/ and js/
  trailing-slashes  href=\"/about\"              -> href=\"/about/\"

Run 'sitefix gen-config' to generate a documented sitefix.toml.")]
#[command(version)]
struct Cli {
    /// Root directory of the site
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Strip index.html and .html suffixes from href values
    Links,
    /// Rewrite relative css/ and js/ references to absolute paths
    Paths,
    /// Append / to absolute href values that look like directories
    TrailingSlashes,
    /// Run links, paths and trailing-slashes in sequence
    All,
    /// List files a family would change, without writing anything
    Check {
        /// Family to check (all families when omitted)
        family: Option<FamilyArg>,
    },
    /// Print a stock sitefix.toml with all options documented
    GenConfig,
}

#[derive(Clone, Copy, ValueEnum)]
enum FamilyArg {
    Links,
    Paths,
    TrailingSlashes,
}

impl From<FamilyArg> for PassFamily {
    fn from(arg: FamilyArg) -> Self {
        match arg {
            FamilyArg::Links => PassFamily::Links,
            FamilyArg::Paths => PassFamily::Paths,
            FamilyArg::TrailingSlashes => PassFamily::TrailingSlashes,
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let (families, dry_run) = match cli.command {
        Command::Links => (vec![PassFamily::Links], false),
        Command::Paths => (vec![PassFamily::Paths], false),
        Command::TrailingSlashes => (vec![PassFamily::TrailingSlashes], false),
        Command::All => (PassFamily::ALL.to_vec(), false),
        Command::Check { family } => match family {
            Some(f) => (vec![f.into()], true),
            None => (PassFamily::ALL.to_vec(), true),
        },
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
            return Ok(());
        }
    };

    let site_config = config::load_config(&cli.root)?;
    let options = RewriteOptions::from_config(&site_config, dry_run);

    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            output::print_rewrite_event(&event);
        }
    });
    let result = rewrite::rewrite_families(&cli.root, &families, &site_config, &options, Some(&tx));
    drop(tx);
    printer.join().ok();
    result?;

    Ok(())
}
