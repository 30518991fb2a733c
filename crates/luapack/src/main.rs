use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::{LevelFilter, debug, info, warn};
use luapack::{
    BundleOrchestrator, Config, MinifyMode,
    config::{ConfigLayer, InstallerLayer},
};

/// Bundle a directory of Lua modules into a single file
#[derive(Parser, Debug)]
#[command(name = "luapack", version, about, long_about = None)]
struct Cli {
    /// Root directory of the modules to bundle
    #[arg(default_value = ".")]
    root: PathBuf,

    /// Output bundle path (defaults to `<root name>.lua` in the working directory)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// How much whitespace to remove after stripping comments
    #[arg(long, value_enum)]
    minify: Option<MinifyMode>,

    /// Embed module sources verbatim
    #[arg(long, conflicts_with = "minify")]
    no_minify: bool,

    /// Root-relative path prefix to leave out (repeatable)
    #[arg(short, long = "exclude", value_name = "PREFIX")]
    exclude: Vec<String>,

    /// Extension of module files
    #[arg(long)]
    extension: Option<String>,

    /// Name of the exported table
    #[arg(long)]
    namespace: Option<String>,

    /// Leading segment added to every module id
    #[arg(long)]
    prefix: Option<String>,

    /// Do not emit the header comment
    #[arg(long)]
    no_header: bool,

    /// External command the bundle is piped through, e.g. "luamin -c"
    #[arg(long, value_name = "CMD")]
    post_minify: Option<String>,

    /// Also write a download installer script to this path
    #[arg(long, value_name = "PATH")]
    emit_installer: Option<PathBuf>,

    /// Base URL the installer downloads files from
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Project configuration file (defaults to `luapack.toml` in the root)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    /// Flags as the highest-priority configuration layer
    fn layer(&self) -> ConfigLayer {
        let minify = if self.no_minify {
            Some(MinifyMode::Off)
        } else {
            self.minify
        };
        ConfigLayer {
            output: self.output.clone(),
            extension: self.extension.clone(),
            exclude: self.exclude.clone(),
            minify,
            namespace: self.namespace.clone(),
            prefix: self.prefix.clone(),
            header: self.no_header.then_some(false),
            post_minify: self
                .post_minify
                .as_deref()
                .map(|command| command.split_whitespace().map(str::to_string).collect()),
            installer_output: self.emit_installer.clone(),
            installer: InstallerLayer {
                base_url: self.base_url.clone(),
            },
        }
    }
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .parse_default_env()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let mut config = Config::load(&cli.root, cli.config.as_deref())
        .context("Failed to load configuration")?;
    config.apply(cli.layer());
    debug!("Resolved configuration: {config:?}");

    let report = BundleOrchestrator::new(config).run()?;
    for warning in &report.warnings {
        warn!("{warning}");
    }
    info!(
        "Wrote {} ({} modules, sha256 {})",
        report.output.display(),
        report.modules.len(),
        report.digest
    );
    Ok(())
}
