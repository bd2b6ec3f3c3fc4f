//! kiln CLI - Project scaffolding and commands shipped as registry packages

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use colored::Colorize;
use kiln_core::templates::CatalogSource;
use kiln_core::{
    tui, update_notice, CatalogFetcher, ClackPrompter, CommandDispatcher, CommandFailed,
    CommandOptions, DispatchOutcome, HostLoader, InitPlugin, Invocation, NpmRegistry, Overrides,
    ProductConfig, RegistryClient, ScaffoldServices, Settings, TokioSpawner,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// CLI version
pub const CLI_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Artifact implementing `kiln init`
const INIT_PACKAGE: &str = "@kiln-cli/init";

/// kiln product configuration
#[derive(Clone)]
pub struct KilnConfig;

impl ProductConfig for KilnConfig {
    fn name(&self) -> &'static str {
        "kiln"
    }

    fn display_name(&self) -> &'static str {
        "kiln"
    }

    fn package_name(&self) -> &'static str {
        "@kiln-cli/core"
    }

    fn commands(&self) -> &'static [(&'static str, &'static str)] {
        &[("init", INIT_PACKAGE)]
    }

    fn default_home_dir(&self) -> &'static str {
        ".kiln"
    }

    fn home_env(&self) -> &'static str {
        "KILN_HOME"
    }

    fn target_path_env(&self) -> &'static str {
        "KILN_TARGET_PATH"
    }

    fn registry_env(&self) -> &'static str {
        "KILN_REGISTRY"
    }

    fn catalog_env(&self) -> &'static str {
        "KILN_TEMPLATE_CATALOG"
    }

    fn default_catalog_url(&self) -> &'static str {
        "https://templates.kiln.dev/catalog.yaml"
    }

    fn upgrade_command(&self) -> &'static str {
        "npm install -g @kiln-cli/core"
    }
}

#[derive(Parser, Debug)]
#[command(name = "kiln")]
#[command(about = "Scaffold projects from versioned template packages")]
#[command(version)]
pub struct Args {
    /// Print debug output and full error chains
    #[arg(long, global = true)]
    pub debug: bool,

    /// Run command packages from this local directory instead of the cache (for development use)
    #[arg(long = "target-path", global = true)]
    pub target_path: Option<PathBuf>,

    /// Package registry URL
    #[arg(long, global = true)]
    pub registry: Option<String>,

    /// Template catalog URL or local file
    #[arg(long = "template-catalog", global = true)]
    pub template_catalog: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a new project in the current directory
    Init(InitArgs),
}

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Project name; prompted for when missing or invalid
    pub project_name: Option<String>,

    /// Skip the non-empty directory question
    #[arg(short, long)]
    pub force: bool,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            target_path: self.target_path.clone(),
            registry: self.registry.clone(),
            template_catalog: self.template_catalog.clone(),
            debug: self.debug,
        }
    }
}

impl Command {
    fn invocation(&self, args: &Args) -> Invocation {
        match self {
            Command::Init(init) => Invocation::new(
                "init",
                init.project_name.iter().cloned().collect(),
                CommandOptions {
                    force: init.force,
                    debug: args.debug,
                    target_path: args.target_path.clone(),
                    ..CommandOptions::default()
                },
            ),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tui::install_terminal_guards();

    let args = Args::parse();
    init_tracing(args.debug);

    let Some(command) = &args.command else {
        Args::command().print_help()?;
        return Ok(());
    };

    let result = run(&args, command).await;
    tui::restore_cursor();

    match result {
        Ok(()) => Ok(()),
        Err(err) if err.downcast_ref::<CommandFailed>().is_some() => std::process::exit(1),
        Err(err) => {
            if args.debug {
                let _ = tui::error(&format!("{:?}", err));
            } else {
                let _ = tui::error(&err.to_string());
            }
            std::process::exit(1);
        }
    }
}

async fn run(args: &Args, command: &Command) -> Result<()> {
    let config = KilnConfig;
    warn_if_root();
    let settings = Settings::load(&config, args.overrides())?;
    tracing::debug!(cli_home = %settings.cli_home.display(), "settings loaded");

    let registry: Arc<dyn RegistryClient> = Arc::new(NpmRegistry::new(
        settings.registry_url.clone(),
        config.user_agent(),
    ));
    check_for_update(&config, registry.as_ref()).await;

    let spawner = Arc::new(TokioSpawner);
    let services = ScaffoldServices {
        catalog: Arc::new(CatalogFetcher::new(
            settings.catalog.clone(),
            config.user_agent(),
        )),
        registry: registry.clone(),
        prompter: Arc::new(ClackPrompter),
        spawner: spawner.clone(),
        loader: Arc::new(HostLoader::new(spawner.clone())),
    };
    if let CatalogSource::Local(path) = &settings.catalog {
        tracing::debug!(catalog = %path.display(), "using local template catalog");
    }

    let loader = HostLoader::new(spawner).with_builtin(
        INIT_PACKAGE,
        Arc::new(InitPlugin::new(settings.clone(), services)),
    );
    let dispatcher =
        CommandDispatcher::from_config(&config, settings, registry, Arc::new(loader));

    tui::intro(config.display_name())?;
    let invocation = command.invocation(args);
    match dispatcher.dispatch(&invocation).await? {
        DispatchOutcome::Invoked => tui::outro("Done")?,
        DispatchOutcome::NoEntryPoint => {
            tui::outro(format!("{} has nothing to run", invocation.command).as_str())?
        }
        DispatchOutcome::Unmapped => {
            tui::outro(format!("Unknown command {}", invocation.command).as_str())?
        }
    }
    Ok(())
}

/// Warn when a newer CLI release is published; lookup failures are ignored
async fn check_for_update<C: ProductConfig>(config: &C, registry: &dyn RegistryClient) {
    match registry.latest_version(config.package_name()).await {
        Ok(latest) => {
            if let Some(notice) = update_notice(CLI_VERSION, &latest, config.upgrade_command()) {
                eprintln!("{}", notice.yellow());
            }
        }
        Err(err) => tracing::debug!("update check failed: {}", err),
    }
}

/// Cache entries and project files created by root are unusable for normal users
fn warn_if_root() {
    #[cfg(unix)]
    if let Some(warning) = root_warning(unsafe { libc::geteuid() }) {
        eprintln!("{}", warning.yellow());
    }
}

fn root_warning(euid: u32) -> Option<&'static str> {
    (euid == 0).then_some("Running as root: the cache and generated files will be owned by root")
}

/// Initialize tracing; `RUST_LOG` overrides the `--debug` level
fn init_tracing(debug: bool) {
    let default = if debug {
        "kiln=debug,kiln_core=debug"
    } else {
        "kiln=info,kiln_core=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
