//! batoms-build CLI entry point.

use batoms_build::blender::find_blender;
use batoms_build::commands::{build, clean, locate, platform, snapshot};
use batoms_build::config::Config;
use batoms_build::error::{BuildError, Result};
use batoms_build::pipeline::BuildOptions;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use std::io;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "batoms-build")]
#[command(about = "Build Blender extension archives for Beautiful Atoms")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to Blender executable (overrides auto-detection)
    #[arg(long, global = true, env = "BLENDER_PATH")]
    blender: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Build wheels and package the Blender extension
    Build {
        /// Root directory of the repository
        #[arg(long, default_value = ".")]
        repo_root: PathBuf,

        /// Path to pyproject.toml (relative to the repository root)
        #[arg(long, default_value = "pyproject.toml")]
        pyproject: PathBuf,

        /// Path to blender_manifest.toml (relative to the repository root)
        #[arg(long, default_value = "blender_manifest.toml")]
        manifest: PathBuf,

        /// Extension source directory (default: <repo-root>/batoms)
        #[arg(long)]
        source_dir: Option<PathBuf>,

        /// Directory to store built files (default: <repo-root>/build)
        #[arg(long)]
        build_dir: Option<PathBuf>,

        /// Directory for exported extension files (default: <repo-root>/export)
        #[arg(long)]
        export_dir: Option<PathBuf>,

        /// Index URL for pip, same as pip's -i option
        #[arg(short = 'i', long)]
        index_url: Option<String>,

        /// Directories containing extra wheels from other platforms
        #[arg(long, num_args = 0..)]
        extra_wheels: Vec<PathBuf>,

        /// Only compress the wheels without building the extension
        #[arg(short = 'z', long)]
        only_compress_wheels: bool,
    },

    /// Show the packages that would be pinned from Blender's Python
    Snapshot {
        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Print the platform identifier used in archive names
    Platform {
        /// Separator between OS and architecture
        #[arg(long, default_value = "-")]
        connector: char,
    },

    /// Find the enabled extension module in Blender's add-on registry
    Locate {
        /// Extension name (module suffix)
        #[arg(long)]
        name: Option<String>,
    },

    /// Remove build and export directories
    Clean {
        /// Root directory of the repository
        #[arg(long, default_value = ".")]
        repo_root: PathBuf,

        /// Build directory (default: <repo-root>/build)
        #[arg(long)]
        build_dir: Option<PathBuf>,

        /// Export directory (default: <repo-root>/export)
        #[arg(long)]
        export_dir: Option<PathBuf>,

        /// Show what would be deleted without actually deleting
        #[arg(long)]
        dry_run: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

impl From<OutputFormat> for snapshot::OutputFormat {
    fn from(f: OutputFormat) -> Self {
        match f {
            OutputFormat::Text => snapshot::OutputFormat::Text,
            OutputFormat::Json => snapshot::OutputFormat::Json,
        }
    }
}

fn main() {
    if let Err(e) = run_cli() {
        println!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    // A second init (e.g. in tests) is harmless
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(verbosity >= 3)
        .try_init();
}

fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    // Load optional config
    let config = Config::load_from_cwd()?.unwrap_or_default();

    // Determine Blender path (CLI > config > auto-detect)
    let blender_path = || -> Result<PathBuf> {
        let path = if let Some(ref path) = cli.blender {
            path.clone()
        } else if let Some(ref path) = config.blender_path {
            path.clone()
        } else {
            return find_blender().ok_or(BuildError::BlenderNotFound);
        };

        if !path.exists() {
            return Err(BuildError::BlenderCommandFailed(format!(
                "Blender not found at specified path: {}",
                path.display()
            )));
        }

        Ok(path)
    };

    match cli.command {
        Command::Build {
            repo_root,
            pyproject,
            manifest,
            source_dir,
            build_dir,
            export_dir,
            index_url,
            extra_wheels,
            only_compress_wheels,
        } => {
            let repo_root = repo_root.canonicalize().map_err(|e| {
                BuildError::ConfigError(format!(
                    "Cannot access repository root '{}': {}",
                    repo_root.display(),
                    e
                ))
            })?;

            let mut options = BuildOptions::new(&repo_root).with_config(&config);
            options.pyproject = repo_root.join(pyproject);
            options.manifest = repo_root.join(manifest);
            if let Some(dir) = source_dir {
                options.source_dir = repo_root.join(dir);
            }
            if let Some(dir) = build_dir {
                options.build_dir = dir;
            }
            if let Some(dir) = export_dir {
                options.export_dir = dir;
            }
            if index_url.is_some() {
                options.index_url = index_url;
            }
            options.extra_wheels = extra_wheels;
            options.only_compress_wheels = only_compress_wheels;

            // Usage errors surface even when Blender is missing
            options.validate()?;

            build::execute(build::BuildArgs {
                options,
                blender: blender_path()?,
            })
        }

        Command::Snapshot { format } => snapshot::execute(snapshot::SnapshotArgs {
            format: format.into(),
            blender: blender_path()?,
        }),

        Command::Platform { connector } => platform::execute(platform::PlatformArgs { connector }),

        Command::Locate { name } => locate::execute(locate::LocateArgs {
            name: name.unwrap_or_else(|| config.extension_name().to_string()),
            blender: blender_path()?,
        }),

        Command::Clean {
            repo_root,
            build_dir,
            export_dir,
            dry_run,
        } => clean::execute(clean::CleanArgs {
            repo_root,
            build_dir,
            export_dir,
            dry_run,
        }),

        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "batoms-build", &mut io::stdout());
            Ok(())
        }
    }
}
