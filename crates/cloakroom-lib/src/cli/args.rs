use crate::fetch::DEFAULT_MAX_RETRIES;
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Init {
        manifest_path: Option<PathBuf>,
        force: bool,
    },
    Add {
        manifest_path: Option<PathBuf>,
        wardrobe: Option<PathBuf>,
        key: String,
        release: String,
        artifact: String,
        hash: Option<String>,
        fetch: bool,
        force: bool,
    },
    Remove {
        manifest_path: Option<PathBuf>,
        wardrobe: Option<PathBuf>,
        key: String,
        purge: bool,
    },
    List {
        manifest_path: Option<PathBuf>,
    },
    Clean {
        manifest_path: Option<PathBuf>,
        wardrobe: Option<PathBuf>,
    },
    Restore {
        manifest_path: Option<PathBuf>,
        wardrobe: Option<PathBuf>,
        clean: bool,
        force: bool,
        max_retries: u32,
        concurrency: Option<usize>,
    },
}

pub struct Args {
    pub command: Command,
    pub log_level: Level,
}

#[derive(Debug, Parser)]
#[command(
    name = "cloakroom",
    version,
    about = "Restore release artifacts declared in a manifest into a local plugin directory"
)]
struct Cli {
    #[arg(
        short = 'v',
        long = "verbose",
        help = "Sets the level of verbosity",
        action = ArgAction::Count,
        global = true
    )]
    verbose: u8,

    #[arg(
        short = 'm',
        long = "manifest",
        value_name = "FILE",
        help = "Manifest to use instead of searching the working directory",
        global = true
    )]
    manifest: Option<PathBuf>,

    #[arg(
        short = 'w',
        long = "wardrobe",
        value_name = "DIR",
        env = "CLOAKROOM_WARDROBE",
        help = "Overrides the directory artifacts are restored into",
        global = true
    )]
    wardrobe: Option<PathBuf>,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Create an empty manifest
    Init {
        #[arg(short = 'f', long, help = "Overwrite an existing manifest")]
        force: bool,
    },

    /// Add a plugin to the manifest
    Add {
        #[arg(value_name = "OWNER/REPO")]
        key: String,

        #[arg(
            short = 'r',
            long = "release",
            visible_alias = "tag",
            value_name = "TAG",
            help = "Release tag, or \"latest\"",
            default_value = "latest"
        )]
        release: String,

        #[arg(short = 'a', long = "artifact", value_name = "FILE", help = "Release asset file name")]
        artifact: String,

        #[arg(long = "hash", value_name = "HEX", help = "Expected SHA-256 of the artifact")]
        hash: Option<String>,

        #[arg(long, help = "Download the artifact right away")]
        fetch: bool,

        #[arg(short = 'f', long, help = "Replace an existing entry")]
        force: bool,
    },

    /// Remove a plugin from the manifest
    #[command(visible_alias = "rm")]
    Remove {
        #[arg(value_name = "OWNER/REPO")]
        key: String,

        #[arg(short = 'p', long, help = "Also delete the artifact from the wardrobe")]
        purge: bool,
    },

    /// List the plugins in the manifest
    #[command(visible_alias = "ls")]
    List,

    /// Delete everything in the wardrobe
    Clean,

    /// Download every plugin in the manifest into the wardrobe
    Restore {
        #[arg(short = 'c', long, help = "Empty the wardrobe first")]
        clean: bool,

        #[arg(short = 'f', long, help = "Overwrite artifacts that are already present")]
        force: bool,

        #[arg(
            long = "max-retries",
            value_name = "N",
            help = "Retries after a failed attempt",
            default_value_t = DEFAULT_MAX_RETRIES
        )]
        max_retries: u32,

        #[arg(
            long = "concurrency",
            value_name = "N",
            help = "Maximum number of simultaneous downloads (default: unlimited)"
        )]
        concurrency: Option<usize>,
    },
}

pub fn parse_args() -> Args {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(log_level.into())
                .from_env_lossy(),
        )
        .init();

    Args {
        command: into_command(cli),
        log_level,
    }
}

fn into_command(cli: Cli) -> Command {
    let Cli {
        manifest: manifest_path,
        wardrobe,
        command,
        ..
    } = cli;

    match command {
        CliCommand::Init { force } => Command::Init {
            manifest_path,
            force,
        },
        CliCommand::Add {
            key,
            release,
            artifact,
            hash,
            fetch,
            force,
        } => Command::Add {
            manifest_path,
            wardrobe,
            key,
            release,
            artifact,
            hash,
            fetch,
            force,
        },
        CliCommand::Remove { key, purge } => Command::Remove {
            manifest_path,
            wardrobe,
            key,
            purge,
        },
        CliCommand::List => Command::List { manifest_path },
        CliCommand::Clean => Command::Clean {
            manifest_path,
            wardrobe,
        },
        CliCommand::Restore {
            clean,
            force,
            max_retries,
            concurrency,
        } => Command::Restore {
            manifest_path,
            wardrobe,
            clean,
            force,
            max_retries,
            concurrency,
        },
    }
}
