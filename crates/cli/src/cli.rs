use std::path::PathBuf;

use confparts_types::SourceType;

#[derive(clap::Parser, Debug)]
#[clap(name = "confparts", about = "Manage distributed configuration parts")]
pub struct Cli {
    /// Use this configuration file instead of the default one
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Print the configuration part manifest of a source as JSON
    Manifest {
        /// Source type to build the manifest for
        #[clap(long, value_enum, default_value_t = SourceType::Internal)]
        source: SourceType,
    },
    /// List every content identifier an internal source may publish
    Identifiers,
    /// List the installed optional parts and any broken registrations
    Parts,
    /// Publish a file as a configuration part, replacing the previous version
    Save {
        /// File name the part is published under
        file_name: String,
        /// Path of the content to publish
        path: PathBuf,
    },
    /// Validate an optional part with its validation program and publish it
    Upload {
        /// File name of the optional part
        file_name: String,
        /// Path of the content to upload
        path: PathBuf,
    },
    /// Run a validation program on a file without publishing it
    Validate {
        /// Validation program to run
        program: PathBuf,
        /// Content identifier passed to the program
        content_identifier: String,
        /// Path of the content to validate
        path: PathBuf,
        /// Write the validated content here
        #[clap(long)]
        output: Option<PathBuf>,
    },
    /// Print the stored content of a configuration part
    Show {
        /// File name of the part
        file_name: String,
        /// Write the content to a file instead of stdout
        #[clap(long)]
        output: Option<PathBuf>,
    },
    /// Remove a published configuration part
    Remove {
        /// File name of the part
        file_name: String,
    },
    /// Manage configuration
    Config {
        #[clap(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Dotted configuration key, e.g. `validator.timeout_secs`
        key: String,
        value: String,
    },
}
