use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Export the strings of a source document into a dictionary
    Export {
        /// Source JSON document
        #[arg(short, long)]
        source: PathBuf,

        /// Dictionary file (defaults to the source with the dictionary extension)
        #[arg(short, long)]
        dict: Option<PathBuf>,
    },

    /// Translate the pending entries of a dictionary
    Translate {
        /// Dictionary file
        #[arg(short, long)]
        dict: PathBuf,

        /// Source language code ("auto" to detect)
        #[arg(short, long)]
        from: Option<String>,

        /// Target language code
        #[arg(short, long)]
        to: Option<String>,

        /// Translation provider (google, google-cloud, deepl, ollama)
        #[arg(short, long)]
        provider: Option<String>,

        /// Entries translated between two saves
        #[arg(long)]
        chunk_size: Option<usize>,
    },

    /// Write dictionary translations back into the source document
    Import {
        /// Source JSON document
        #[arg(short, long)]
        source: PathBuf,

        /// Dictionary file (defaults to the source with the dictionary extension)
        #[arg(short, long)]
        dict: Option<PathBuf>,

        /// Write the result here instead of over the source
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Import even when the dictionary is incomplete
        #[arg(long)]
        force: bool,
    },

    /// Show translation progress of a dictionary or a directory of dictionaries
    Status {
        /// Dictionary file or directory
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// List languages supported by the configured provider
    Languages {
        /// Translation provider (google, google-cloud, deepl, ollama)
        #[arg(short, long)]
        provider: Option<String>,
    },

    /// Translate a probe string to check the provider works
    TestProvider {
        /// Translation provider (google, google-cloud, deepl, ollama)
        #[arg(short, long)]
        provider: Option<String>,

        /// Target language code
        #[arg(short, long)]
        to: Option<String>,
    },

    /// Write the default configuration to a file
    InitConfig {
        /// Output path
        #[arg(short, long, default_value = "config.toml")]
        output: PathBuf,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_translate() {
        let args = Args::parse_from([
            "transdict", "-v", "translate", "--dict", "mod.dict", "--to", "fr", "--chunk-size", "50",
        ]);
        assert!(args.verbose);
        match args.command {
            Commands::Translate { dict, to, chunk_size, from, provider } => {
                assert_eq!(dict, PathBuf::from("mod.dict"));
                assert_eq!(to.as_deref(), Some("fr"));
                assert_eq!(chunk_size, Some(50));
                assert!(from.is_none() && provider.is_none());
            }
            _ => panic!("expected translate"),
        }
    }

    #[test]
    fn test_status_defaults_to_current_dir() {
        let args = Args::parse_from(["transdict", "status"]);
        assert!(matches!(args.command, Commands::Status { path } if path == PathBuf::from(".")));
    }
}
