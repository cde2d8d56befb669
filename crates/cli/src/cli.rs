//! Command line definition.

use clap::{ArgGroup, Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "reelforge", version, about = "Narrated, subtitled short videos from a script")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP server
    Serve(ServeArgs),
    /// Run one pipeline locally and print its progress
    Generate(GenerateArgs),
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Path to a TOML configuration file
    #[arg(long, env = "REELFORGE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Address to bind, overrides the configuration file
    #[arg(long, env = "REELFORGE_HOST")]
    pub host: Option<String>,

    /// Port to bind, overrides the configuration file
    #[arg(long, env = "REELFORGE_PORT")]
    pub port: Option<u16>,
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("source").required(true).args(["query", "video_file"])))]
pub struct GenerateArgs {
    /// Text to narrate
    #[arg(long)]
    pub script: String,

    /// Voice identifier, e.g. en-US-AriaNeural
    #[arg(long)]
    pub voice: String,

    /// Stock footage search query
    #[arg(long)]
    pub query: Option<String>,

    /// Local video to use as background
    #[arg(long)]
    pub video_file: Option<PathBuf>,

    /// Path to a TOML configuration file
    #[arg(long, env = "REELFORGE_CONFIG")]
    pub config: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_generate_requires_one_source() {
        let both = Cli::try_parse_from([
            "reelforge", "generate", "--script", "s", "--voice", "v", "--query", "q",
            "--video-file", "a.mp4",
        ]);
        assert!(both.is_err());

        let neither = Cli::try_parse_from(["reelforge", "generate", "--script", "s", "--voice", "v"]);
        assert!(neither.is_err());

        let query = Cli::try_parse_from([
            "reelforge", "generate", "--script", "s", "--voice", "v", "--query", "ocean",
        ])
        .unwrap();
        match query.command {
            Command::Generate(args) => assert_eq!(args.query.as_deref(), Some("ocean")),
            Command::Serve(_) => panic!("expected generate"),
        }
    }

    #[test]
    fn test_serve_overrides() {
        let cli = Cli::try_parse_from(["reelforge", "serve", "--host", "127.0.0.1", "--port", "9000"])
            .unwrap();
        match cli.command {
            Command::Serve(args) => {
                assert_eq!(args.host.as_deref(), Some("127.0.0.1"));
                assert_eq!(args.port, Some(9000));
            }
            Command::Generate(_) => panic!("expected serve"),
        }
    }
}
