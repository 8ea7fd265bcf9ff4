use std::path::PathBuf;

use chunkwise_core::Checksum;
use clap::{ArgAction, Args, Parser, Subcommand};

use crate::size::parse_size;

#[derive(Clone, Debug, Parser)]
#[command(name = "chunkwise", version = env!("CARGO_PKG_VERSION"), about, long_about = None, propagate_version = true)]
pub struct App {
    #[command(subcommand)]
    pub cmd: Commands,

    /// TOML file with default settings (falls back to $CHUNKWISE_CONFIG).
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// More logging; repeat for trace output. `RUST_LOG` overrides this.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Clone, Debug, Subcommand)]
pub enum Commands {
    #[command(alias = "s", name = "split", about = "Cut a file into chunks and write a manifest")]
    Split(SplitArg),
    #[command(alias = "f", name = "fetch", about = "Download the chunks of a manifest")]
    Fetch(FetchArg),
    #[command(alias = "r", name = "reassemble", about = "Rebuild the original file from its chunks")]
    Reassemble(ReassembleArg),
    #[command(alias = "v", name = "verify", about = "Check local chunks against a manifest")]
    Verify(VerifyArg),
    #[command(name = "digest", about = "Print the SHA-256 of files")]
    Digest(DigestArg),
}

#[derive(Clone, Debug, Args)]
pub struct SplitArg {
    pub file: PathBuf,

    /// Chunk size, e.g. `100M`, `1G`, `512K` or plain bytes.
    #[arg(short = 's', long, value_parser = parse_size)]
    pub chunk_size: Option<u64>,

    /// Directory for the chunks and the manifest.
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Batch version, recorded per chunk and used in the manifest name.
    #[arg(short, long, value_name = "VERSION")]
    pub tag: Option<String>,

    /// Zero-padding width of chunk indices.
    #[arg(long, value_name = "N")]
    pub width: Option<usize>,
}

#[derive(Clone, Debug, Args)]
pub struct FetchArg {
    /// Manifest URL or local path.
    pub manifest: String,

    /// Base URL the chunk names are appended to. Defaults to the manifest
    /// URL's directory.
    #[arg(short, long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Local directory for chunks.
    #[arg(short, long, value_name = "DIR")]
    pub dir: Option<PathBuf>,

    /// Reassemble after fetching, optionally into OUT.
    #[arg(short, long, value_name = "OUT", num_args = 0..=1)]
    pub reassemble: Option<Option<PathBuf>>,
}

#[derive(Clone, Debug, Args)]
pub struct ReassembleArg {
    pub manifest: PathBuf,

    /// Output file. Defaults to the original file name next to the chunks.
    #[arg(short, long, value_name = "OUT")]
    pub output: Option<PathBuf>,

    /// Chunk directory. Defaults to the manifest's directory.
    #[arg(long, value_name = "DIR")]
    pub chunks: Option<PathBuf>,

    /// Concatenate without checking chunk checksums.
    #[arg(long)]
    pub no_verify: bool,

    /// Expected SHA-256 of the whole reassembled file.
    #[arg(long, value_name = "SHA256")]
    pub expect: Option<Checksum>,
}

#[derive(Clone, Debug, Args)]
pub struct VerifyArg {
    pub manifest: PathBuf,

    #[arg(long, value_name = "DIR")]
    pub chunks: Option<PathBuf>,
}

#[derive(Clone, Debug, Args)]
pub struct DigestArg {
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_consistent() {
        use clap::CommandFactory;
        App::command().debug_assert();
    }

    #[test]
    fn test_split_args() {
        let app = App::try_parse_from(["chunkwise", "split", "game.zip", "-s", "50M", "-t", "0.28", "-vv"]).unwrap();
        assert_eq!(app.verbose, 2);
        match app.cmd {
            Commands::Split(arg) => {
                assert_eq!(arg.file, PathBuf::from("game.zip"));
                assert_eq!(arg.chunk_size, Some(50 * 1024 * 1024));
                assert_eq!(arg.tag.as_deref(), Some("0.28"));
                assert!(arg.output_dir.is_none());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_fetch_reassemble_flag_forms() {
        let parse = |extra: &[&str]| {
            let mut argv = vec!["chunkwise", "fetch", "https://b/m.json"];
            argv.extend_from_slice(extra);
            match App::try_parse_from(argv).unwrap().cmd {
                Commands::Fetch(arg) => arg.reassemble,
                other => panic!("unexpected {other:?}"),
            }
        };
        assert_eq!(parse(&[]), None);
        assert_eq!(parse(&["--reassemble"]), Some(None));
        assert_eq!(parse(&["--reassemble", "out.zip"]), Some(Some(PathBuf::from("out.zip"))));
    }

    #[test]
    fn test_bad_size_and_checksum_rejected() {
        assert!(App::try_parse_from(["chunkwise", "split", "f", "-s", "12Q"]).is_err());
        assert!(App::try_parse_from(["chunkwise", "reassemble", "m.json", "--expect", "abc"]).is_err());
    }
}
