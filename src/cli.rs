use clap::{ArgAction, Parser};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "map2struct")]
#[command(
    about = "Generate Go functions that fill a struct from a map",
    long_about = "Scans a Go file for functions named with the configured prefix \
                  (MapTo by default) that take a map and return a struct, and writes \
                  a gen-prefixed implementation for each. Meant to run from go:generate."
)]
#[command(version)]
pub struct Cli {
    /// Go source file to scan; `go generate` provides it as $GOFILE
    #[arg(short, long, env = "GOFILE")]
    pub input: PathBuf,

    /// Output file (ending in .go) or directory; defaults to the input's directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Config file; by default .map2struct.toml is searched upwards from the input
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Function name prefix to look for, overriding the config
    #[arg(long)]
    pub prefix: Option<String>,

    /// Skip formatting the generated code
    #[arg(long = "no-format")]
    pub no_format: bool,

    /// Print the generated code instead of writing it
    #[arg(long)]
    pub stdout: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Input path without the quotes `go generate` may leave around it
    pub fn input_path(&self) -> PathBuf {
        trim_quotes(&self.input)
    }

    pub fn output_path(&self) -> Option<PathBuf> {
        self.output.as_deref().map(trim_quotes)
    }
}

fn trim_quotes(path: &std::path::Path) -> PathBuf {
    PathBuf::from(path.to_string_lossy().trim_matches('"'))
}
