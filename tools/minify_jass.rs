extern crate jass_min;

use clap::{ArgAction, Parser};
use jass_min::{MinifyOpts, minify_jass};
use jass_min::error::{MinifyErr};
use jass_min::external::{load_table};
use log::{LevelFilter};

use std::fs;
use std::path::{PathBuf};

/// Minify a JASS map script
#[derive(Parser)]
#[clap(version, long_about = None)]
struct Cli {
  #[clap(value_parser, value_name = "INPUT")]
  input: PathBuf,
  #[clap(value_parser, value_name = "OUTPUT")]
  output: PathBuf,
  /// Table of external constants to inline
  #[clap(long, value_name = "FILE", default_value = "jass_constants.j")]
  constants: PathBuf,
  /// Table of external functions to inline
  #[clap(long, value_name = "FILE", default_value = "jass_functions.j")]
  functions: PathBuf,
  /// Keep this function and its name, like `main` and `config`
  #[clap(long, value_name = "NAME")]
  keep: Vec<String>,
  /// Log more (-v, -vv, -vvv)
  #[clap(short, long, action = ArgAction::Count)]
  verbose: u8,
}

fn init_logging(verbose: u8) {
  let level = match verbose {
    0 => LevelFilter::Warn,
    1 => LevelFilter::Info,
    2 => LevelFilter::Debug,
    _ => LevelFilter::Trace,
  };
  let mut builder = env_logger::Builder::new();
  builder.filter_level(level).format_timestamp(None);
  if let Ok(filters) = std::env::var("RUST_LOG") {
    builder.parse_filters(&filters);
  }
  builder.init();
}

fn main() -> miette::Result<()> {
  let Cli{input, output, constants, functions, keep, verbose} = Cli::parse();
  init_logging(verbose);
  let src = fs::read_to_string(&input)
    .map_err(|source| MinifyErr::Io{path: input.clone(), source})?;
  let opts = MinifyOpts{
    entries:    keep,
    functions:  load_table(&functions)?,
    constants:  load_table(&constants)?,
  };
  let out = minify_jass(&src, &opts)?;
  fs::write(&output, &out.text)
    .map_err(|source| MinifyErr::Io{path: output.clone(), source})?;
  println!("{}", out.report);
  Ok(())
}
