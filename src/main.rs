mod common;
mod utils;
mod workflow;

use clap::Parser;
use log::error;
use std::path::PathBuf;

use crate::workflow::{flows::shrink_archive, processors::setup::initialize_logger};

/// Write a size-reduced copy of a photo/video export next to it.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Root folder of the export, e.g. path/to/google_photos_folder.
    root: PathBuf,
}

/// Exit status for a failed parse: 1 for usage errors, 0 for --help and --version.
fn parse_exit_code(err: &clap::Error) -> i32 {
    if err.use_stderr() { 1 } else { 0 }
}

fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            std::process::exit(parse_exit_code(&err));
        }
    };

    initialize_logger();

    if let Err(e) = shrink_archive(&args.root) {
        error!("{:?}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exit_code_for(argv: &[&str]) -> Option<i32> {
        Args::try_parse_from(std::iter::once("archive-shrink").chain(argv.iter().copied()))
            .err()
            .map(|err| parse_exit_code(&err))
    }

    #[test]
    fn wrong_argument_count_exits_with_one() {
        assert_eq!(exit_code_for(&[]), Some(1));
        assert_eq!(exit_code_for(&["a", "b"]), Some(1));
    }

    #[test]
    fn help_and_version_exit_with_zero() {
        assert_eq!(exit_code_for(&["--help"]), Some(0));
        assert_eq!(exit_code_for(&["--version"]), Some(0));
    }

    #[test]
    fn single_root_is_accepted() {
        let args = Args::try_parse_from(["archive-shrink", "/data/Takeout"]).unwrap();
        assert_eq!(args.root, PathBuf::from("/data/Takeout"));
        assert_eq!(exit_code_for(&["/data/Takeout"]), None);
    }
}
