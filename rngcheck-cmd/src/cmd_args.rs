//! Everything necessary for command line arguments.

use crate::{parse_test_kind, InputFormat};
use clap::{Args, Parser};
use rngcheck_lib::TestKind;
use std::num::NonZero;
use std::path::PathBuf;

/// The command line arguments.
#[derive(Debug, Parser)]
#[command(version, author, about, long_about = None)]
pub struct CmdArgs {
    /// Path to the input file.
    pub input: PathBuf,
    /// The input file format.
    #[arg(short = 'f', long, value_enum, default_value = "binary")]
    pub input_format: InputFormat,
    /// The maximum length of the sequence to test, in bits.
    #[arg(short = 'l', long)]
    pub max_length: Option<NonZero<usize>>,
    /// The tests to run. If neither this nor a configuration file selects tests, the core
    /// battery runs.
    #[command(flatten)]
    pub tests_to_run: TestsToRun,
    /// The significance level, 0.01 if unset.
    #[arg(short, long)]
    pub alpha: Option<f64>,
    /// Run the tests in parallel.
    #[arg(long)]
    pub parallel: bool,
    /// Stop at the first test that is not passed.
    #[arg(long)]
    pub stop_on_failure: bool,
    /// Path to an optional TOML configuration file. Command line arguments take precedence.
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Optional path to save the results to.
    ///
    /// The results are saved in CSV format with ';' delimiter and the following columns:
    /// test; p_value; p_value2; is_random; error; comment
    ///
    /// Tests with several p-values get one row per p-value.
    #[arg(short, long = "output")]
    pub output_path: Option<PathBuf>,
    /// The count of threads the tests may use. Defaults to the count of logical CPUs.
    #[arg(long)]
    pub threads: Option<NonZero<usize>>,
}

/// Which tests are to be run. Allows only one of these options to be used.
#[derive(Debug, Clone, Args)]
#[group(required = false, multiple = false)]
pub struct TestsToRun {
    /// Run only the specified tests, e.g. 'frequency,runs'.
    #[arg(short, long, value_delimiter = ',', value_parser = parse_test_kind)]
    pub tests: Option<Vec<TestKind>>,
    /// Run every available test, including the ones outside of the core battery.
    ///
    /// Tests whose input length requirements are not satisfied are skipped.
    #[arg(long)]
    pub all: bool,
}
