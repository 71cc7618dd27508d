use anyhow::Context;
use clap::Parser;
use rngcheck_cmd::cmd_args::CmdArgs;
use rngcheck_cmd::csv::CsvFile;
use rngcheck_cmd::toml_config::TomlConfig;
use rngcheck_cmd::valid_arg::ValidatedConfig;
use rngcheck_cmd::InputFormat;
use rngcheck_lib::bitstream::Unit;
use rngcheck_lib::{BitBuffer, ErrorKind, RandomnessTest, TestKind, TestSuite};
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use std::process::ExitCode;
use std::time::Instant;

/// Main function.
///
/// Prints the test results to stdout. The exit code is 0 if the input passed every selected test,
/// 1 if it did not, and 2 on invalid arguments or I/O errors.
///
/// This program takes some arguments and an optional config file, use `--help`.
fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::from(2)
        }
    }
}

/// Returns the verdict of the suite.
fn run() -> anyhow::Result<bool> {
    let args = CmdArgs::parse();

    // parse configuration
    let toml = args.config.as_deref().map(TomlConfig::from_path).transpose()?;
    let config = ValidatedConfig::new(args, toml)?;

    if let Some(threads) = config.threads {
        rngcheck_lib::set_max_threads(threads.get()).context("Failed to set the thread count")?;
    }

    println!("Reading input file: \"{}\"", config.input_file.display());
    let input = read_input(&config)?;
    println!("Testing {} bits", input.len());
    println!();

    let mut suite = config.build_suite(input.len())?;
    if suite.instantiated_count() == 0 {
        anyhow::bail!("None of the selected tests can run on {} bits", input.len());
    }

    let begin = Instant::now();
    let verdict = if config.stop_on_failure {
        suite.run_until_first_failure(&input.view())
    } else {
        suite.run_all(&input.view())
    };
    let time_as_ms = (begin.elapsed().as_micros() as f64) / 1000.0;

    print_results(&suite);

    if let Some(path) = &config.output_path {
        let mut csv_file = CsvFile::new(path)
            .with_context(|| format!("Failed to create output file \"{}\"", path.display()))?;
        csv_file
            .write_suite(&suite)
            .with_context(|| format!("Failed to write output file \"{}\"", path.display()))?;
    }

    println!();
    if verdict {
        println!("Summary: all tests passed ({time_as_ms}ms)");
    } else {
        match (suite.first_failing_test(), suite.error()) {
            (Some(test), ErrorKind::NoError) => {
                println!("Summary: not random, first failing test: {test} ({time_as_ms}ms)")
            }
            (Some(test), error) => println!(
                "Summary: not random, first failing test: {test}, error: {error} ({time_as_ms}ms)"
            ),
            (None, _) => println!("Summary: no test was run"),
        }
    }

    Ok(verdict)
}

/// Reads and decodes the input file, cropped to the maximum length.
fn read_input(config: &ValidatedConfig) -> anyhow::Result<BitBuffer> {
    let path = config.input_file.as_path();
    let max_length = config.max_length.map(|length| length.get());

    let mut input = match config.input_format {
        InputFormat::Binary => {
            // read only the necessary amount of bytes
            let bytes = read_bytes(path, max_length.map(|length| length.div_ceil(8)))?;
            BitBuffer::from(bytes)
        }
        InputFormat::Hex => BitBuffer::from_hex_str(read_text(path)?.trim())
            .context("Input file is no valid hex string")?,
        InputFormat::Ascii => BitBuffer::from_ascii_str(read_text(path)?.trim())
            .context("Input file contains characters other than '0' or '1'")?,
        // have to read everything - necessary length is not determinable
        InputFormat::AsciiLossy => {
            let text = read_text(path)?;
            return Ok(match max_length {
                Some(length) => BitBuffer::from_ascii_str_lossy_with_max_length(&text, length),
                None => BitBuffer::from_ascii_str_lossy(&text),
            });
        }
    };

    if input.is_empty() {
        anyhow::bail!("Input file \"{}\" contains no bits", path.display());
    }
    if let Some(length) = max_length.filter(|&length| length < input.len()) {
        let surplus = input.len() - length;
        input
            .reduce_length(Unit::Bit, surplus)
            .context("Failed to crop the input")?;
    }
    Ok(input)
}

fn read_bytes(path: &Path, limit: Option<usize>) -> anyhow::Result<Vec<u8>> {
    let file = File::open(path)
        .with_context(|| format!("Failed to open input file \"{}\"", path.display()))?;

    let mut bytes = Vec::new();
    match limit {
        Some(limit) => file.take(limit as u64).read_to_end(&mut bytes),
        None => (&file).read_to_end(&mut bytes),
    }
    .with_context(|| format!("Failed to read input file \"{}\"", path.display()))?;
    Ok(bytes)
}

fn read_text(path: &Path) -> anyhow::Result<String> {
    fs::read_to_string(path)
        .with_context(|| format!("Failed to read input file \"{}\"", path.display()))
}

/// Print one line per test, tests with several p-values get an additional line per p-value.
fn print_results(suite: &TestSuite) {
    println!(
        "\t{:<35} {:>10} {:>10}  {:<6}  {}",
        "Test", "P-Value", "P-Value 2", "Result", "Error"
    );
    for kind in suite.kinds() {
        if let Some(test) = suite.get(kind) {
            print_test(kind, test);
        }
    }
}

fn print_test(kind: TestKind, test: &dyn RandomnessTest) {
    let name = kind.to_string();
    let outcome = test.outcome();
    let result = if outcome.is_random() { "PASSED" } else { "FAILED" };
    let error = match outcome.error() {
        ErrorKind::NoError => String::new(),
        error => error.to_string(),
    };

    if outcome.results().is_empty() {
        println!("\t{name:<35} {:>10} {:>10}  {result:<6}  {error}", "-", "");
        return;
    }

    let p_value2 = outcome
        .p_value2()
        .map(|p_value| format!("{p_value:.6}"))
        .unwrap_or_default();
    println!(
        "\t{name:<35} {:>10.6} {p_value2:>10}  {result:<6}  {error}",
        outcome.p_value()
    );

    if outcome.results().len() > 1 && outcome.p_value2().is_none() {
        for result in outcome.results() {
            println!(
                "\t  - {:<31} {:>10.6}",
                result.comment().unwrap_or(""),
                result.p_value()
            );
        }
    }
}
