//! The building blocks of the command line application: arguments, the configuration file and
//! the CSV output.

use clap::ValueEnum;
use rngcheck_lib::{IntoEnumIterator, TestKind};
use serde::{Deserialize, Serialize};

pub mod cmd_args;
pub mod csv;
pub mod toml_config;
pub mod valid_arg;

/// The input file formats.
#[derive(Copy, Clone, Debug, Default, PartialEq, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InputFormat {
    /// Raw bytes. The first bit of each byte is its least significant one.
    #[default]
    Binary,
    /// Text of hexadecimal digits, the first digit of each pair is the high nibble.
    Hex,
    /// Text consisting of only '0' or '1'.
    Ascii,
    /// Text of any characters. Characters other than '0' or '1' are skipped.
    AsciiLossy,
}

/// Parses a test name like `block-frequency`, ignoring the case. Used both for command line
/// arguments and TOML.
pub fn parse_test_kind(name: &str) -> Result<TestKind, String> {
    name.trim().parse().map_err(|_| {
        let known = TestKind::iter()
            .map(|kind| kind.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        format!("unknown test \"{name}\", expected one of: {known}")
    })
}
