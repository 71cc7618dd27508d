//! Everything needed to save CSV results.

use core::error::Error;
use csv::WriterBuilder;
use rngcheck_lib::{ErrorKind, RandomnessTest, TestKind, TestSuite};
use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::fs::File;
use std::path::Path;

/// Error type for [CsvFile]
#[derive(Debug)]
pub enum CsvFileError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl Display for CsvFileError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CsvFileError::Io(e) => write!(f, "IO error: {e}"),
            CsvFileError::Csv(e) => write!(f, "CSV error: {e}"),
        }
    }
}

impl Error for CsvFileError {}

impl From<std::io::Error> for CsvFileError {
    fn from(value: std::io::Error) -> Self {
        CsvFileError::Io(value)
    }
}

impl From<csv::Error> for CsvFileError {
    fn from(value: csv::Error) -> Self {
        CsvFileError::Csv(value)
    }
}

/// One row of the CSV output.
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    test: &'a str,
    p_value: Option<f64>,
    p_value2: Option<f64>,
    is_random: bool,
    error: Option<String>,
    comment: &'a str,
}

/// This struct represents a CSV file to write the test outputs.
#[derive(Debug)]
pub struct CsvFile(csv::Writer<File>);

impl CsvFile {
    /// Create a new CSV File writer writing to the specified path.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, CsvFileError> {
        let mut builder = WriterBuilder::new();

        builder.delimiter(b';').has_headers(true);

        // target specific: on windows, lines should end with CRLF, on all other platforms, the default
        // LF is enough.
        #[cfg(target_family = "windows")]
        {
            use csv::Terminator;

            builder.terminator(Terminator::CRLF);
        }

        Ok(Self(builder.from_path(path)?))
    }

    /// Append the outcomes of all tests of the suite, in kind order.
    pub fn write_suite(&mut self, suite: &TestSuite) -> Result<(), CsvFileError> {
        for kind in suite.kinds() {
            if let Some(test) = suite.get(kind) {
                self.write_test(kind, test)?;
            }
        }
        self.0.flush()?;
        Ok(())
    }

    /// Append the outcome of a test. Tests with a secondary p-value or without any p-value get a
    /// single row, tests with several p-values one row per p-value.
    pub fn write_test(
        &mut self,
        kind: TestKind,
        test: &dyn RandomnessTest,
    ) -> Result<(), CsvFileError> {
        let name = kind.to_string();
        let outcome = test.outcome();
        let error = (outcome.error() != ErrorKind::NoError).then(|| outcome.error().to_string());

        let row = |p_value, p_value2, comment| CsvRow {
            test: &name,
            p_value,
            p_value2,
            is_random: outcome.is_random(),
            error: error.clone(),
            comment,
        };

        match outcome.results() {
            [] => self.0.serialize(row(None, None, ""))?,
            results if outcome.p_value2().is_some() || results.len() == 1 => self.0.serialize(row(
                Some(outcome.p_value()),
                outcome.p_value2(),
                results[0].comment().unwrap_or(""),
            ))?,
            results => {
                for result in results {
                    self.0.serialize(row(
                        Some(result.p_value()),
                        None,
                        result.comment().unwrap_or(""),
                    ))?;
                }
            }
        }

        Ok(())
    }
}
