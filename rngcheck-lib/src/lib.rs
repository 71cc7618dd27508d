#![doc = include_str!("../README.md")]

use crate::bitstream::StreamError;
use crate::special_functions::MathError;
use strum::{Display, EnumCount, EnumIter, EnumString};
use thiserror::Error;

// internal usage only
pub(crate) mod internals;

// public exports
pub mod bitstream;
pub mod fft;
pub mod special_functions;
pub mod suite;
pub mod tests;

pub use bitstream::{BitBuffer, BitView, BitViewMut};
pub use strum::IntoEnumIterator;
pub use suite::{Execution, TestSuite};
pub use tests::RandomnessTest;

// shared data structures

/// How many bits a byte has
const BYTE_SIZE: usize = 8;

/// The significance level used when none is configured.
pub const DEFAULT_ALPHA: f64 = 0.01;

/// All test kinds. The order is the order in which a [TestSuite] runs and reports its tests.
///
/// The first eleven kinds are the core battery registered by [TestSuite::add_all], the others are
/// opt-in.
#[derive(
    Copy,
    Clone,
    Debug,
    Hash,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    EnumIter,
    EnumCount,
    Display,
    EnumString,
)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
#[repr(u8)]
pub enum TestKind {
    /// See [tests::frequency].
    Frequency = 0,
    /// See [tests::block_frequency].
    BlockFrequency = 1,
    /// See [tests::runs].
    Runs = 2,
    /// See [tests::longest_run_of_ones].
    LongestRunOfOnes = 3,
    /// See [tests::cumulative_sums].
    CumulativeSumForward = 4,
    /// See [tests::cumulative_sums].
    CumulativeSumReverse = 5,
    /// See [tests::binary_matrix_rank].
    Rank = 6,
    /// See [tests::maurers_universal_statistical].
    Universal = 7,
    /// See [tests::serial_and_approximate_entropy::approximate_entropy].
    ApproximateEntropy = 8,
    /// See [tests::serial_and_approximate_entropy::serial].
    Serial = 9,
    /// See [tests::spectral_dft].
    DiscreteFourierTransform = 10,
    /// See [tests::template_matching::non_overlapping].
    NonOverlappingTemplateMatching = 11,
    /// See [tests::template_matching::overlapping].
    OverlappingTemplateMatching = 12,
    /// See [tests::random_excursions].
    RandomExcursions = 13,
    /// See [tests::random_excursions_variant].
    RandomExcursionsVariant = 14,
    /// See [tests::linear_complexity].
    LinearComplexity = 15,
}

impl TestKind {
    /// If the kind belongs to the core battery, see [TestSuite::add_all].
    pub fn is_core(self) -> bool {
        self <= TestKind::DiscreteFourierTransform
    }
}

/// Why an evaluation (or a suite run) did not produce a trustworthy verdict.
#[derive(Copy, Clone, Debug, Default, Hash, Eq, PartialEq, EnumIter, Display)]
pub enum ErrorKind {
    #[default]
    NoError,
    /// More than one kind of error happened in the same suite run.
    MultipleErrors,
    InsufficientMemory,
    PValueOutOfRange,
    InsufficientNumberOfBits,
    EstimationCriteriaNotMet,
    /// The configured block length is above the recommended maximum for the stream length.
    ResultsInaccurate,
    /// The block length `L` of the universal test or its derived counts are invalid.
    LOrQOutOfRange,
    MathematicianNAN,
    /// The stream is too short for the configured longest-run regime.
    LongRunsCaseError,
    MathematicalFunctionsError,
    /// The configuration does not fit the computation, e.g. an unsupported template length.
    InvalidParameter,
}

/// A single p-value, as produced by all tests.
#[derive(Clone, Debug, PartialEq)]
pub struct TestResult {
    p_value: f64,
    comment: Option<String>,
}

// private methods
impl TestResult {
    /// A new test result without comment.
    fn new(p_value: f64) -> Self {
        Self {
            p_value,
            comment: None,
        }
    }

    /// A new test result with a comment.
    fn new_with_comment(p_value: f64, comment: impl Into<String>) -> Self {
        Self {
            p_value,
            comment: Some(comment.into()),
        }
    }
}

// public methods
impl TestResult {
    /// The p_value (result of the test)
    pub fn p_value(&self) -> f64 {
        self.p_value
    }

    /// To determine if the test passed, based on the given threshold:
    /// The test passes if the [p_value](Self::p_value) is greater or equal to the given
    /// threshold.
    pub fn passed(&self, threshold: f64) -> bool {
        self.p_value >= threshold
    }

    /// Some tests leave a comment about the outcome, e.g. the state or template a p-value
    /// belongs to.
    pub fn comment(&self) -> Option<&str> {
        self.comment.as_deref()
    }
}

/// The outcome of the last evaluation of a test.
///
/// [is_random](Self::is_random) is only meaningful if [error](Self::error) is
/// [ErrorKind::NoError].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TestOutcome {
    p_value: f64,
    p_value2: Option<f64>,
    results: Vec<TestResult>,
    is_random: bool,
    error: ErrorKind,
}

impl TestOutcome {
    /// The primary p-value. For tests with several statistics this is the smallest one.
    pub fn p_value(&self) -> f64 {
        self.p_value
    }

    /// The secondary p-value, only set by the serial test.
    pub fn p_value2(&self) -> Option<f64> {
        self.p_value2
    }

    /// Every individual p-value, with comments where it helps to tell them apart.
    pub fn results(&self) -> &[TestResult] {
        &self.results
    }

    pub fn is_random(&self) -> bool {
        self.is_random
    }

    pub fn error(&self) -> ErrorKind {
        self.error
    }
}

/// The error type for all tests
#[derive(Error, Debug)]
pub enum Error {
    /// A numeric overflow happened. The String gives further information on where exactly.
    #[error("Overflow in {0}.")]
    Overflow(String),
    #[error("Result is not a number.")]
    NaN,
    #[error("Result is infinite.")]
    Infinite,
    #[error(transparent)]
    Math(#[from] MathError),
    #[error("Invalid Parameter: {0}")]
    InvalidParameter(String),
    #[error("Not enough bits: at least {needed} are necessary, got {got}.")]
    InsufficientBits { needed: usize, got: usize },
    #[error("Estimation criteria not met: {0}")]
    EstimationCriteriaNotMet(String),
    #[error("Block length or initialization blocks out of range: {0}")]
    LOrQOutOfRange(String),
    #[error("Longest run regime does not fit: {0}")]
    LongRunsCase(String),
    #[error("Could not allocate {0} bytes of working memory.")]
    InsufficientMemory(usize),
    #[error(transparent)]
    Stream(#[from] StreamError),
}

impl Error {
    /// The [ErrorKind] an evaluation reports when it fails with this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::NaN => ErrorKind::MathematicianNAN,
            Error::Overflow(_) | Error::Infinite | Error::Math(_) => {
                ErrorKind::MathematicalFunctionsError
            }
            Error::InsufficientBits { .. } => ErrorKind::InsufficientNumberOfBits,
            Error::InvalidParameter(_) | Error::Stream(_) => ErrorKind::InvalidParameter,
            Error::EstimationCriteriaNotMet(_) => ErrorKind::EstimationCriteriaNotMet,
            Error::LOrQOutOfRange(_) => ErrorKind::LOrQOutOfRange,
            Error::LongRunsCase(_) => ErrorKind::LongRunsCaseError,
            Error::InsufficientMemory(_) => ErrorKind::InsufficientMemory,
        }
    }
}

/// Sets the maximum of threads used by the library. This function can only be called ONCE and
/// only BEFORE the first test runs. If not used, the number of logical CPUs is used.
///
/// If called multiple times, with 0, or after the first test, an error is returned.
pub fn set_max_threads(max_threads: usize) -> Result<(), Error> {
    if max_threads == 0 {
        return Err(Error::InvalidParameter(
            "the thread count must be at least 1".to_owned(),
        ));
    }

    internals::MAX_THREADS.set(max_threads).map_err(|_| {
        Error::InvalidParameter("the thread count is already fixed".to_owned())
    })
}

/// Returns the minimum input length, in bits, for the specified test in its default
/// configuration.
pub fn minimum_length_for(kind: TestKind) -> usize {
    tests::create(kind).minimum_length()
}
