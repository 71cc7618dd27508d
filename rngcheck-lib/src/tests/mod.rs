//! All NIST STS test implementations.
//!
//! Every test is available in two forms:
//!
//! * a stateless function (e.g. [frequency::frequency_test]) computing the statistics of a
//!   stream. It checks only what the computation itself needs, not the recommended minimum
//!   length;
//! * a configurable type implementing [RandomnessTest] (e.g. [frequency::Frequency]) that keeps
//!   the significance level, the outcome of the last evaluation and the statistics.
//!
//! Use [create] to get the default configuration of a test by its [TestKind].


pub use serial_and_approximate_entropy::{approximate_entropy, serial};

use crate::{BitView, Error, ErrorKind, TestKind, TestOutcome, TestResult, DEFAULT_ALPHA};
use std::any::Any;

/// Values within this distance outside of [0, 1] are rounding noise and get clamped.
const P_VALUE_TOLERANCE: f64 = 1e-12;

/// The common interface of all tests.
pub trait RandomnessTest: Send {
    fn kind(&self) -> TestKind;

    /// The smallest effective stream length (in bits) the test accepts in its current
    /// configuration.
    fn minimum_length(&self) -> usize;

    /// The significance level, [DEFAULT_ALPHA] unless changed.
    fn alpha(&self) -> f64;

    /// Sets the significance level. Values outside of (0, 1) are rejected.
    fn set_alpha(&mut self, alpha: f64) -> Result<(), Error>;

    /// The configured block or pattern length, if the test has one.
    fn block_length(&self) -> Option<usize> {
        None
    }

    /// Sets the block or pattern length. Tests without one always return
    /// [Error::InvalidParameter].
    fn set_block_length(&mut self, block_length: usize) -> Result<(), Error> {
        Err(Error::InvalidParameter(format!(
            "{} has no block length (tried to set {block_length})",
            self.kind()
        )))
    }

    /// Resets the outcome and the statistics. The configuration is kept.
    fn initialize(&mut self);

    /// Evaluates the stream, returning the verdict.
    ///
    /// A stream shorter than [Self::minimum_length] is not evaluated, the outcome reports
    /// [ErrorKind::InsufficientNumberOfBits]. Numerical problems are never returned or panicked,
    /// they are reported through [TestOutcome::error].
    fn evaluate(&mut self, data: &BitView<'_>) -> bool;

    fn outcome(&self) -> &TestOutcome;

    fn is_random(&self) -> bool {
        self.outcome().is_random()
    }

    fn error(&self) -> ErrorKind {
        self.outcome().error()
    }

    fn p_value(&self) -> f64 {
        self.outcome().p_value()
    }

    /// For [downcast_ref](dyn RandomnessTest::downcast_ref).
    fn as_any(&self) -> &dyn Any;

    /// For [downcast_mut](dyn RandomnessTest::downcast_mut).
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl dyn RandomnessTest {
    /// Access the concrete test type, e.g. to read its statistics.
    pub fn downcast_ref<T: RandomnessTest + 'static>(&self) -> Option<&T> {
        self.as_any().downcast_ref()
    }

    /// Access the concrete test type, e.g. to change test specific settings.
    pub fn downcast_mut<T: RandomnessTest + 'static>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut()
    }
}

/// Creates a test in its default configuration.
pub fn create(kind: TestKind) -> Box<dyn RandomnessTest> {
    match kind {
        TestKind::Frequency => Box::<frequency::Frequency>::default(),
        TestKind::BlockFrequency => Box::<block_frequency::BlockFrequency>::default(),
        TestKind::Runs => Box::<runs::Runs>::default(),
        TestKind::LongestRunOfOnes => Box::<longest_run_of_ones::LongestRunOfOnes>::default(),
        TestKind::CumulativeSumForward => Box::new(cumulative_sums::CumulativeSums::forward()),
        TestKind::CumulativeSumReverse => Box::new(cumulative_sums::CumulativeSums::reverse()),
        TestKind::Rank => Box::<binary_matrix_rank::Rank>::default(),
        TestKind::Universal => Box::<maurers_universal_statistical::Universal>::default(),
        TestKind::ApproximateEntropy => {
            Box::<approximate_entropy::ApproximateEntropy>::default()
        }
        TestKind::Serial => Box::<serial::Serial>::default(),
        TestKind::DiscreteFourierTransform => {
            Box::<spectral_dft::DiscreteFourierTransform>::default()
        }
        TestKind::NonOverlappingTemplateMatching => {
            Box::<template_matching::non_overlapping::NonOverlappingTemplateMatching>::default()
        }
        TestKind::OverlappingTemplateMatching => {
            Box::<template_matching::overlapping::OverlappingTemplateMatching>::default()
        }
        TestKind::RandomExcursions => Box::<random_excursions::RandomExcursions>::default(),
        TestKind::RandomExcursionsVariant => {
            Box::<random_excursions_variant::RandomExcursionsVariant>::default()
        }
        TestKind::LinearComplexity => Box::<linear_complexity::LinearComplexity>::default(),
    }
}

/// The p-values a computation produced.
#[derive(Clone, Debug)]
pub(crate) enum PValues {
    Single(TestResult),
    /// Primary and secondary p-value, both have to pass.
    Pair(TestResult, TestResult),
    /// The primary p-value is the smallest one, all have to pass.
    Many(Vec<TestResult>),
}

/// Statistics of a test that know their p-values.
pub(crate) trait Statistics {
    fn p_values(&self) -> PValues;
}

/// State every test carries: the significance level and the last outcome.
#[derive(Clone, Debug)]
pub(crate) struct TestState {
    alpha: f64,
    outcome: TestOutcome,
}

impl Default for TestState {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            outcome: TestOutcome::default(),
        }
    }
}

impl TestState {
    pub(crate) fn alpha(&self) -> f64 {
        self.alpha
    }

    pub(crate) fn set_alpha(&mut self, alpha: f64) -> Result<(), Error> {
        if alpha > 0.0 && alpha < 1.0 {
            self.alpha = alpha;
            Ok(())
        } else {
            Err(Error::InvalidParameter(format!(
                "alpha must be inside (0, 1), is {alpha}"
            )))
        }
    }

    pub(crate) fn outcome(&self) -> &TestOutcome {
        &self.outcome
    }

    pub(crate) fn reset(&mut self) {
        self.outcome = TestOutcome::default();
    }

    /// The evaluation skeleton shared by all tests: reset, check the length, compute, conclude.
    pub(crate) fn evaluate<S: Statistics>(
        &mut self,
        kind: TestKind,
        minimum_length: usize,
        data: &BitView<'_>,
        statistics: &mut Option<S>,
        compute: impl FnOnce() -> Result<S, Error>,
    ) -> bool {
        self.reset();
        *statistics = None;

        if data.len() < minimum_length {
            log::warn!(
                "{kind}: {} bits are not enough, at least {minimum_length} are necessary",
                data.len()
            );
            self.outcome.error = ErrorKind::InsufficientNumberOfBits;
            return false;
        }

        let computed = compute().map(|stats| {
            let p_values = stats.p_values();
            *statistics = Some(stats);
            p_values
        });
        self.conclude(kind, computed)
    }

    /// Stores the computed p-values (or the error) as the outcome and returns the verdict.
    pub(crate) fn conclude(&mut self, kind: TestKind, computed: Result<PValues, Error>) -> bool {
        let p_values = match computed {
            Ok(p_values) => p_values,
            Err(e) => {
                log::warn!("{kind}: {e}");
                self.outcome.error = e.kind();
                self.outcome.is_random = false;
                return false;
            }
        };

        let (mut results, pair) = match p_values {
            PValues::Single(result) => (vec![result], false),
            PValues::Pair(first, second) => (vec![first, second], true),
            PValues::Many(results) => (results, false),
        };

        let mut error = ErrorKind::NoError;
        for result in results.iter_mut() {
            if result.p_value.is_nan() {
                result.p_value = 0.0;
                error = merge(error, ErrorKind::MathematicianNAN);
            } else if (-P_VALUE_TOLERANCE..=1.0 + P_VALUE_TOLERANCE).contains(&result.p_value) {
                result.p_value = result.p_value.clamp(0.0, 1.0);
            } else {
                error = merge(error, ErrorKind::PValueOutOfRange);
            }
        }

        let p_value = if pair {
            results[0].p_value
        } else {
            results
                .iter()
                .map(TestResult::p_value)
                .reduce(f64::min)
                .unwrap_or(0.0)
        };

        let alpha = self.alpha;
        self.outcome = TestOutcome {
            p_value,
            p_value2: pair.then(|| results[1].p_value),
            is_random: error == ErrorKind::NoError
                && !results.is_empty()
                && results.iter().all(|result| result.passed(alpha)),
            results,
            error,
        };

        if error != ErrorKind::NoError {
            log::warn!("{kind}: {error}");
        }
        log::debug!(
            "{kind}: p-value {p_value}, random: {}",
            self.outcome.is_random
        );

        self.outcome.is_random
    }

    /// Flags a computed result as untrustworthy, e.g. because the configuration is outside of the
    /// recommended bounds. The p-values are kept, an earlier error is kept, the verdict is false.
    pub(crate) fn flag(&mut self, kind: TestKind, error: ErrorKind, reason: &str) {
        log::warn!("{kind}: {error}, {reason}");
        self.outcome.error = merge(self.outcome.error, error);
        self.outcome.is_random = false;
    }
}

/// Keeps the first error kind seen.
fn merge(current: ErrorKind, new: ErrorKind) -> ErrorKind {
    if current == ErrorKind::NoError {
        new
    } else {
        current
    }
}

/// Implements the [RandomnessTest] methods that only delegate to the `state: TestState` and
/// `statistics: Option<_>` fields of a test.
macro_rules! delegate_to_state {
    () => {
        fn alpha(&self) -> f64 {
            self.state.alpha()
        }

        fn set_alpha(&mut self, alpha: f64) -> Result<(), crate::Error> {
            self.state.set_alpha(alpha)
        }

        fn initialize(&mut self) {
            self.state.reset();
            self.statistics = None;
        }

        fn outcome(&self) -> &crate::TestOutcome {
            self.state.outcome()
        }

        fn as_any(&self) -> &dyn std::any::Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn std::any::Any {
            self
        }
    };
}

pub(crate) use delegate_to_state;
