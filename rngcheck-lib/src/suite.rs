//! The test suite: a set of configured tests that are run together on the same stream.
//!
//! Every [TestKind] can be registered at most once. The suite evaluates its tests in ascending
//! kind order (or in parallel, see [Execution]) and aggregates their outcomes: the suite is random
//! only if every test is, the first failing test and the first error are recorded.

use crate::internals::install;
use crate::tests::{create, RandomnessTest};
use crate::{BitView, Error, ErrorKind, TestKind, DEFAULT_ALPHA};
use rayon::prelude::*;
use std::collections::BTreeMap;
use strum::{Display, EnumString, IntoEnumIterator};

/// How [TestSuite::run_all] evaluates the tests.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Hash, Display, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum Execution {
    /// One test after the other, in ascending kind order.
    #[default]
    Sequential,
    /// All tests at once on the library thread pool, see [crate::set_max_threads].
    /// The aggregation still happens in kind order, the results are the same as for
    /// [Execution::Sequential].
    Parallel,
}

/// A set of tests, at most one per [TestKind].
pub struct TestSuite {
    tests: BTreeMap<TestKind, Box<dyn RandomnessTest>>,
    alpha: f64,
    execution: Execution,
    // the state of the last run
    is_random: bool,
    error: ErrorKind,
    error_test: Option<TestKind>,
    error_count: usize,
    first_failing_test: Option<TestKind>,
}

impl Default for TestSuite {
    fn default() -> Self {
        Self {
            tests: BTreeMap::new(),
            alpha: DEFAULT_ALPHA,
            execution: Execution::default(),
            is_random: false,
            error: ErrorKind::NoError,
            error_test: None,
            error_count: 0,
            first_failing_test: None,
        }
    }
}

impl std::fmt::Debug for TestSuite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestSuite")
            .field("tests", &self.tests.keys().collect::<Vec<_>>())
            .field("alpha", &self.alpha)
            .field("execution", &self.execution)
            .field("is_random", &self.is_random)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl TestSuite {
    /// An empty suite.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty suite with the given execution mode.
    pub fn with_execution(execution: Execution) -> Self {
        Self {
            execution,
            ..Self::default()
        }
    }

    pub fn execution(&self) -> Execution {
        self.execution
    }

    pub fn set_execution(&mut self, execution: Execution) {
        self.execution = execution;
    }

    /// Registers the test in its default configuration. Returns false if the kind is already
    /// registered, the present instance is kept.
    pub fn add(&mut self, kind: TestKind) -> bool {
        self.add_instance(create(kind)).is_ok()
    }

    /// Registers an already configured test. The suite alpha is applied to it.
    /// If a test of the same kind is already registered, the passed instance is returned.
    pub fn add_instance(
        &mut self,
        mut test: Box<dyn RandomnessTest>,
    ) -> Result<(), Box<dyn RandomnessTest>> {
        let kind = test.kind();
        if self.tests.contains_key(&kind) {
            log::debug!("suite: {kind} is already registered");
            return Err(test);
        }

        // the suite alpha was validated when it was set
        if test.set_alpha(self.alpha).is_err() {
            log::warn!("suite: could not apply alpha {} to {kind}", self.alpha);
        }
        self.tests.insert(kind, test);
        Ok(())
    }

    /// Registers every core test that is not yet registered: Frequency up to and including
    /// DiscreteFourierTransform (see [TestKind::is_core]).
    pub fn add_all(&mut self) {
        for kind in TestKind::iter().filter(|kind| kind.is_core()) {
            self.add(kind);
        }
    }

    /// Removes the test and returns it.
    pub fn remove(&mut self, kind: TestKind) -> Option<Box<dyn RandomnessTest>> {
        self.tests.remove(&kind)
    }

    pub fn remove_all(&mut self) {
        self.tests.clear();
    }

    pub fn exists(&self, kind: TestKind) -> bool {
        self.tests.contains_key(&kind)
    }

    pub fn get(&self, kind: TestKind) -> Option<&dyn RandomnessTest> {
        self.tests.get(&kind).map(|test| test.as_ref())
    }

    pub fn get_mut(&mut self, kind: TestKind) -> Option<&mut (dyn RandomnessTest + 'static)> {
        self.tests.get_mut(&kind).map(|test| test.as_mut())
    }

    /// The count of registered tests.
    pub fn instantiated_count(&self) -> usize {
        self.tests.len()
    }

    /// The registered kinds, in ascending order.
    pub fn kinds(&self) -> impl Iterator<Item = TestKind> + '_ {
        self.tests.keys().copied()
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Sets the significance level for every registered test and every test added later.
    pub fn set_alpha(&mut self, alpha: f64) -> Result<(), Error> {
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(Error::InvalidParameter(format!(
                "alpha must be inside (0, 1), is {alpha}"
            )));
        }

        self.alpha = alpha;
        self.tests
            .values_mut()
            .try_for_each(|test| test.set_alpha(alpha))
    }

    /// Resets every test and the state of the last run.
    pub fn initialize(&mut self) {
        self.tests.values_mut().for_each(|test| test.initialize());
        self.reset();
    }

    /// The largest [minimum length](RandomnessTest::minimum_length) of all registered tests,
    /// 0 for an empty suite.
    pub fn minimum_length(&self) -> usize {
        self.minimum_length_test()
            .and_then(|kind| self.get(kind))
            .map_or(0, |test| test.minimum_length())
    }

    /// The first test (in kind order) that needs [Self::minimum_length] bits.
    pub fn minimum_length_test(&self) -> Option<TestKind> {
        self.tests
            .iter()
            .rev()
            .max_by_key(|(_, test)| test.minimum_length())
            .map(|(&kind, _)| kind)
    }

    /// Evaluates every registered test and returns the aggregated verdict.
    pub fn run_all(&mut self, data: &BitView<'_>) -> bool {
        log::info!(
            "suite: running {} tests ({}) on {} bits",
            self.tests.len(),
            self.execution,
            data.len()
        );
        self.warn_if_too_short(data);

        match self.execution {
            Execution::Sequential => {
                for test in self.tests.values_mut() {
                    test.evaluate(data);
                }
            }
            Execution::Parallel => install(|| {
                self.tests.par_iter_mut().for_each(|(_, test)| {
                    test.evaluate(data);
                })
            }),
        }

        let evaluated = self.tests.keys().copied().collect::<Vec<_>>();
        self.aggregate(&evaluated)
    }

    /// Evaluates the registered tests in kind order until the first one is not random. The later
    /// tests keep their previous outcome and are not part of the aggregation.
    pub fn run_until_first_failure(&mut self, data: &BitView<'_>) -> bool {
        log::info!(
            "suite: running up to {} tests on {} bits, stopping at the first failure",
            self.tests.len(),
            data.len()
        );
        self.warn_if_too_short(data);

        let mut evaluated = Vec::with_capacity(self.tests.len());
        for (&kind, test) in self.tests.iter_mut() {
            evaluated.push(kind);
            if !test.evaluate(data) {
                break;
            }
        }
        self.aggregate(&evaluated)
    }

    /// The verdict of the last run. An empty suite, or one that was not run, is not random.
    pub fn is_random(&self) -> bool {
        self.is_random
    }

    /// The error of the last run: the first error that occurred, or
    /// [ErrorKind::MultipleErrors] if tests reported different kinds of errors.
    pub fn error(&self) -> ErrorKind {
        self.error
    }

    /// The first test (in kind order) that reported an error.
    pub fn error_test(&self) -> Option<TestKind> {
        self.error_test
    }

    /// The count of tests that reported an error.
    pub fn error_count(&self) -> usize {
        self.error_count
    }

    /// The first test (in kind order) that was not random.
    pub fn first_failing_test(&self) -> Option<TestKind> {
        self.first_failing_test
    }

    fn reset(&mut self) {
        self.is_random = false;
        self.error = ErrorKind::NoError;
        self.error_test = None;
        self.error_count = 0;
        self.first_failing_test = None;
    }

    /// Combines the outcomes of the evaluated tests, in kind order.
    fn aggregate(&mut self, evaluated: &[TestKind]) -> bool {
        self.reset();
        let mut is_random = !evaluated.is_empty();

        for kind in evaluated {
            let Some(test) = self.tests.get(kind) else {
                continue;
            };

            if !test.is_random() {
                is_random = false;
                self.first_failing_test.get_or_insert(*kind);
            }

            let error = test.error();
            if error != ErrorKind::NoError {
                self.error_count += 1;
                match self.error_test {
                    None => {
                        self.error = error;
                        self.error_test = Some(*kind);
                    }
                    Some(_) if self.error != error => self.error = ErrorKind::MultipleErrors,
                    Some(_) => (),
                }
            }
        }

        self.is_random = is_random;
        match self.first_failing_test {
            Some(kind) => log::info!(
                "suite: not random, first failing test: {kind}, error: {}",
                self.error
            ),
            None if is_random => log::info!("suite: random"),
            None => log::info!("suite: no test was run"),
        }
        is_random
    }

    fn warn_if_too_short(&self, data: &BitView<'_>) {
        if let Some(kind) = self.minimum_length_test() {
            let minimum_length = self.minimum_length();
            if data.len() < minimum_length {
                log::warn!(
                    "suite: {} bits are fewer than the {minimum_length} bits {kind} needs",
                    data.len()
                );
            }
        }
    }
}
