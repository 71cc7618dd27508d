//! Struct and conversion method for a validated configuration.

use crate::cmd_args::CmdArgs;
use crate::toml_config::TomlConfig;
use crate::{parse_test_kind, InputFormat};
use anyhow::{anyhow, Context};
use rngcheck_lib::fft::FftBackend;
use rngcheck_lib::tests::spectral_dft::DiscreteFourierTransform;
use rngcheck_lib::tests::template_matching::non_overlapping::{
    NonOverlappingTemplateMatching, TemplateSelection,
};
use rngcheck_lib::tests::template_matching::overlapping::{
    OverlappingTemplateMatching, Probabilities,
};
use rngcheck_lib::tests::create;
use rngcheck_lib::{
    Execution, IntoEnumIterator, RandomnessTest, TestKind, TestSuite, DEFAULT_ALPHA,
};
use std::num::NonZero;
use std::path::PathBuf;

/// Which tests are to be run.
#[derive(Clone, Debug, PartialEq)]
pub enum TestsToRun {
    /// Exactly these tests, in kind order.
    AllowList(Vec<TestKind>),
    /// Every test the input is long enough for.
    All,
    /// Every core test the input is long enough for.
    Core,
}

/// Test specific settings, unset values keep the defaults of the library.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TestSettings {
    pub block_frequency: Option<usize>,
    pub approximate_entropy: Option<usize>,
    pub serial: Option<usize>,
    pub linear_complexity: Option<usize>,
    pub non_overlapping_template: Option<usize>,
    pub overlapping_template: Option<usize>,
    pub universal: Option<usize>,
    pub fft_backend: FftBackend,
    pub all_templates: bool,
    pub overlapping_probabilities: Probabilities,
}

impl TestSettings {
    fn block_length(&self, kind: TestKind) -> Option<usize> {
        match kind {
            TestKind::BlockFrequency => self.block_frequency,
            TestKind::ApproximateEntropy => self.approximate_entropy,
            TestKind::Serial => self.serial,
            TestKind::LinearComplexity => self.linear_complexity,
            TestKind::NonOverlappingTemplateMatching => self.non_overlapping_template,
            TestKind::OverlappingTemplateMatching => self.overlapping_template,
            TestKind::Universal => self.universal,
            _ => None,
        }
    }
}

/// A validated config with a valid state that can be used to run tests.
#[derive(Clone, Debug)]
pub struct ValidatedConfig {
    /// Path to the input file (random data)
    pub input_file: PathBuf,
    pub input_format: InputFormat,
    /// in bits
    pub max_length: Option<NonZero<usize>>,
    pub tests_to_run: TestsToRun,
    pub alpha: f64,
    pub execution: Execution,
    pub stop_on_failure: bool,
    /// An optional path to save the outputs to.
    pub output_path: Option<PathBuf>,
    pub threads: Option<NonZero<usize>>,
    pub settings: TestSettings,
}

impl ValidatedConfig {
    /// Merges the command line arguments and the optional configuration file. Command line
    /// arguments take precedence.
    pub fn new(args: CmdArgs, toml: Option<TomlConfig>) -> anyhow::Result<Self> {
        let CmdArgs {
            input,
            input_format,
            max_length,
            tests_to_run,
            alpha,
            parallel,
            stop_on_failure,
            config: _,
            output_path,
            threads,
        } = args;
        let toml = toml.unwrap_or_default();

        let alpha = alpha.or(toml.alpha).unwrap_or(DEFAULT_ALPHA);
        if !(alpha > 0.0 && alpha < 1.0) {
            return Err(anyhow!("alpha must be inside (0, 1), is {alpha}"));
        }

        let tests_to_run = if let Some(mut tests) = tests_to_run.tests {
            tests.sort();
            tests.dedup();
            TestsToRun::AllowList(tests)
        } else if tests_to_run.all {
            TestsToRun::All
        } else if let Some(names) = &toml.tests {
            let mut tests = names
                .iter()
                .map(|name| parse_test_kind(name))
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| anyhow!(e))
                .context("Config file: invalid value for tests")?;
            tests.sort();
            tests.dedup();
            TestsToRun::AllowList(tests)
        } else {
            TestsToRun::Core
        };

        let fft_backend = match &toml.fft_backend {
            Some(name) => name
                .parse()
                .map_err(|_| anyhow!("Config file: unknown fft_backend \"{name}\""))?,
            None => FftBackend::default(),
        };
        let overlapping_probabilities = match &toml.overlapping_probabilities {
            Some(name) => name.parse().map_err(|_| {
                anyhow!("Config file: unknown overlapping_probabilities \"{name}\"")
            })?,
            None => Probabilities::default(),
        };

        let settings = TestSettings {
            block_frequency: toml.block_frequency.map(NonZero::get),
            approximate_entropy: toml.approximate_entropy.map(NonZero::get),
            serial: toml.serial.map(NonZero::get),
            linear_complexity: toml.linear_complexity.map(NonZero::get),
            non_overlapping_template: toml.non_overlapping_template.map(NonZero::get),
            overlapping_template: toml.overlapping_template.map(NonZero::get),
            universal: toml.universal.map(NonZero::get),
            fft_backend,
            all_templates: toml.all_templates.unwrap_or(false),
            overlapping_probabilities,
        };

        Ok(Self {
            input_file: input,
            input_format,
            max_length,
            tests_to_run,
            alpha,
            execution: if parallel {
                Execution::Parallel
            } else {
                Execution::Sequential
            },
            stop_on_failure,
            output_path,
            threads,
            settings,
        })
    }

    /// Creates the test of the given kind with the configured settings.
    pub fn configure(&self, kind: TestKind) -> anyhow::Result<Box<dyn RandomnessTest>> {
        let mut test = create(kind);

        if let Some(block_length) = self.settings.block_length(kind) {
            test.set_block_length(block_length)
                .with_context(|| format!("Invalid block length for {kind}"))?;
        }
        if let Some(dft) = test.downcast_mut::<DiscreteFourierTransform>() {
            dft.set_backend(self.settings.fft_backend);
        }
        if let Some(templates) = test.downcast_mut::<NonOverlappingTemplateMatching>() {
            if self.settings.all_templates {
                templates
                    .set_selection(TemplateSelection::AllAperiodic)
                    .with_context(|| format!("Invalid template selection for {kind}"))?;
            }
        }
        if let Some(overlapping) = test.downcast_mut::<OverlappingTemplateMatching>() {
            overlapping.set_probabilities(self.settings.overlapping_probabilities);
        }

        Ok(test)
    }

    /// Builds the suite for an input of `bit_length` bits. Tests that were not selected
    /// explicitly are skipped if the input is too short for them.
    pub fn build_suite(&self, bit_length: usize) -> anyhow::Result<TestSuite> {
        let (kinds, skip_short): (Vec<TestKind>, bool) = match &self.tests_to_run {
            TestsToRun::AllowList(kinds) => (kinds.clone(), false),
            TestsToRun::All => (TestKind::iter().collect(), true),
            TestsToRun::Core => (TestKind::iter().filter(|kind| kind.is_core()).collect(), true),
        };

        let mut suite = TestSuite::with_execution(self.execution);
        suite.set_alpha(self.alpha).context("Invalid alpha")?;

        for kind in kinds {
            let test = self.configure(kind)?;
            if skip_short && test.minimum_length() > bit_length {
                log::warn!(
                    "skipping {kind}: it needs at least {} bits, the input has {bit_length}",
                    test.minimum_length()
                );
                continue;
            }
            suite
                .add_instance(test)
                .map_err(|_| anyhow!("{kind} is selected more than once"))?;
        }

        Ok(suite)
    }
}
