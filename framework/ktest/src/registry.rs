//! Test registry: test cases collected into named suites.
//!
//! Cases arrive two ways, both landing in the same [`Registry`]:
//! - statically, through [`register_test!`](crate::register_test), which puts a
//!   [`TestDescriptor`] into the [`REGISTERED_TESTS`] link-time slice. No code
//!   runs to register, so it is safe before anything else in the process.
//! - at runtime, through [`Registry::register`].
//!
//! Suites are created on the first case naming them and never removed.

use rustc_hash::FxHashMap;

use crate::result::TestOutcome;

/// Setup, body and teardown callbacks all have this shape.
pub type TestFn = fn();

/// Suite run predicate: `false` skips the suite.
pub type SuitePredicate = fn() -> bool;

/// Callback that does nothing, for absent setup or teardown.
pub fn noop() {}

/// A statically registered test, as stored in [`REGISTERED_TESTS`].
#[derive(Clone, Copy, Debug)]
pub struct TestDescriptor {
    pub suite: &'static str,
    pub name: &'static str,
    pub setup: TestFn,
    pub body: TestFn,
    pub teardown: TestFn,
    /// Source position of the `register_test!` call.
    pub file: &'static str,
    pub line: u32,
}

/// Every test registered with [`register_test!`](crate::register_test) in the
/// final binary.
#[linkme::distributed_slice]
#[allow(unsafe_code, reason = "linkme places elements with #[link_section]")]
pub static REGISTERED_TESTS: [TestDescriptor];

/// Order in which cases of a suite are kept and run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RegistrationOrder {
    /// Oldest registration first.
    #[default]
    Forward,
    /// Newest registration first.
    Reverse,
}

/// A single test: setup/body/teardown triple plus its last outcome.
#[derive(Clone, Debug)]
pub struct TestCase {
    suite: String,
    name: String,
    setup: TestFn,
    body: TestFn,
    teardown: TestFn,
    result: Option<TestOutcome>,
}

impl TestCase {
    /// A case with no setup or teardown.
    pub fn new(suite: impl Into<String>, name: impl Into<String>, body: TestFn) -> Self {
        TestCase {
            suite: suite.into(),
            name: name.into(),
            setup: noop,
            body,
            teardown: noop,
            result: None,
        }
    }

    #[must_use]
    pub fn with_fixture(mut self, setup: TestFn, teardown: TestFn) -> Self {
        self.setup = setup;
        self.teardown = teardown;
        self
    }

    pub fn suite(&self) -> &str {
        &self.suite
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn setup(&self) -> TestFn {
        self.setup
    }

    pub fn body(&self) -> TestFn {
        self.body
    }

    pub fn teardown(&self) -> TestFn {
        self.teardown
    }

    /// Outcome of the most recent run; `None` if never run.
    pub fn result(&self) -> Option<&TestOutcome> {
        self.result.as_ref()
    }

    pub(crate) fn set_result(&mut self, outcome: TestOutcome) {
        self.result = Some(outcome);
    }

    /// `test_<suite>_<case>`.
    pub fn label(&self) -> String {
        crate::report::test_label(&self.suite, &self.name)
    }

    fn matches(&self, suite: Option<&str>, name: Option<&str>) -> bool {
        suite.map_or(true, |suite| self.suite == suite)
            && name.map_or(true, |name| self.name == name)
    }
}

impl From<&TestDescriptor> for TestCase {
    fn from(descriptor: &TestDescriptor) -> Self {
        TestCase::new(descriptor.suite, descriptor.name, descriptor.body)
            .with_fixture(descriptor.setup, descriptor.teardown)
    }
}

/// Named, ordered group of cases.
#[derive(Clone, Debug)]
pub struct TestSuite {
    name: String,
    cases: Vec<TestCase>,
    predicate: Option<SuitePredicate>,
}

impl TestSuite {
    fn new(name: &str) -> Self {
        TestSuite {
            name: name.to_string(),
            cases: Vec::new(),
            predicate: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cases(&self) -> &[TestCase] {
        &self.cases
    }

    /// Whether the suite should run now. Suites without a predicate always run.
    pub fn should_run(&self) -> bool {
        self.predicate.map_or(true, |predicate| predicate())
    }
}

/// Position of a case inside a [`Registry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct CaseId {
    pub(crate) suite: usize,
    pub(crate) case: usize,
}

/// All registered suites.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    suites: Vec<TestSuite>,
    index: FxHashMap<String, usize>,
    order: RegistrationOrder,
}

impl Registry {
    pub fn new() -> Self {
        Registry::default()
    }

    pub fn with_order(order: RegistrationOrder) -> Self {
        Registry {
            order,
            ..Registry::default()
        }
    }

    /// Registry holding every [`register_test!`](crate::register_test) case
    /// linked into this binary, in source order.
    pub fn from_registered(order: RegistrationOrder) -> Self {
        let mut registry = Registry::with_order(order);
        registry.register_descriptors(&REGISTERED_TESTS);
        tracing::debug!(
            suites = registry.suites.len(),
            cases = registry.len(),
            "loaded statically registered tests"
        );
        registry
    }

    /// Register `descriptors` ordered by file, then line.
    ///
    /// The linker lays out the slice in no particular order; sorting makes the
    /// static path register cases as written, like runtime registration.
    pub(crate) fn register_descriptors(&mut self, descriptors: &[TestDescriptor]) {
        let mut sorted: Vec<&TestDescriptor> = descriptors.iter().collect();
        sorted.sort_by_key(|descriptor| (descriptor.file, descriptor.line));
        for descriptor in sorted {
            self.register_case(TestCase::from(descriptor));
        }
    }

    pub fn order(&self) -> RegistrationOrder {
        self.order
    }

    /// Register a case, creating its suite on first use.
    pub fn register(
        &mut self,
        suite: &str,
        name: &str,
        setup: TestFn,
        body: TestFn,
        teardown: TestFn,
    ) {
        self.register_case(TestCase::new(suite, name, body).with_fixture(setup, teardown));
    }

    pub fn register_case(&mut self, case: TestCase) {
        let suite = self.suite_index_or_insert(&case.suite);
        let cases = &mut self.suites[suite].cases;
        match self.order {
            RegistrationOrder::Forward => cases.push(case),
            RegistrationOrder::Reverse => cases.insert(0, case),
        }
    }

    /// Gate a suite on `predicate`. Creates the suite if it has no cases yet.
    pub fn set_suite_predicate(&mut self, suite: &str, predicate: SuitePredicate) {
        let index = self.suite_index_or_insert(suite);
        self.suites[index].predicate = Some(predicate);
    }

    fn suite_index_or_insert(&mut self, name: &str) -> usize {
        if let Some(&index) = self.index.get(name) {
            return index;
        }
        let index = self.suites.len();
        self.suites.push(TestSuite::new(name));
        self.index.insert(name.to_string(), index);
        index
    }

    /// Suites in order of first registration.
    pub fn suites(&self) -> &[TestSuite] {
        &self.suites
    }

    pub fn suite(&self, name: &str) -> Option<&TestSuite> {
        self.index.get(name).map(|&index| &self.suites[index])
    }

    /// Cases whose suite and name equal the given ones. `None` matches anything.
    pub fn filter(&self, suite: Option<&str>, name: Option<&str>) -> Vec<&TestCase> {
        self.filter_ids(suite, name)
            .into_iter()
            .map(|id| self.case(id))
            .collect()
    }

    /// Number of registered cases.
    pub fn len(&self) -> usize {
        self.suites.iter().map(|suite| suite.cases.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn filter_ids(&self, suite: Option<&str>, name: Option<&str>) -> Vec<CaseId> {
        self.suites
            .iter()
            .enumerate()
            .flat_map(|(suite_index, test_suite)| {
                test_suite
                    .cases
                    .iter()
                    .enumerate()
                    .filter(move |(_, case)| case.matches(suite, name))
                    .map(move |(case_index, _)| CaseId {
                        suite: suite_index,
                        case: case_index,
                    })
            })
            .collect()
    }

    pub(crate) fn case(&self, id: CaseId) -> &TestCase {
        &self.suites[id.suite].cases[id.case]
    }

    pub(crate) fn case_mut(&mut self, id: CaseId) -> &mut TestCase {
        &mut self.suites[id.suite].cases[id.case]
    }

    pub(crate) fn suite_at(&self, index: usize) -> &TestSuite {
        &self.suites[index]
    }
}
