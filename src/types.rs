use std::fmt;

/// Lifecycle of one of the three supervised state machines (application,
/// output parser, test suite).
///
/// The variants are declared in lifecycle order, so `state >= Running`
/// reads as "has started".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum LifecycleState {
    #[default]
    Idle,
    Running,
    Completed,
}

impl LifecycleState {
    pub fn has_started(self) -> bool {
        self >= LifecycleState::Running
    }
}

/// How a run attempt ended. Only meaningful once the suite is `Completed`.
///
/// Most recent write wins: the watchdog paths set the classification right
/// before handing over to the abort sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ExitClassification {
    #[default]
    Unset,
    AllTestsPassed,
    TestsFailed,
    TestTimeout,
    AppCrashed,
    SimulatorCrashed,
}

/// Exit code for failures of testwatch itself (bad config, spawn error),
/// kept apart from every [`ExitClassification::exit_code`].
pub const ERROR_EXIT_CODE: i32 = 6;

impl ExitClassification {
    /// Process exit code used by the CLI.
    pub fn exit_code(self) -> i32 {
        match self {
            ExitClassification::AllTestsPassed => 0,
            ExitClassification::TestsFailed => 1,
            ExitClassification::TestTimeout => 2,
            ExitClassification::AppCrashed => 3,
            ExitClassification::SimulatorCrashed => 4,
            ExitClassification::Unset => 5,
        }
    }
}

impl fmt::Display for ExitClassification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExitClassification::Unset => "unset",
            ExitClassification::AllTestsPassed => "all tests passed",
            ExitClassification::TestsFailed => "tests failed",
            ExitClassification::TestTimeout => "test timeout",
            ExitClassification::AppCrashed => "app crashed",
            ExitClassification::SimulatorCrashed => "simulator crashed",
        };
        f.write_str(s)
    }
}

/// A single test case, identified by its class and test name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TestIdentity {
    pub name: String,
    pub class: String,
}

impl TestIdentity {
    pub fn new(name: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            class: class.into(),
        }
    }

    /// `"class/name"`, the form stored in the executed set and skip list.
    pub fn key(&self) -> String {
        test_key(&self.name, &self.class)
    }
}

impl fmt::Display for TestIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.class, self.name)
    }
}

pub fn test_key(name: &str, class: &str) -> String {
    format!("{class}/{name}")
}
