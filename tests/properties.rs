// tests/properties.rs

mod common;
use crate::common::{RunConfigBuilder, app_crashed, began, failed, output, passed};

use std::collections::HashSet;

use proptest::prelude::*;
use testwatch::engine::{CoreCommand, MonitorEvent, OutputCheck};
use testwatch::skip::SkipList;
use testwatch::types::{ExitClassification, TestIdentity};

const NAMES: [&str; 3] = ["t1", "t2", "t3"];
const CLASSES: [&str; 2] = ["A", "B"];

#[derive(Debug, Clone)]
enum Step {
    Launch,
    AllBegan,
    AllEnded,
    Began(usize, usize),
    Passed(usize, usize),
    Failed(usize, usize),
    Output,
    Crash,
    TestDeadline(usize, usize),
    /// Fire the most recently armed output deadline.
    OutputDeadline,
}

fn identity() -> impl Strategy<Value = (usize, usize)> {
    (0..NAMES.len(), 0..CLASSES.len())
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        Just(Step::Launch),
        Just(Step::AllBegan),
        Just(Step::AllEnded),
        identity().prop_map(|(n, c)| Step::Began(n, c)),
        identity().prop_map(|(n, c)| Step::Passed(n, c)),
        identity().prop_map(|(n, c)| Step::Failed(n, c)),
        Just(Step::Output),
        Just(Step::Crash),
        identity().prop_map(|(n, c)| Step::TestDeadline(n, c)),
        Just(Step::OutputDeadline),
    ]
}

proptest! {
    #[test]
    fn failure_count_is_number_of_distinct_failed_tests(
        failures in proptest::collection::vec(identity(), 0..20)
    ) {
        let (mut monitor, _stats) = RunConfigBuilder::new().build_monitor();
        let mut distinct = HashSet::new();

        for (n, c) in failures {
            monitor.step(began(NAMES[n], CLASSES[c]));
            monitor.step(failed(NAMES[n], CLASSES[c]));
            distinct.insert((n, c));
        }

        prop_assert_eq!(monitor.failure_count(), distinct.len());
    }

    #[test]
    fn abort_fires_at_most_once_and_freezes_the_outcome(
        steps in proptest::collection::vec(step_strategy(), 1..40)
    ) {
        let skip = SkipList::new();
        let (mut monitor, _stats) = RunConfigBuilder::new().skip_list(skip.clone()).build_monitor();
        let mut last_check: Option<OutputCheck> = None;
        let mut notifications = 0;
        let mut terminations = 0;
        let mut frozen: Option<ExitClassification> = None;
        let mut skip_len = 0;

        for step in steps {
            let event = match step {
                Step::Launch => MonitorEvent::ApplicationLaunched { pid: 1234 },
                Step::AllBegan => MonitorEvent::AllTestsBegan,
                Step::AllEnded => MonitorEvent::AllTestsEnded,
                Step::Began(n, c) => began(NAMES[n], CLASSES[c]),
                Step::Passed(n, c) => passed(NAMES[n], CLASSES[c]),
                Step::Failed(n, c) => failed(NAMES[n], CLASSES[c]),
                Step::Output => output("tick"),
                Step::Crash => app_crashed(),
                Step::TestDeadline(n, c) => MonitorEvent::TestDeadlineElapsed {
                    test: TestIdentity::new(NAMES[n], CLASSES[c]),
                },
                Step::OutputDeadline => match last_check.clone() {
                    Some(check) => MonitorEvent::OutputDeadlineElapsed(check),
                    None => continue,
                },
            };

            let result = monitor.step(event);
            for command in &result.commands {
                match command {
                    CoreCommand::NotifyAborted(_) => notifications += 1,
                    CoreCommand::TerminateProcess { .. } => terminations += 1,
                    CoreCommand::ArmOutputTimeout { check, .. } => last_check = Some(check.clone()),
                    _ => {}
                }
            }

            if let Some(exit) = frozen {
                prop_assert_eq!(monitor.exit_classification(), exit);
            } else if monitor.is_finalized() {
                frozen = Some(monitor.exit_classification());
            }

            prop_assert!(skip.len() >= skip_len);
            skip_len = skip.len();
        }

        prop_assert!(notifications <= 1);
        prop_assert!(terminations <= 1);
        prop_assert_eq!(notifications == 1, monitor.is_finalized());
    }
}
