// src/exec/protocol.rs

//! Marker lines a test process can print so the driver can report
//! structured lifecycle events without a full console parser.
//!
//! ```text
//! ##testwatch all-began
//! ##testwatch all-ended
//! ##testwatch suite-began <name> [root]
//! ##testwatch suite-ended <name> [root]
//! ##testwatch test-began <class> <name>
//! ##testwatch test-passed <class> <name> <seconds>
//! ##testwatch test-failed <class> <name> <file>:<line> [exception]
//! ```

use std::sync::LazyLock;
use std::time::{Duration, SystemTime};

use regex::Regex;
use tracing::warn;

use crate::engine::MonitorEvent;

static MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^##testwatch\s+([a-z-]+)(?:\s+(.*))?$").expect("marker regex is valid")
});

/// Decode one output line. Returns `None` for ordinary output and for
/// malformed markers (which are logged).
pub fn decode_line(line: &str) -> Option<MonitorEvent> {
    let caps = MARKER.captures(line.trim_end())?;
    let kind = caps.get(1)?.as_str();
    let args: Vec<&str> = caps
        .get(2)
        .map(|m| m.as_str().split_whitespace().collect())
        .unwrap_or_default();

    let event = match (kind, args.as_slice()) {
        ("all-began", []) => Some(MonitorEvent::AllTestsBegan),
        ("all-ended", []) => Some(MonitorEvent::AllTestsEnded),
        ("suite-began", [name, rest @ ..]) => Some(MonitorEvent::TestSuiteBegan {
            name: name.to_string(),
            started_at: SystemTime::now(),
            is_root: rest == ["root"],
        }),
        ("suite-ended", [name, rest @ ..]) => Some(MonitorEvent::TestSuiteEnded {
            name: name.to_string(),
            is_root: rest == ["root"],
        }),
        ("test-began", [class, name]) => Some(MonitorEvent::TestCaseBegan {
            name: name.to_string(),
            class: class.to_string(),
        }),
        ("test-passed", [class, name, secs]) => secs
            .parse::<f64>()
            .ok()
            .and_then(|s| Duration::try_from_secs_f64(s).ok())
            .map(|duration| MonitorEvent::TestCasePassed {
                name: name.to_string(),
                class: class.to_string(),
                duration,
            }),
        ("test-failed", [class, name, location, rest @ ..]) => {
            parse_location(location).map(|(file, line)| MonitorEvent::TestCaseFailed {
                name: name.to_string(),
                class: class.to_string(),
                file,
                line,
                was_exception: rest == ["exception"],
            })
        }
        _ => None,
    };

    if event.is_none() {
        warn!(line = %line, "malformed testwatch marker; treating as plain output");
    }
    event
}

fn parse_location(location: &str) -> Option<(String, u32)> {
    let (file, line) = location.rsplit_once(':')?;
    let line = line.parse().ok()?;
    Some((file.to_string(), line))
}
