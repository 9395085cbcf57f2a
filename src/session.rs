use parking_lot::RwLock;

use crate::TestResult;

/// Results of one test run as seen by the tester
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SfwSession {
    /// Tester to responder direction, as reported by the responder
    pub c2s: TestResult,
    /// Responder to tester direction, measured locally
    pub s2c: TestResult,
}

impl SfwSession {
    /// Lines shown to the user.
    ///
    /// Only a confirmed open path is reported; `Possible`, `Unknown` and
    /// `NotTested` stay silent.
    pub fn report(&self, host: &str) -> Vec<String> {
        let mut lines = Vec::new();
        if self.c2s == TestResult::NoFirewall {
            lines.push(format!("Server '{}' is not behind a firewall.", host));
        }
        if self.s2c == TestResult::NoFirewall {
            lines.push("Client is not behind a firewall.".to_owned());
        }
        lines
    }
}

/// Test currently running on a session
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum ActiveTest {
    /// Between tests
    #[default]
    None,
    /// Simple firewall test
    SimpleFirewall,
}

/// Receives "current test" updates for external status reporting
#[cfg_attr(any(test, feature = "mockall"), mockall::automock)]
pub trait TestTracker: Send + Sync {
    /// Marks `test` as the one currently running
    fn set_current_test(&self, test: ActiveTest);
}

/// [TestTracker] that simply remembers the last value
#[derive(Debug, Default)]
pub struct CurrentTest(RwLock<ActiveTest>);

impl CurrentTest {
    pub fn get(&self) -> ActiveTest {
        *self.0.read()
    }
}

impl TestTracker for CurrentTest {
    fn set_current_test(&self, test: ActiveTest) {
        *self.0.write() = test;
    }
}

/// Clears the active test marker when dropped
pub(crate) struct ActiveTestGuard<'a>(&'a dyn TestTracker);

impl<'a> ActiveTestGuard<'a> {
    pub(crate) fn enter(tracker: &'a dyn TestTracker, test: ActiveTest) -> Self {
        tracker.set_current_test(test);
        Self(tracker)
    }
}

impl Drop for ActiveTestGuard<'_> {
    fn drop(&mut self) {
        self.0.set_current_test(ActiveTest::None);
    }
}
