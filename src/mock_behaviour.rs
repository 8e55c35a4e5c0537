//! This module provides ways to tweak mocked sources, so that they can return errors on some tests
#![cfg(any(test, feature = "mock_sources"))]

use crate::traits::SourceError;

/// This stores some behaviour tweaks, that describe how a mocked instance will behave during a given test
///
/// So that a functions fails _n_ times after _m_ initial successes, set `(m, n)` for the suited parameter
#[derive(Default, Clone, Debug)]
pub struct MockBehaviour {
    /// If this is true, every action will be allowed
    pub is_suspended: bool,

    // From the IcalSource trait
    pub ingest_behaviour: (u32, u32),

    // From the ClassroomSource trait
    pub list_courses_behaviour: (u32, u32),
    pub list_course_work_behaviour: (u32, u32),
}

impl MockBehaviour {
    pub fn new() -> Self {
        Self::default()
    }

    /// All items will fail at once, for `n_fails` times
    pub fn fail_now(n_fails: u32) -> Self {
        Self {
            is_suspended: false,
            ingest_behaviour: (0, n_fails),
            list_courses_behaviour: (0, n_fails),
            list_course_work_behaviour: (0, n_fails),
        }
    }

    /// Suspend this mock behaviour until you call `resume`
    pub fn suspend(&mut self) {
        self.is_suspended = true;
    }
    /// Make this behaviour active again
    pub fn resume(&mut self) {
        self.is_suspended = false;
    }

    pub fn can_ingest(&mut self) -> Result<(), SourceError> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.ingest_behaviour, "ingest")
    }
    pub fn can_list_courses(&mut self) -> Result<(), SourceError> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.list_courses_behaviour, "list_courses")
    }
    pub fn can_list_course_work(&mut self) -> Result<(), SourceError> {
        if self.is_suspended { return Ok(()) }
        decrement(&mut self.list_course_work_behaviour, "list_course_work")
    }
}


/// Return Ok(()) in case the value is `(1+, _)` or `(_, 0)`, or return Err and decrement otherwise
fn decrement(value: &mut (u32, u32), descr: &str) -> Result<(), SourceError> {
    let remaining_successes = value.0;
    let remaining_failures = value.1;

    if remaining_successes > 0 {
        value.0 = value.0 - 1;
        log::debug!("Mock behaviour: allowing a {} ({:?})", descr, value);
        Ok(())
    } else {
        if remaining_failures > 0 {
            value.1 = value.1 - 1;
            log::debug!("Mock behaviour: failing a {} ({:?})", descr, value);
            Err(format!("Mocked behaviour requires this {} to fail this time. ({:?})", descr, value).into())
        } else {
            log::debug!("Mock behaviour: allowing a {} ({:?})", descr, value);
            Ok(())
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_mock_behaviour() {
        let mut ok = MockBehaviour::new();
        for _ in 0..5 {
            assert!(ok.can_ingest().is_ok());
            assert!(ok.can_list_courses().is_ok());
        }

        let mut now = MockBehaviour::fail_now(2);
        assert!(now.can_ingest().is_err());
        assert!(now.can_list_courses().is_err());
        assert!(now.can_list_courses().is_err());
        assert!(now.can_ingest().is_err());
        assert!(now.can_ingest().is_ok());
        assert!(now.can_list_courses().is_ok());
        assert!(now.can_list_course_work().is_err());

        let mut custom = MockBehaviour{
            list_course_work_behaviour: (2, 1),
            ..MockBehaviour::default()
        };
        assert!(custom.can_list_course_work().is_ok());
        assert!(custom.can_list_course_work().is_ok());
        assert!(custom.can_list_course_work().is_err());
        assert!(custom.can_list_course_work().is_ok());

        custom.list_courses_behaviour = (0, 1);
        custom.suspend();
        assert!(custom.can_list_courses().is_ok());
        custom.resume();
        assert!(custom.can_list_courses().is_err());
        assert!(custom.can_list_courses().is_ok());
    }
}
