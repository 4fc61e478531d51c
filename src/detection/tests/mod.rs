//! Scenario tests for the detection strategies and the orchestrator

mod test_utils;
