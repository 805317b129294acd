//! Test suites for the seedbed bootstrap.

mod support;
