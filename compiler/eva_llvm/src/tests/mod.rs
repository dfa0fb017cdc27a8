//! Code generation tests.
//!
//! Programs are compiled from source, verified, and executed with the
//! reference interpreter; assertions are on captured `printf` output, the
//! IR text, or the structured error.


mod class_tests;
mod control_flow_tests;
mod function_tests;
