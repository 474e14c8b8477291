//! Integration tests for the fitters

mod fitter_tests;
