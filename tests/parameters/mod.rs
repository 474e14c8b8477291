//! Integration tests for the parameter system

// Interpolated parameters
mod interpolated_tests;

// Linked and normalization parameters
mod linked_tests;
