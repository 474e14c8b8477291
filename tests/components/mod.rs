//! Integration tests for the components

// Closed-form visibilities and their limits
mod analytic_tests;

// Elliptic transform
mod elliptic_tests;

// Image-based and radial components
mod grid_tests;
