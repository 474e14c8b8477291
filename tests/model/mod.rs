//! Integration tests for the model and the simulator

mod model_tests;

mod simulator_tests;
