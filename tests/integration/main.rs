// tests/integration/main.rs

#[path = "../common/mod.rs"]
mod common;

mod config_errors;
mod executor_real;
mod plan_chip;
mod runtime_fake_executor;
