mod common;
mod run_repository_tests;
