//! Integration tests for the auth gateway HTTP surface

pub mod e2e_users_api;
pub mod health_test;
pub mod login_flow;
