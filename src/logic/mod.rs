pub mod orchestrator;
pub mod service;
pub mod validator;
