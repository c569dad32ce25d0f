//! Content firewall: policy-gated idea → brief → draft → publish pipeline.

pub mod bus;
pub mod cli;
pub mod config;
pub mod error;
pub mod pipeline;
pub mod policy;
