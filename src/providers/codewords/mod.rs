mod client;
mod types;

pub use client::CodeWordsClient;
pub use types::{WorkflowReply, WorkflowRequest};
