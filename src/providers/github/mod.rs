mod client;
mod provider;
mod types;


pub use provider::GitHubProvider;
pub use types::RepoRef;
