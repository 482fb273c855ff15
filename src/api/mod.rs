pub mod client;

pub use client::ApiClient;

#[cfg(test)]
pub mod fake;
