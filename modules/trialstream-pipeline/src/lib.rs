pub mod ages;
pub mod annotate;
pub mod embed;
pub mod fetch;
pub mod filter;
pub mod flatten;
pub mod stages;
pub mod store;
pub mod transform;
pub mod workflow;
