// Backend access
pub mod fetcher;
pub mod firebase;
