pub mod assessment;
pub mod document;
mod fabric;
pub(crate) mod references;
mod services;
