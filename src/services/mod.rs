pub mod abort;
pub mod cli_store;
pub mod reconciler;
pub mod resolver;
pub mod snapshot;
pub mod store;
pub mod verifier;

#[cfg(test)]
pub(crate) mod testing;
