pub mod collector;
pub mod encoding;
pub mod generation;
pub mod generation_types;
pub mod import;
pub mod readiness;
pub mod session;
pub mod vocabulary_store;

#[cfg(test)]
pub(crate) mod testing;
