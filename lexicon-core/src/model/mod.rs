pub mod credential;
pub mod entry;
pub mod filter;
pub mod run;
