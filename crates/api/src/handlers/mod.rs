pub mod account;
pub mod gallery;
pub mod generation;
