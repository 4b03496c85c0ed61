pub mod aggregator;
pub mod combine;
pub mod config;
pub mod error;
pub mod io;
pub mod moves;
pub mod perm;
pub mod puzzle;
pub mod report;
pub mod scorer;
pub mod verifier;

pub use error::{Error, Rejection, Result};
