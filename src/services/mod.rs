//! Stargazer API services.

mod stargazers;

pub use stargazers::*;
