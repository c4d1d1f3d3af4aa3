use anyhow::Error;

pub mod alignment;
pub mod errors;
pub mod io;
pub mod raxml;
pub mod sequences;
pub mod tree;

#[cfg(test)]
mod test_macros;

type Result<T> = std::result::Result<T, Error>;
