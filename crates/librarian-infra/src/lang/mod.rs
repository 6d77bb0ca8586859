//! Language identification backends.

pub mod lingua;

pub use self::lingua::LinguaOracle;
