pub mod compile;
pub mod serve;
pub mod token;
