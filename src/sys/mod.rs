pub mod replay;
pub mod runtime;
