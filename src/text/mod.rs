pub mod resolve;
pub mod string;
