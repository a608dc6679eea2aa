pub mod debugger;
pub mod environment;
pub mod interpreter;
pub mod lexer;
mod native;
pub mod parser;
pub mod string;
pub mod value;
