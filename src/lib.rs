pub mod cli;
pub mod document;
pub mod io;
pub mod model;
pub mod ops;
pub mod parse;
pub mod sync;
pub mod util;
