mod delimited;

pub use delimited::{from_delimited_text, to_delimited_text, HEADER};
