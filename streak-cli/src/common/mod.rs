pub mod util;

pub use util::{read_input, split_csv};
