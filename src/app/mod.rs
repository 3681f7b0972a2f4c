mod chord;
mod lists;
mod nav;
mod state;
mod viewport;

pub use lists::{Cell, ListSource, Row};
pub use state::{App, InputMode};
