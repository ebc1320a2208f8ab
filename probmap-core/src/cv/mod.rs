mod colorize;

pub use colorize::argmax;
pub use colorize::colorize;
