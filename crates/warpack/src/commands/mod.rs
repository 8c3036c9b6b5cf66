mod clean;
mod explode;
mod overlays;
mod package;

pub use clean::*;
pub use explode::*;
pub use overlays::*;
pub use package::*;
