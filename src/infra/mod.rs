mod dataset;
mod projects;
mod watch;

pub use dataset::*;
pub use projects::*;
pub use watch::*;
