mod activity;
mod ai;
mod project;
mod task;

pub use activity::*;
pub use ai::*;
pub use project::*;
pub use task::*;
