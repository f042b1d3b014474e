pub mod ai;
pub mod clock;
pub mod extraction;
pub mod prompt;
