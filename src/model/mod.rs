//! Plain data carried between the repository, the actions and the views.

pub mod book;

pub use book::*;
