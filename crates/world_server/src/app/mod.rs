pub(crate) mod bootstrap;
pub(crate) mod content;
pub(crate) mod feed;
pub(crate) mod loop_runner;
