pub mod action;
pub mod flow;
pub mod poll;
pub mod settings;
