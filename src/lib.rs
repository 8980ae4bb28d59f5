pub mod cfn;
pub mod cli;
pub mod config;
pub mod consts;
pub mod main_actions;
pub mod stack;
pub mod utils;
