pub mod hasher;
pub mod inspector;
pub mod scanner;
pub mod timestamp;
