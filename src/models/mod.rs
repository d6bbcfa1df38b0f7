pub mod ai;
pub mod class;
pub mod collection;
pub mod member;
pub mod tree;
