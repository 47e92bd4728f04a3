// Product-space tree construction module

pub mod product_tree;

pub use product_tree::*;
