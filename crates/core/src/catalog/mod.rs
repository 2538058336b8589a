//! Catalog domain: the category tree and product rules.

pub mod category;
pub mod product;

pub use category::{
    CategoryBranch, CategoryError, CategoryNode, CategoryTree, MAX_DEPTH, NewCategory,
};
pub use product::{Discount, Product, ProductError, ProductInput};
