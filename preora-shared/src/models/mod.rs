pub mod catalog;
pub mod offer;
pub mod preorder;
