pub mod addresses;
pub mod cart;
pub mod orders;
pub mod skus;
