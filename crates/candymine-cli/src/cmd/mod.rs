pub mod holders;
pub mod links;
pub mod mine;
pub mod upload;
