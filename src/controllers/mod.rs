pub mod generate;
pub mod health;
pub mod proposals;
pub mod usage;
