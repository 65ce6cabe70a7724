pub mod auth;
pub mod generation;
pub mod proposals;
pub mod quota;
pub mod shared;
