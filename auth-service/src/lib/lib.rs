pub mod config;
pub mod domain;
pub mod outbound;

pub use domain::authentication;
pub use outbound::repositories;
