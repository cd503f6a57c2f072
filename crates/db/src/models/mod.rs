pub mod assignment;
pub mod example;
pub mod lock;
pub mod member;
pub mod project;
pub mod session;
pub mod user;
