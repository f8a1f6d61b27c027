//! Database layer (credential store).

pub mod users;

pub use users::UserStore;
