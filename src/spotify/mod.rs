pub mod auth;
pub mod callback;
pub mod player;
pub mod scope;
pub mod state;
