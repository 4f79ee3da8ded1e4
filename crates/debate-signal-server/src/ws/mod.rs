pub mod connections;
pub mod handler;
pub mod rooms;
