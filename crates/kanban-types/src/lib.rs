//! Wire types shared by the kanban storage and HTTP layers.

pub mod api;
pub mod board;
pub mod models;
