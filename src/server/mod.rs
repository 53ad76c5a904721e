pub mod dto;
mod images;
mod items;
pub mod response;
mod router;

pub use router::{AppState, create_router};
