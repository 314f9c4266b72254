// Server-rendered pages
pub mod handlers;
