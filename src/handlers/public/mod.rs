// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Service status, read-only hospitality listings and the chatbot.
pub mod chatbot;
pub mod hospitality;
pub mod root;
