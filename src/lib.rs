pub mod batch;
pub mod combine;
pub mod compound;
pub mod config;
pub mod error;
pub mod export;
pub mod http_cache;
pub mod http_client;
pub mod page;
pub mod player_game;
pub mod store;
pub mod table;
pub mod team_game;
