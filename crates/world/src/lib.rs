mod chunk;
mod combat;
mod config;
mod crafting;
mod creature;
mod entity;
mod inventory;
mod movement;
mod noise;
mod persist;
mod profile;
mod quest;
mod resources;
mod sim;
mod skills;
pub mod spawn_area;
mod storage;
mod terrain;
mod time;

pub use chunk::*;
pub use combat::*;
pub use config::*;
pub use crafting::*;
pub use creature::*;
pub use entity::*;
pub use inventory::*;
pub use movement::*;
pub use noise::*;
pub use persist::*;
pub use profile::*;
pub use quest::*;
pub use resources::*;
pub use sim::*;
pub use skills::*;
pub use spawn_area::{in_spawn_area, CAVE_ENTRANCE, SPAWN_AREA_SIZE};
pub use storage::*;
pub use terrain::*;
pub use time::*;
