pub mod actor;
pub mod animation;
pub mod camera;
pub mod collision;
pub mod entity;
pub mod gfx;
pub mod intent;
pub mod patrol;
pub mod physics;
