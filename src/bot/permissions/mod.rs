pub mod cooldown;
pub mod permissions;
