pub mod dashboard;
pub mod health;
pub mod keepalive;
pub mod logs;
pub mod status;
