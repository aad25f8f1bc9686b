pub mod cluster;
pub mod network;
pub mod outputs;
