pub mod network;
pub mod notification;
pub mod storage;
