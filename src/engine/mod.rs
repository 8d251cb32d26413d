pub mod beacon;
pub mod dispatch;
pub mod presence;
pub mod tracker;
