pub mod booking;
pub mod directory;
pub mod lifecycle;
pub mod slots;
