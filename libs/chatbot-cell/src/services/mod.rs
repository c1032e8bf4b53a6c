pub mod assistant;
pub mod context;
pub mod knowledge;
pub mod openai;
pub mod sentiment;
