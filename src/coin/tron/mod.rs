pub mod address;
pub mod client;
pub mod codec;
pub mod model;
pub mod proto;
pub mod token;
pub mod utils;
