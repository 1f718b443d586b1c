pub mod history;
pub mod index;
pub mod normalize;
pub mod output;
pub mod ranking;
pub mod source;
pub mod transport;
