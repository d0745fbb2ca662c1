pub mod client;
pub mod poller;
pub mod processor;
pub mod reply;
pub mod seen;
