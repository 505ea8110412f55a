mod bootstrap;
mod collectives;
mod communicator;

pub use communicator::Communicator;
