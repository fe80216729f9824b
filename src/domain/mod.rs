// Domain layer: value types returned to callers and the ports the client is wired through.

pub mod model;
pub mod ports;
