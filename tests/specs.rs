//! Root end-to-end specs: a real `apphostd` router, on an ephemeral port,
//! driven over HTTP with `reqwest`. See `prelude` for the shared fixture.

mod prelude;

mod ports;
mod proxy;
mod rest_lifecycle;
