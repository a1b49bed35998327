//! Reference device drivers.
//!
//! Hardware-free implementations of the [`Sensor`](crate::core::Sensor) and
//! [`Motion`](crate::core::Motion) contracts, backed by a
//! [`MockTransport`](crate::transport::MockTransport) responder that plays
//! the remote instrument. They exercise the full lifecycle and command
//! plumbing, serve as migration references for real drivers, and carry the
//! contract test suite.

pub mod mock_sensor;
pub mod mock_stage;

pub use mock_sensor::MockSensor;
pub use mock_stage::MockStage;
