//! Guest-side driver object: host-ABI dispatch, cross-world transport
//! client, notifier poll loop (§4.2, §4.6).
//!
//! This crate is built against the `wineasio-native` process only through
//! [`transport::Transport`] and the wire types in `wineasio-proto`; it never
//! links against JACK or any native-side module directly.

pub mod abi;
pub mod buffer;
pub mod callbacks;
pub mod config;
pub mod control_panel;
pub mod driver;
pub mod notifier;
pub mod object;
pub mod process_transport;
pub mod transport;

pub use abi::AsioDriver;
pub use buffer::GuestBufferBlock;
pub use callbacks::HostCallbacks;
pub use driver::GuestDriver;
pub use notifier::Notifier;
pub use object::{DriverObject, ASIO_DRIVER_IID};
pub use process_transport::ProcessTransport;
pub use transport::Transport;
