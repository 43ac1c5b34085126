//! One collector per YANG module. Each returns a typed tree that
//! serializes to the module's JSON, or to `{}` when there is nothing to
//! report.

pub mod containers;
pub mod dhcp;
pub mod firewall;
pub mod hardware;
pub mod interfaces;
pub mod lldp;
pub mod ntp;
pub mod routing;
pub mod system;
