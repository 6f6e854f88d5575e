pub mod address;
pub mod range;

pub use address::AddressSpec;
pub use range::Ipv4Range;
