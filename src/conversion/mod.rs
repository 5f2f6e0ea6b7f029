// Conversion layer - complex attribute values between domain, storage and wire forms
//
// One canonical JSON encoding backs both adapters:
//   PropertyConverter  - nullable string properties on graph nodes
//   WireScalar         - literals and variables crossing the API boundary

pub mod codec;
pub mod property;
pub mod wire;

pub use codec::{Canonical, Codec};
pub use property::PropertyConverter;
pub use wire::{WireLiteral, WireScalar};
