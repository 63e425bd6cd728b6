#![forbid(unsafe_code)]

pub use tillid_core as core;
pub use tillid_xml as xml;
pub use tillid_c14n as c14n;
pub use tillid_crypto as crypto;
pub use tillid_keys as keys;
pub use tillid_transforms as transforms;
pub use tillid_federation as federation;
pub use tillid_dsig as dsig;
