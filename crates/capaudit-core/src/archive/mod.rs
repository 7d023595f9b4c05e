//! Capsule container I/O: extraction, re-packing and signing.

pub mod extract;
pub mod pack;
pub mod signature;

pub use extract::extract_zip;
pub use pack::PackReport;
pub use pack::pack_directory;
pub use signature::SignatureCheck;
pub use signature::SignatureRecord;
pub use signature::sha256_file;
pub use signature::sidecar_path;
pub use signature::sign_archive;
pub use signature::verify_signature;
