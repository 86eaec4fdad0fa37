mod checksum;

pub use checksum::{
    normalize_sha256_hex, sha256_file_hex, sha256_hex, sha256_reader_hex, verify_sha256,
    verify_sha256_file, DigestMismatch,
};
