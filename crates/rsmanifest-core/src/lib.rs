//! rsmanifest core: ordered mappings and installed-code manifests.
//!
//! Manifests are `rsmanifest.json` files recording which codes were
//! installed into an image or a user's environment. Their JSON objects are
//! read and written through [`OrderedMapping`] so key order survives a
//! rewrite.

mod config;
pub mod json;
mod manifest;
mod ordered;

pub use config::{ConfigError, ManifestConfig, UserConfig, expand_user_path};
pub use json::JsonError;
pub use manifest::{
    BASENAME, CONTAINER_FILE, CodeEntry, FORMAT_VERSION, Manifest, ManifestError, NO_VENV,
    NewCode, USER_FILE, add_code,
};
pub use ordered::{MappingError, MappingKind, OrderedMapping, Plain, mapping_merge};
