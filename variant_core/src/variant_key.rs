//! Variant key derivation.
//!
//! A variant's identity is purely content-derived:
//!
//! ```text
//! key = templateKey + "|" + hex12(SHA1(templateKey + "|" + canonical(params)))
//! ```
//!
//! Metadata is never part of `params` here, so display changes never alter
//! identity. The same inputs give the same key in every process and run.

use sha1::{Digest, Sha1};

use crate::canonical::canonicalize;
use crate::errors::{VariantError, VariantResult};
use crate::params::ParamSet;

/// Number of hex characters kept from the digest.
pub const KEY_HASH_LEN: usize = 12;

/// Derive the stable key for a realized parameter set.
pub fn derive_variant_key(template_key: &str, params: &ParamSet) -> VariantResult<String> {
    if template_key.is_empty() {
        return Err(VariantError::invalid_input(
            "template_key",
            template_key,
            "Template key must not be empty",
        ));
    }

    let mut hasher = Sha1::new();
    hasher.update(template_key.as_bytes());
    hasher.update(b"|");
    hasher.update(canonicalize(params));
    let digest = hex::encode(hasher.finalize());

    Ok(format!("{}|{}", template_key, &digest[..KEY_HASH_LEN]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_is_deterministic() {
        let params = ParamSet::new().with("depth_m", 1.2).with("restricted", false);
        let a = derive_variant_key("earthworks.trench", &params).unwrap();
        let b = derive_variant_key("earthworks.trench", &params).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_key_format() {
        let key = derive_variant_key("water.pipe_laying", &ParamSet::new()).unwrap();
        let (prefix, hash) = key.split_once('|').unwrap();
        assert_eq!(prefix, "water.pipe_laying");
        assert_eq!(hash.len(), KEY_HASH_LEN);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_key_ignores_param_order() {
        let a = ParamSet::new().with("dn", 150.0).with("pn", 10.0);
        let b = ParamSet::new().with("pn", 10.0).with("dn", 150.0);
        assert_eq!(
            derive_variant_key("water.pipe_laying", &a).unwrap(),
            derive_variant_key("water.pipe_laying", &b).unwrap()
        );
    }

    #[test]
    fn test_key_depends_on_template_and_values() {
        let params = ParamSet::new().with("dn", 150.0);
        let other = ParamSet::new().with("dn", 200.0);
        let a = derive_variant_key("water.pipe_laying", &params).unwrap();
        assert_ne!(a, derive_variant_key("gas.pipe_laying", &params).unwrap());
        assert_ne!(a, derive_variant_key("water.pipe_laying", &other).unwrap());
    }

    #[test]
    fn test_empty_template_key_rejected() {
        let err = derive_variant_key("", &ParamSet::new()).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }
}
