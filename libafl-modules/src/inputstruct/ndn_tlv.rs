//! NDN packet format TLV type numbers.

use super::tlv::Tag;

pub const INTEREST: Tag = 5;
pub const DATA: Tag = 6;

pub const NAME: Tag = 7;
pub const GENERIC_NAME_COMPONENT: Tag = 8;
pub const IMPLICIT_SHA256_DIGEST_COMPONENT: Tag = 1;
pub const PARAMETERS_SHA256_DIGEST_COMPONENT: Tag = 2;

// Interest
pub const SELECTORS: Tag = 9;
pub const NONCE: Tag = 10;
pub const INTEREST_LIFETIME: Tag = 12;
pub const CAN_BE_PREFIX: Tag = 33;
pub const MUST_BE_FRESH: Tag = 18;
pub const FORWARDING_HINT: Tag = 30;
pub const HOP_LIMIT: Tag = 34;
pub const APPLICATION_PARAMETERS: Tag = 36;

// Selectors
pub const MIN_SUFFIX_COMPONENTS: Tag = 13;
pub const MAX_SUFFIX_COMPONENTS: Tag = 14;
pub const PUBLISHER_PUBLIC_KEY_LOCATOR: Tag = 15;
pub const EXCLUDE: Tag = 16;
pub const CHILD_SELECTOR: Tag = 17;

// Link delegation inside a forwarding hint
pub const LINK_DELEGATION: Tag = 31;
pub const LINK_PREFERENCE: Tag = 30;

// Data
pub const META_INFO: Tag = 20;
pub const CONTENT: Tag = 21;
pub const SIGNATURE_INFO: Tag = 22;
pub const SIGNATURE_VALUE: Tag = 23;

// MetaInfo
pub const CONTENT_TYPE: Tag = 24;
pub const FRESHNESS_PERIOD: Tag = 25;
pub const FINAL_BLOCK_ID: Tag = 26;

// SignatureInfo
pub const SIGNATURE_TYPE: Tag = 27;
pub const KEY_LOCATOR: Tag = 28;
pub const KEY_DIGEST: Tag = 29;
pub const VALIDITY_PERIOD: Tag = 253;
pub const NOT_BEFORE: Tag = 254;
pub const NOT_AFTER: Tag = 255;
pub const ADDITIONAL_DESCRIPTION: Tag = 258;
pub const DESCRIPTION_ENTRY: Tag = 512;
pub const DESCRIPTION_KEY: Tag = 513;
pub const DESCRIPTION_VALUE: Tag = 514;

/// SignatureType value for a plain SHA-256 digest signature.
pub const DIGEST_SHA256: u8 = 0;

/// Length of a ParametersSha256DigestComponent value.
pub const PARAMETERS_DIGEST_LEN: usize = 32;
