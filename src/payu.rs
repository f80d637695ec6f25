use sha2::{Digest, Sha512};

use crate::config::PayuConfig;

const PAYU_TEST_URL: &str = "https://test.payu.in/_payment";
const PAYU_LIVE_URL: &str = "https://secure.payu.in/_payment";

/// Fields both hash directions are computed over.
#[derive(Debug, Clone, PartialEq)]
pub struct HashFields<'a> {
    pub txn_id: &'a str,
    pub amount: &'a str,
    pub product_info: &'a str,
    pub first_name: &'a str,
    pub email: &'a str,
}

fn sha512_hex(parts: &[&str]) -> String {
    let mut hasher = Sha512::new();
    hasher.update(parts.join("|").as_bytes());
    hex::encode(hasher.finalize())
}

pub fn payment_url(config: &PayuConfig) -> &'static str {
    if config.test_env {
        PAYU_TEST_URL
    } else {
        PAYU_LIVE_URL
    }
}

// key|txnid|amount|productinfo|firstname|email|udf1..udf5|5 reserved|salt
pub fn request_hash(config: &PayuConfig, fields: &HashFields<'_>) -> String {
    let mut parts = vec![
        config.merchant_key.as_str(),
        fields.txn_id,
        fields.amount,
        fields.product_info,
        fields.first_name,
        fields.email,
    ];
    parts.extend([""; 10]);
    parts.push(config.merchant_salt.as_str());
    sha512_hex(&parts)
}

// salt|status|5 reserved|udf5..udf1|email|firstname|productinfo|amount|txnid|key
pub fn response_hash(config: &PayuConfig, status: &str, fields: &HashFields<'_>) -> String {
    let mut parts = vec![config.merchant_salt.as_str(), status];
    parts.extend([""; 10]);
    parts.extend([
        fields.email,
        fields.first_name,
        fields.product_info,
        fields.amount,
        fields.txn_id,
        config.merchant_key.as_str(),
    ]);
    sha512_hex(&parts)
}

/// Checks a callback hash. Without a configured salt there is nothing to verify against.
pub fn verify_response(config: &PayuConfig, status: &str, fields: &HashFields<'_>, received: &str) -> bool {
    if config.merchant_salt.is_empty() {
        return true;
    }
    response_hash(config, status, fields).eq_ignore_ascii_case(received.trim())
}
