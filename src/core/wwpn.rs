//! WWPN canonicalization.
//!
//! Every comparison in the crate runs on the canonical `xx:xx:xx:xx:xx:xx:xx:xx`
//! lower-case form produced here.

use crate::utils::error::{ImportError, Result};

const WWPN_HEX_DIGITS: usize = 16;

/// Strip everything that is not a hex digit, lower-case the rest and regroup it into
/// eight colon-separated octets.
pub fn normalize_wwpn(input: &str) -> Result<String> {
    let digits: Vec<char> = input
        .chars()
        .filter(char::is_ascii_hexdigit)
        .map(|c| c.to_ascii_lowercase())
        .collect();

    if digits.len() != WWPN_HEX_DIGITS {
        return Err(ImportError::InvalidWwpn {
            input: input.to_string(),
            digits: digits.len(),
        });
    }

    let mut out = String::with_capacity(WWPN_HEX_DIGITS + 7);
    for (i, pair) in digits.chunks(2).enumerate() {
        if i > 0 {
            out.push(':');
        }
        out.extend(pair);
    }
    Ok(out)
}
