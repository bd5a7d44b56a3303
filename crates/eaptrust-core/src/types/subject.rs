//! Distinguished name parsing for the fields shown to the user.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrustError};

/// Structured view of a certificate subject or issuer name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubjectInfo {
    /// CN, always present
    pub common_name: String,
    /// O
    pub organization: String,
    /// emailAddress
    pub email: String,
    /// C
    pub country: String,
    /// ST
    pub state: String,
    /// L
    pub locality: String,
}

impl SubjectInfo {
    /// Parse an RFC 2253 style name such as `C=TW,O=Corp,CN=radius`.
    ///
    /// Values may be plain (with `\` escapes) or `#`-prefixed hex DER.
    /// A name without a common name is rejected.
    pub fn parse(name: &str) -> Result<Self> {
        let mut info = Self::default();

        for rdn in split_unescaped(name) {
            let Some((key, raw)) = rdn.split_once('=') else {
                continue;
            };
            let value = decode_value(raw.trim())
                .ok_or_else(|| TrustError::InvalidName(format!("bad value in {rdn:?}")))?;

            match key.trim().to_ascii_uppercase().as_str() {
                "CN" | "2.5.4.3" => info.common_name = value,
                "O" | "2.5.4.10" => info.organization = value,
                "C" | "2.5.4.6" => info.country = value,
                "ST" | "2.5.4.8" => info.state = value,
                "L" | "2.5.4.7" => info.locality = value,
                "E" | "EMAIL" | "EMAILADDRESS" | "1.2.840.113549.1.9.1" => info.email = value,
                _ => {}
            }
        }

        if info.common_name.is_empty() {
            return Err(TrustError::InvalidName(format!("no common name in {name:?}")));
        }
        Ok(info)
    }
}

/// Split on `,` and `+` that are not escaped with a backslash.
fn split_unescaped(name: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut escaped = false;

    for c in name.chars() {
        if escaped {
            current.push('\\');
            current.push(c);
            escaped = false;
        } else if c == '\\' {
            escaped = true;
        } else if c == ',' || c == '+' {
            parts.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
    }
    if !current.trim().is_empty() {
        parts.push(current);
    }
    parts
}

fn decode_value(raw: &str) -> Option<String> {
    if let Some(hex_der) = raw.strip_prefix('#') {
        return decode_hex_der(hex_der);
    }

    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            out.push(chars.next()?);
        } else {
            out.push(c);
        }
    }
    Some(out)
}

/// Decode a hex-encoded DER string value (tag, length, content).
fn decode_hex_der(hex_der: &str) -> Option<String> {
    let bytes = hex::decode(hex_der).ok()?;
    let (&_tag, rest) = bytes.split_first()?;
    let (&len_byte, rest) = rest.split_first()?;

    let (len, content) = if len_byte & 0x80 == 0 {
        (usize::from(len_byte), rest)
    } else {
        // Long form: the low bits count the length octets that follow.
        let octets = usize::from(len_byte & 0x7f);
        if octets == 0 || octets > std::mem::size_of::<u32>() || rest.len() < octets {
            return None;
        }
        let (len_bytes, rest) = rest.split_at(octets);
        let len = len_bytes
            .iter()
            .fold(0usize, |acc, &b| (acc << 8) | usize::from(b));
        (len, rest)
    };

    let content = content.get(..len)?;
    Some(String::from_utf8_lossy(content).into_owned())
}
