//! Value conversion helpers shared by the storage operations

use crate::error::{Error, Result};

// =============================================================================
// Sizes
// =============================================================================

/// Parse a size such as `100`, `1g`, `20Gi`, `512MiB` or `10GB` into bytes.
///
/// Unit letters are case-insensitive and always binary (`1k` is 1024 bytes).
pub fn convert_size_to_bytes(size: &str) -> Result<u64> {
    let trimmed = size.trim();
    let digits_end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (digits, suffix) = trimmed.split_at(digits_end);
    if digits.is_empty() {
        return Err(Error::InvalidSize(size.to_string()));
    }
    let value: u64 = digits
        .parse()
        .map_err(|_| Error::InvalidSize(size.to_string()))?;

    let suffix = suffix.to_ascii_lowercase();
    let mut chars = suffix.chars().peekable();
    let power = match chars.next() {
        None => 0,
        Some('b') if chars.peek().is_none() => 0,
        Some(c) => match "kmgtpe".find(c) {
            Some(idx) => idx as u32 + 1,
            None => return Err(Error::InvalidSize(size.to_string())),
        },
    };
    if power > 0 {
        if chars.peek() == Some(&'i') {
            chars.next();
        }
        if chars.peek() == Some(&'b') {
            chars.next();
        }
    }
    if chars.next().is_some() {
        return Err(Error::InvalidSize(size.to_string()));
    }

    1024u64
        .checked_pow(power)
        .and_then(|multiplier| value.checked_mul(multiplier))
        .ok_or_else(|| Error::InvalidSize(size.to_string()))
}

// =============================================================================
// Unix Permissions
// =============================================================================

/// Convert symbolic permissions (`rwxr-xr-x`, optionally prefixed with `---`)
/// to their octal digits. Anything else is returned with the `---` prefix
/// removed and otherwise unchanged.
pub fn convert_unix_permissions(permissions: &str) -> String {
    let trimmed = permissions.strip_prefix("---").unwrap_or(permissions);
    let bytes = trimmed.as_bytes();
    if bytes.len() != 9 {
        return trimmed.to_string();
    }

    let mut octal = String::with_capacity(3);
    for triple in bytes.chunks(3) {
        let mut digit = 0u8;
        for (bit, (&actual, expected)) in triple.iter().zip([b'r', b'w', b'x']).enumerate() {
            if actual == expected {
                digit += 4 >> bit;
            } else if actual != b'-' {
                return trimmed.to_string();
            }
        }
        octal.push(char::from(b'0' + digit));
    }
    octal
}

/// Convert permissions as [`convert_unix_permissions`] does, then parse the
/// result as the integer the API expects
pub fn parse_unix_permissions(permissions: &str) -> Result<i64> {
    convert_unix_permissions(permissions)
        .parse()
        .map_err(|_| Error::InvalidPermissions(permissions.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_convert_size_to_bytes() {
        assert_eq!(convert_size_to_bytes("1024").unwrap(), 1024);
        assert_eq!(convert_size_to_bytes("512b").unwrap(), 512);
        assert_eq!(convert_size_to_bytes("1k").unwrap(), 1024);
        assert_eq!(convert_size_to_bytes("100Mi").unwrap(), 100 * 1024 * 1024);
        assert_eq!(convert_size_to_bytes("1g").unwrap(), 1u64 << 30);
        assert_eq!(convert_size_to_bytes("20GiB").unwrap(), 20u64 << 30);
        assert_eq!(convert_size_to_bytes("10GB").unwrap(), 10u64 << 30);
        assert_eq!(convert_size_to_bytes(" 2T ").unwrap(), 2u64 << 40);
    }

    #[test]
    fn test_convert_size_rejects_garbage() {
        for bad in ["", "g", "1x", "1gg", "1.5g", "-1", "1ib", "99999999999e"] {
            assert_matches!(convert_size_to_bytes(bad), Err(Error::InvalidSize(_)), "{}", bad);
        }
    }

    #[test]
    fn test_convert_unix_permissions() {
        assert_eq!(convert_unix_permissions("rwxr-xr-x"), "755");
        assert_eq!(convert_unix_permissions("---rwxrwxrwx"), "777");
        assert_eq!(convert_unix_permissions("rw-r-----"), "640");
        assert_eq!(convert_unix_permissions("r--r--r--"), "444");
        assert_eq!(convert_unix_permissions("---rwxrwxrwz"), "rwxrwxrwz");
        assert_eq!(convert_unix_permissions("0755"), "0755");
        assert_eq!(convert_unix_permissions("rwxrwxrwz"), "rwxrwxrwz");
    }

    #[test]
    fn test_parse_unix_permissions() {
        assert_eq!(parse_unix_permissions("rwxr-xr-x").unwrap(), 755);
        assert_eq!(parse_unix_permissions("0777").unwrap(), 777);
        assert_matches!(
            parse_unix_permissions("rwxrwxrwz"),
            Err(Error::InvalidPermissions(v)) if v == "rwxrwxrwz"
        );
    }
}
