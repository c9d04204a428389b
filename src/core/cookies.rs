//! Cookie lookup for the CSRF token
//!
//! The token is read from `document.cookie` right before every request, so
//! rotation by the server is picked up without caching anything here.

/// Find a cookie by name in a `document.cookie` style string and
/// percent-decode its value.
///
/// Empty values are treated as missing.
pub fn extract_cookie(cookies: &str, name: &str) -> Option<String> {
    if name.is_empty() {
        return None;
    }

    cookies
        .split(';')
        .map(|s| s.trim())
        .find_map(|s| s.strip_prefix(name)?.strip_prefix('='))
        .map(percent_decode)
        .filter(|value| !value.is_empty())
}

/// Decode `%XX` escapes. Malformed escapes are kept as-is.
fn percent_decode(value: &str) -> String {
    let bytes = value.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            if let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                out.push((hi << 4) | lo);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&out).into_owned()
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_cookie() {
        let cookies = "sessionid=abc123; csrftoken=xyz789; theme=dark";
        assert_eq!(
            extract_cookie(cookies, "csrftoken"),
            Some("xyz789".to_string())
        );
        assert_eq!(extract_cookie(cookies, "theme"), Some("dark".to_string()));
        assert_eq!(extract_cookie(cookies, "nonexistent"), None);
    }

    #[test]
    fn test_extract_cookie_empty_string() {
        assert_eq!(extract_cookie("", "csrftoken"), None);
    }

    #[test]
    fn test_extract_cookie_with_spaces() {
        let cookies = "  a=1 ;   csrftoken=token  ";
        assert_eq!(
            extract_cookie(cookies, "csrftoken"),
            Some("token".to_string())
        );
    }

    #[test]
    fn test_extract_cookie_partial_match() {
        let cookies = "csrftoken_old=111; csrftoken=222";
        assert_eq!(extract_cookie(cookies, "csrftoken"), Some("222".to_string()));
    }

    #[test]
    fn test_extract_cookie_empty_value_is_missing() {
        assert_eq!(extract_cookie("csrftoken=; a=b", "csrftoken"), None);
    }

    #[test]
    fn test_extract_cookie_value_may_contain_equals() {
        assert_eq!(
            extract_cookie("token=a=b==", "token"),
            Some("a=b==".to_string())
        );
    }

    #[test]
    fn test_extract_cookie_percent_decodes() {
        assert_eq!(
            extract_cookie("csrftoken=abc%2Bdef%3D%3d", "csrftoken"),
            Some("abc+def==".to_string())
        );
    }

    #[test]
    fn test_malformed_escape_kept() {
        assert_eq!(percent_decode("100%"), "100%");
        assert_eq!(percent_decode("%zz1"), "%zz1");
        assert_eq!(percent_decode("%4"), "%4");
    }
}
