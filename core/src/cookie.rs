//! Cookie lookup used by the XSRF header injection.

use std::collections::HashMap;

use percent_encoding::percent_decode_str;

/// Read-only cookie lookup by name.
pub trait CookieStore {
    fn get(&self, name: &str) -> Option<String>;
}

impl CookieStore for HashMap<String, String> {
    fn get(&self, name: &str) -> Option<String> {
        HashMap::get(self, name).cloned()
    }
}

/// Cookies parsed from a `name=value; name2=value2` string, the shape of a
/// `Cookie` request header or `document.cookie`. Values are percent-decoded.
#[derive(Debug, Clone, Default)]
pub struct DocumentCookies {
    pairs: Vec<(String, String)>,
}

impl DocumentCookies {
    pub fn parse(raw: &str) -> Self {
        let pairs = raw
            .split(';')
            .filter_map(|pair| {
                let (name, value) = pair.trim().split_once('=')?;
                let value = percent_decode_str(value).decode_utf8_lossy().into_owned();
                Some((name.to_string(), value))
            })
            .collect();
        Self { pairs }
    }
}

impl CookieStore for DocumentCookies {
    /// First cookie with a matching name wins.
    fn get(&self, name: &str) -> Option<String> {
        self.pairs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }
}
