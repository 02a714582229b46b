use crate::error::Error;
use base64::{engine::general_purpose::STANDARD, Engine};
use hyper::{
    header::{HeaderName, HeaderValue},
    HeaderMap,
};
use serde_json::Value;
use std::collections::HashMap;

pub fn extract_headers(header_map: &HeaderMap) -> HashMap<String, String> {
    // it currently ignores header values with opaque characters
    header_map
        .iter()
        .map(|(k, v)| (String::from(k.as_str()), v.to_str()))
        .filter_map(|(key, value)| value.ok().map(|v| (key, String::from(v))))
        .collect::<HashMap<_, _>>()
}

pub fn put_headers<'a, I: IntoIterator<Item = (&'a String, &'a String)>>(
    header_map: &mut HeaderMap<HeaderValue>,
    headers: I,
) -> Result<(), Error> {
    for (key, value) in headers {
        let header_name = HeaderName::from_lowercase(key.to_lowercase().as_bytes())?;
        let header_value = HeaderValue::from_str(value)?;
        header_map.append(header_name, header_value);
    }

    Ok(())
}

pub fn find_header<S: AsRef<str>>(headers: &HashMap<String, String>, name: S) -> Option<&str> {
    let name = name.as_ref();

    headers
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .map(|(_, value)| value.as_str())
}

pub fn basic_credentials<S1: AsRef<str>, S2: AsRef<str>>(user: S1, password: S2) -> String {
    let pair = format!("{}:{}", user.as_ref(), password.as_ref());
    format!("Basic {}", STANDARD.encode(pair))
}

/// Splits a `Basic ...` authorization value back into user and password.
pub fn parse_basic_credentials<S: AsRef<str>>(value: S) -> Option<(String, String)> {
    let encoded = value.as_ref().strip_prefix("Basic ")?;
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (user, password) = decoded.split_once(':')?;

    Some((user.into(), password.into()))
}

pub fn cookie_value<'a>(cookie_header: &'a str, name: &str) -> Option<&'a str> {
    cookie_header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

pub fn json_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_path_walks_objects_and_arrays() {
        let body = json!({
            "payload": {
                "1st": { "outcome": "passed." },
                "list": [1, { "name": "second" }]
            }
        });

        assert_eq!(json_path(&body, "payload.1st.outcome"), Some(&json!("passed.")));
        assert_eq!(json_path(&body, "payload.list.1.name"), Some(&json!("second")));
        assert_eq!(json_path(&body, "payload.list.7"), None);
        assert_eq!(json_path(&body, "payload.1st.outcome.deeper"), None);
    }

    #[test]
    fn basic_credentials_round_trip_through_the_header_value() {
        let header = basic_credentials("test@test.net", "test1");

        assert_eq!(header, "Basic dGVzdEB0ZXN0Lm5ldDp0ZXN0MQ==");
        assert_eq!(
            parse_basic_credentials(&header),
            Some(("test@test.net".into(), "test1".into()))
        );
        assert_eq!(parse_basic_credentials("Bearer abc"), None);
    }

    #[test]
    fn cookie_value_finds_the_named_pair() {
        assert_eq!(cookie_value("theme=dark; auth=abc123", "auth"), Some("abc123"));
        assert_eq!(cookie_value("auth=123", "auth"), Some("123"));
        assert_eq!(cookie_value("session=1", "auth"), None);
    }

    #[test]
    fn headers_are_written_lower_cased() {
        let mut headers = HashMap::new();
        headers.insert(String::from("Content-Type"), String::from("application/json"));
        let mut header_map = HeaderMap::new();

        put_headers(&mut header_map, &headers).unwrap();

        let extracted = extract_headers(&header_map);
        assert_eq!(
            extracted.get("content-type").map(String::as_str),
            Some("application/json")
        );
        assert_eq!(find_header(&extracted, "Content-Type"), Some("application/json"));
    }
}
