//! Cookie jar formatting for forwarded session checks.

use actix_web::cookie::Cookie;

/// Render cookies as a single `Cookie` header value.
///
/// Pairs keep the order they arrived in and are joined by `; `. Cookie
/// attributes are never part of a request jar, so only `name=value` is
/// emitted.
///
/// # Examples
/// ```
/// use actix_web::cookie::Cookie;
/// use frontend::inbound::http::cookie_jar::format_cookie_jar;
///
/// let jar = [Cookie::new("SSID", "abc"), Cookie::new("theme", "dark")];
/// assert_eq!(format_cookie_jar(&jar), "SSID=abc; theme=dark");
/// ```
#[must_use]
pub fn format_cookie_jar(cookies: &[Cookie<'_>]) -> String {
    cookies
        .iter()
        .map(|cookie| format!("{}={}", cookie.name(), cookie.value()))
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::empty(&[], "")]
    #[case::single(&[("SSID", "abc")], "SSID=abc")]
    #[case::ordered(&[("b", "2"), ("a", "1")], "b=2; a=1")]
    #[case::empty_value(&[("flag", "")], "flag=")]
    fn formats_pairs_in_arrival_order(#[case] pairs: &[(&str, &str)], #[case] expected: &str) {
        let jar: Vec<Cookie<'_>> = pairs
            .iter()
            .map(|(name, value)| Cookie::new(*name, *value))
            .collect();
        assert_eq!(format_cookie_jar(&jar), expected);
    }

    #[test]
    fn drops_attributes() {
        let cookie = Cookie::build("SSID", "abc")
            .path("/")
            .http_only(true)
            .finish();
        assert_eq!(format_cookie_jar(&[cookie]), "SSID=abc");
    }
}
