use hyper::{http::uri::Scheme, Uri};

const CDN_HOSTS: [&str; 2] = ["cdn.discordapp.com", "media.discordapp.net"];

fn is_snowflake(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|byte| byte.is_ascii_digit())
}

/// Whether `name` is a non-empty file name ending in `.json`, in any case.
pub fn has_json_extension(name: &str) -> bool {
    const EXTENSION: &[u8] = b".json";
    name.len() > EXTENSION.len() && name.as_bytes()[name.len() - EXTENSION.len()..].eq_ignore_ascii_case(EXTENSION)
}

/// Validates whether the URI is "trusted". As long as the URI follows the
/// format `https://cdn.discordapp.com/attachments/{snowflake}/{snowflake}/{filename}.json`,
/// the validation should pass. Query parameters are ignored.
pub fn is_allowed_uri(uri: &Uri) -> bool {
    if uri.scheme() != Some(&Scheme::HTTPS) {
        return false;
    }

    if !uri.host().is_some_and(|host| CDN_HOSTS.contains(&host)) {
        return false;
    }

    let Some(rest) = uri.path().strip_prefix("/attachments/") else {
        return false;
    };

    let mut segments = rest.split('/');
    let (Some(channel), Some(attachment), Some(name), None) =
        (segments.next(), segments.next(), segments.next(), segments.next())
    else {
        return false;
    };

    is_snowflake(channel) && is_snowflake(attachment) && has_json_extension(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unencrypted_http() {
        assert!(!is_allowed_uri(&Uri::from_static("http://localhost")));
        assert!(!is_allowed_uri(&Uri::from_static("http://cdn.discordapp.com/attachments/123/456/Quiz.json")));
    }

    #[test]
    fn rejects_wrong_host() {
        assert!(!is_allowed_uri(&Uri::from_static("https://example.com/attachments/123/456/Quiz.json")));
        assert!(!is_allowed_uri(&Uri::from_static("https://cdn.discordapp.com.evil.net/attachments/123/456/Quiz.json")));
    }

    #[test]
    fn rejects_incorrect_cdn_endpoint() {
        assert!(!is_allowed_uri(&Uri::from_static("https://cdn.discordapp.com/api")));
        assert!(!is_allowed_uri(&Uri::from_static("https://cdn.discordapp.com/avatars/123/456/Quiz.json")));
        assert!(!is_allowed_uri(&Uri::from_static("https://cdn.discordapp.com/attachments/123/456/nested/Quiz.json")));
    }

    #[test]
    fn rejects_invalid_snowflakes() {
        assert!(!is_allowed_uri(&Uri::from_static("https://cdn.discordapp.com/attachments")));
        assert!(!is_allowed_uri(&Uri::from_static("https://cdn.discordapp.com/attachments/abc/456/Quiz.json")));
        assert!(!is_allowed_uri(&Uri::from_static("https://cdn.discordapp.com/attachments/123/abc/Quiz.json")));
        assert!(!is_allowed_uri(&Uri::from_static("https://cdn.discordapp.com/attachments//456/Quiz.json")));
    }

    #[test]
    fn rejects_invalid_file_extensions() {
        assert!(!is_allowed_uri(&Uri::from_static("https://cdn.discordapp.com/attachments/123/456/Quiz.exe")));
        assert!(!is_allowed_uri(&Uri::from_static("https://cdn.discordapp.com/attachments/123/456/Quiz.txt")));
        assert!(!is_allowed_uri(&Uri::from_static("https://cdn.discordapp.com/attachments/123/456/.json")));
    }

    #[test]
    fn accepts_valid_formats() {
        assert!(is_allowed_uri(&Uri::from_static("https://cdn.discordapp.com/attachments/123/456/Quiz.json")));
        assert!(is_allowed_uri(&Uri::from_static(
            "https://cdn.discordapp.com/attachments/12203934/90823432/science.json?ex=65f1&is=65de&hm=abcdef"
        )));
        assert!(is_allowed_uri(&Uri::from_static("https://media.discordapp.net/attachments/1/2/history.json")));
        assert!(is_allowed_uri(&Uri::from_static("https://cdn.discordapp.com/attachments/123/456/Quiz.JSON")));
    }

    #[test]
    fn json_extension_ignores_case() {
        assert!(has_json_extension("quiz.json"));
        assert!(has_json_extension("Quiz.JSON"));
        assert!(has_json_extension("ünïcode.Json"));
        assert!(!has_json_extension(".json"));
        assert!(!has_json_extension("json"));
        assert!(!has_json_extension("quiz.jsonl"));
        assert!(!has_json_extension("quiz.txt"));
    }
}
