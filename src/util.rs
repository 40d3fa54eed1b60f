//! HTML entity helpers
//!
//! Code block content arrives entity-escaped in the page source and must go
//! back escaped inside the emitted spans.

/// Escape HTML special characters.
pub fn html_escape(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}

/// Decode the entities templating engines emit into code blocks.
///
/// Handles the named entities from `html_escape` plus decimal and hex
/// numeric references. Unknown or malformed references pass through
/// unchanged rather than corrupting the snippet.
pub fn html_unescape(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut rest = s;

    while let Some(amp) = rest.find('&') {
        result.push_str(&rest[..amp]);
        rest = &rest[amp..];

        // Entity names are short; a distant semicolon is unrelated
        let semi = match rest.find(';') {
            Some(pos) if pos <= 11 => pos,
            _ => {
                result.push('&');
                rest = &rest[1..];
                continue;
            }
        };

        let entity = &rest[1..semi];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            _ => decode_numeric(entity),
        };

        match decoded {
            Some(c) => {
                result.push(c);
                rest = &rest[semi + 1..];
            }
            None => {
                result.push('&');
                rest = &rest[1..];
            }
        }
    }

    result.push_str(rest);
    result
}

/// Decode `#39` / `#x27` style references
fn decode_numeric(entity: &str) -> Option<char> {
    let digits = entity.strip_prefix('#')?;
    let code = if let Some(hex) = digits.strip_prefix('x').or_else(|| digits.strip_prefix('X')) {
        u32::from_str_radix(hex, 16).ok()?
    } else {
        digits.parse::<u32>().ok()?
    };
    char::from_u32(code)
}
