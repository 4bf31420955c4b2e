const BUNDLE_EXTENSION: &str = ".zip";

/// Windows-safe local filename for a bundle: `{sanitized_stem}.zip`.
pub fn bundle_filename(bundle_name: &str) -> String {
    let trimmed = bundle_name.trim();
    let stem = if trimmed.to_ascii_lowercase().ends_with(BUNDLE_EXTENSION) {
        &trimmed[..trimmed.len() - BUNDLE_EXTENSION.len()]
    } else {
        trimmed
    };
    format!("{}{BUNDLE_EXTENSION}", sanitize_stem(stem))
}

fn sanitize_stem(input: &str) -> String {
    let cleaned: String = input
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim_matches(&['_', ' ', '.'][..]);

    // Collapse runs of underscores.
    let mut compacted = String::with_capacity(cleaned.len());
    let mut prev_underscore = false;
    for c in cleaned.chars() {
        if c != '_' || !prev_underscore {
            compacted.push(c);
        }
        prev_underscore = c == '_';
    }

    let mut stem: String = compacted.chars().take(120).collect();
    if stem.is_empty() {
        stem = "media-assets".to_string();
    }
    if is_reserved_windows_name(&stem) {
        stem.push('_');
    }
    stem
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}
