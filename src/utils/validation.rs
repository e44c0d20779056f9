use anyhow::{Result, anyhow};

/// Longest file name most filesystems accept, in bytes
pub const MAX_FILENAME_BYTES: usize = 255;

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Validates a client-declared upload size against the configured maximum
pub fn validate_file_size(size: u64, max_size: u64) -> Result<()> {
    if size > max_size {
        return Err(anyhow!(ValidationError {
            code: "FILE_TOO_LARGE",
            message: format!(
                "File size {} bytes exceeds maximum allowed {} bytes ({} MB)",
                size,
                max_size,
                max_size / 1024 / 1024
            ),
        }));
    }
    Ok(())
}

/// Reduces a client-supplied upload filename to a single flat file name.
///
/// Browsers may send a full client-side path, so only the last component
/// (split on either separator) is kept. Control characters become `_`.
/// Spaces, parentheses and leading dots are preserved.
pub fn sanitize_filename(filename: &str) -> Result<String> {
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or("");

    if name != filename {
        tracing::debug!("Stripped client path from upload name: {:?}", filename);
    }

    let sanitized: String = name
        .chars()
        .map(|c| if c.is_control() { '_' } else { c })
        .collect();

    // Limit length safely for UTF-8
    let sanitized = if sanitized.len() > MAX_FILENAME_BYTES {
        let mut end = MAX_FILENAME_BYTES;
        while !sanitized.is_char_boundary(end) {
            end -= 1;
        }
        sanitized[..end].to_string()
    } else {
        sanitized
    };

    if sanitized.is_empty() || sanitized == "." || sanitized == ".." {
        return Err(anyhow!(ValidationError {
            code: "INVALID_FILENAME",
            message: format!("'{}' is not a usable file name", filename),
        }));
    }

    Ok(sanitized)
}

/// Checks that a requested name addresses a file directly inside the flat
/// storage directory. Unlike [`sanitize_filename`] nothing is rewritten:
/// downloads must name a stored file exactly.
pub fn validate_stored_name(name: &str) -> std::result::Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError {
            code: "MISSING_FILENAME",
            message: "File parameter is missing".to_string(),
        });
    }

    if name == "."
        || name == ".."
        || name.contains('/')
        || name.contains('\\')
        || name.contains('\0')
    {
        tracing::warn!("Path traversal attempt detected: {}", name);
        return Err(ValidationError {
            code: "INVALID_FILENAME",
            message: format!("'{}' is not a valid file name", name),
        });
    }

    Ok(())
}
