//! Pure string path algebra used to derive render output locations.
//!
//! Paths may come from any submitting platform, so both `/` and `\` are treated as separators
//! and every returned path uses `/`. Nothing here touches the filesystem.

use crate::foundation::error::{CompileError, CompileResult};

/// Replace every backslash with a forward slash, regardless of the host platform.
pub fn to_slash(path: &str) -> String {
    path.replace('\\', "/")
}

fn require_non_empty(op: &str, path: &str) -> CompileResult<()> {
    if path.is_empty() {
        return Err(CompileError::invalid_path(format!(
            "{op}: path must not be empty"
        )));
    }
    Ok(())
}

/// Last element of `path`, ignoring trailing separators.
///
/// A path made only of separators yields `"/"`.
pub fn basename(path: &str) -> CompileResult<String> {
    require_non_empty("basename", path)?;
    let slashed = to_slash(path);
    let trimmed = slashed.trim_end_matches('/');
    if trimmed.is_empty() {
        return Ok("/".to_string());
    }
    let base = match trimmed.rfind('/') {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    };
    Ok(base.to_string())
}

/// Everything but the last element of `path`.
///
/// Returns `"."` when there is no directory part. Leading double separators (UNC prefixes) are
/// kept as-is.
pub fn dirname(path: &str) -> CompileResult<String> {
    require_non_empty("dirname", path)?;
    let slashed = to_slash(path);
    let Some(idx) = slashed.rfind('/') else {
        return Ok(".".to_string());
    };
    let dir = &slashed[..=idx];
    if dir.len() > 1 {
        Ok(dir[..dir.len() - 1].to_string())
    } else {
        Ok(dir.to_string())
    }
}

/// Final extension of `path` including the dot, or `""`.
pub fn extension(path: &str) -> CompileResult<String> {
    let base = basename(path)?;
    Ok(match base.rfind('.') {
        Some(idx) => base[idx..].to_string(),
        None => String::new(),
    })
}

/// Basename without its final extension (`"shot.tar.gz"` -> `"shot.tar"`).
pub fn stem(path: &str) -> CompileResult<String> {
    let base = basename(path)?;
    let ext_len = match base.rfind('.') {
        Some(idx) => base.len() - idx,
        None => 0,
    };
    Ok(base[..base.len() - ext_len].to_string())
}

/// Join path elements with `/`.
///
/// Empty elements are skipped and separators are collapsed at element boundaries only; the
/// leading prefix of the first element (`/`, `//SERVER`, `C:`) is preserved.
pub fn join<S: AsRef<str>>(parts: &[S]) -> CompileResult<String> {
    let mut out = String::new();
    for part in parts {
        let slashed = to_slash(part.as_ref());
        if slashed.is_empty() {
            continue;
        }
        if out.is_empty() {
            let trimmed = slashed.trim_end_matches('/');
            out.push_str(if trimmed.is_empty() { "/" } else { trimmed });
            continue;
        }
        let seg = slashed.trim_matches('/');
        if seg.is_empty() {
            continue;
        }
        if !out.ends_with('/') {
            out.push('/');
        }
        out.push_str(seg);
    }

    if out.is_empty() {
        return Err(CompileError::invalid_path(
            "join: at least one non-empty element is required",
        ));
    }
    Ok(out)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/path.rs"]
mod tests;
