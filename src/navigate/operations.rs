//! Navigation operations implementation

use crate::error::NavigateError;

/// Build the absolute path a command parameter refers to.
///
/// Empty or `/` gives the root, a leading `/` is taken verbatim, anything
/// else is appended to `cwd`. A single trailing `/` is dropped. The
/// filesystem is not consulted.
pub fn resolve_path(cwd: &str, param: &str, max_len: usize) -> Result<String, NavigateError> {
    if param.is_empty() || param == "/" {
        return Ok("/".to_string());
    }

    let mut full = if param.starts_with('/') {
        param.to_string()
    } else {
        let mut joined = String::with_capacity(cwd.len() + param.len() + 1);
        joined.push_str(cwd);
        if !joined.ends_with('/') {
            joined.push('/');
        }
        joined.push_str(param);
        joined
    };

    if full.len() > 1 && full.ends_with('/') {
        full.pop();
    }

    if full.len() >= max_len {
        return Err(NavigateError::PathTooLong {
            len: full.len(),
            max: max_len,
        });
    }

    Ok(full)
}
