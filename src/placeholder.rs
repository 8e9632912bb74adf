use crate::error::PlaceholderError;

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Names of the `{{ NAME }}` tokens in `value`, in order of appearance. An unterminated `{{`
/// ends the scan.
#[must_use]
pub fn placeholders(value: &str) -> Vec<&str> {
    let mut names = Vec::new();
    let mut rest = value;

    while let Some(start) = rest.find(OPEN) {
        let after = &rest[start + OPEN.len()..];
        let Some(end) = after.find(CLOSE) else {
            break;
        };

        names.push(after[..end].trim());
        rest = &after[end + CLOSE.len()..];
    }

    names
}

/// Replace every `{{ NAME }}` in `value` with `resolve(NAME)`.
pub fn expand_placeholders<'v, F>(value: &str, mut resolve: F) -> Result<String, PlaceholderError>
where
    F: FnMut(&str) -> Option<&'v str>,
{
    let mut result = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find(OPEN) {
        result.push_str(&rest[..start]);

        let after = &rest[start + OPEN.len()..];
        let end = after.find(CLOSE).ok_or(PlaceholderError::Unterminated)?;
        let name = after[..end].trim();

        let replacement =
            resolve(name).ok_or_else(|| PlaceholderError::NotFound(name.to_owned()))?;
        result.push_str(replacement);

        rest = &after[end + CLOSE.len()..];
    }

    result.push_str(rest);
    Ok(result)
}
