use crate::route_config::{Configuration, Mapping};

/// Picks the first active mapping whose prefix matches `path` and composes the
/// upstream path. The query string is not part of `path`.
pub fn resolve<'a>(path: &str, config: &'a Configuration) -> Option<(&'a Mapping, String)> {
  let mapping = config
    .mappings
    .iter()
    .find(|mapping| mapping.active && path.starts_with(mapping.from.as_str()))?;

  let remainder = &path[mapping.from.len()..];
  let remainder = remainder.strip_prefix('/').unwrap_or(remainder);
  let mut new_path = format!("{}/{}", mapping.to, remainder);

  // one slash only; repeated slashes are left alone
  if new_path.ends_with('/') {
    new_path.pop();
  }

  Some((mapping, new_path))
}
