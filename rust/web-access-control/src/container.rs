use url::Url;

/// Produce the container that holds `resource`, or `None` when the path is
/// already the root.
///
/// The final path segment is stripped and the trailing slash of the
/// produced container is kept, so a container input yields its own
/// container rather than itself. Pure and total; no I/O.
///
/// ```
/// use url::Url;
/// use web_access_control::container_of;
///
/// let resource = Url::parse("https://host/a/b/c").unwrap();
/// let container = container_of(&resource).unwrap();
/// assert_eq!(container.as_str(), "https://host/a/b/");
/// assert_eq!(container_of(&container).unwrap().as_str(), "https://host/a/");
///
/// let root = Url::parse("https://host/").unwrap();
/// assert_eq!(container_of(&root), None);
/// ```
pub fn container_of(resource: &Url) -> Option<Url> {
    let path = resource.path();
    if path == "/" {
        return None;
    }

    let trimmed = path.strip_suffix('/').unwrap_or(path);
    let end = trimmed.rfind('/')?;

    let mut container = resource.clone();
    container.set_path(&trimmed[..=end]);
    Some(container)
}
