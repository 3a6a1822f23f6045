use std::path::{Component, Path};

/// `data.csv` -> `data (n).csv`, `README` -> `README (n)`.
pub(crate) fn suffixed_name(name: &str, n: u32) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => format!("{} ({}).{}", stem, n, ext),
        _ => format!("{} ({})", name, n),
    }
}

/// Temp file name for a staged upload. Leading dot keeps it out of casual listings.
pub(crate) fn staging_name(id: uuid::Uuid) -> String {
    format!(".{}.part", id)
}

/// A committed name must be exactly one normal path component.
pub(crate) fn is_single_component(name: &str) -> bool {
    if name.is_empty() || name.contains('/') || name.contains('\\') {
        return false;
    }
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}
