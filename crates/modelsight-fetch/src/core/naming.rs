use modelsight_reference::ModelFormat;
use sha2::{Digest, Sha256};
use url::Url;

const MAX_SEGMENT_LEN: usize = 64;

/// Deterministic cache file name for a remote reference.
///
/// `<16 hex chars of sha256(url)>_<sanitized last path segment>`. The token
/// keeps equal file names from different hosts apart; the readable suffix
/// keeps the extension the renderer needs. A segment without a model
/// extension is treated as binary glTF.
///
/// # Examples
///
/// ```
/// use modelsight_fetch::cache_file_name;
/// use url::Url;
///
/// let url = Url::parse("https://example.com/models/heart.glb").unwrap();
/// let name = cache_file_name(&url);
/// assert!(name.ends_with("_heart.glb"));
/// assert_eq!(name.len(), 16 + 1 + "heart.glb".len());
/// assert_eq!(name, cache_file_name(&url));
/// ```
pub fn cache_file_name(url: &Url) -> String {
    let digest = Sha256::digest(url.as_str().as_bytes());
    let token = hex::encode(&digest[..8]);

    let segment = url
        .path_segments()
        .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
        .map(sanitize_segment)
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "model".to_string());

    if ModelFormat::from_path(&segment).is_some() {
        format!("{token}_{segment}")
    } else {
        format!("{token}_{segment}.{}", ModelFormat::Glb.extension())
    }
}

/// Keep `[A-Za-z0-9._-]`, replace everything else with `_`, cap the length
/// while preserving the extension.
pub fn sanitize_segment(segment: &str) -> String {
    let cleaned: String = segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.').to_string();

    if cleaned.len() <= MAX_SEGMENT_LEN {
        return cleaned;
    }
    match cleaned.rsplit_once('.') {
        Some((stem, ext)) if ext.len() < 8 => {
            let keep = MAX_SEGMENT_LEN.saturating_sub(ext.len() + 1);
            format!("{}.{ext}", &stem[..keep.min(stem.len())])
        }
        _ => cleaned[..MAX_SEGMENT_LEN].to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(url: &str) -> String {
        cache_file_name(&Url::parse(url).unwrap())
    }

    #[test]
    fn test_deterministic_and_distinct() {
        assert_eq!(name("https://a.example.com/m.glb"), name("https://a.example.com/m.glb"));
        assert_ne!(name("https://a.example.com/m.glb"), name("https://b.example.com/m.glb"));
    }

    #[test]
    fn test_missing_extension_gets_glb() {
        assert!(name("https://example.com/download/12345").ends_with("_12345.glb"));
        assert!(name("https://example.com/").ends_with("_model.glb"));
        assert!(name("https://example.com/models/").ends_with("_models.glb"));
    }

    #[test]
    fn test_keeps_known_extension() {
        assert!(name("https://example.com/x/Larynx%20Full.GLTF?v=3").ends_with("_Larynx_20Full.GLTF"));
        assert!(name("https://example.com/rig.fbx").ends_with("_rig.fbx"));
    }

    #[test]
    fn test_sanitize_segment() {
        assert_eq!(sanitize_segment("../../etc/passwd"), "_.._etc_passwd");
        assert_eq!(sanitize_segment("..hidden.glb"), "hidden.glb");
        let long = format!("{}.glb", "a".repeat(200));
        let s = sanitize_segment(&long);
        assert_eq!(s.len(), MAX_SEGMENT_LEN);
        assert!(s.ends_with(".glb"));
    }
}
