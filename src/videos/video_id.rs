use url::Url;

const PRIMARY_HOST: &str = "youtube.com";
const SHORT_LINK_HOST: &str = "youtu.be";

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum VideoIdError {
    #[error("Invalid URL")]
    InvalidUrl,

    #[error("Could not extract video ID")]
    MissingId,
}

/// Pulls the video identifier out of a watch URL or a short link.
///
/// `https://www.youtube.com/watch?v=ID` yields the `v` query parameter,
/// `https://youtu.be/ID` yields the first path segment.
pub fn extract_video_id(input: &str) -> Result<String, VideoIdError> {
    let url = Url::parse(input).map_err(|_| VideoIdError::InvalidUrl)?;
    let host = url.host_str().ok_or(VideoIdError::MissingId)?;

    let id = if host_matches(host, PRIMARY_HOST) {
        url.query_pairs()
            .find(|(key, _)| key == "v")
            .map(|(_, value)| value.into_owned())
            .unwrap_or_default()
    } else if host_matches(host, SHORT_LINK_HOST) {
        url.path()
            .trim_start_matches('/')
            .split('/')
            .next()
            .unwrap_or_default()
            .to_string()
    } else {
        String::new()
    };

    if id.is_empty() {
        return Err(VideoIdError::MissingId);
    }

    Ok(id)
}

pub fn thumbnail_url(video_id: &str) -> String {
    format!("https://img.youtube.com/vi/{}/maxresdefault.jpg", video_id)
}

pub fn fallback_title(video_id: &str) -> String {
    format!("Video {}", video_id)
}

fn host_matches(host: &str, domain: &str) -> bool {
    let host = host.to_ascii_lowercase();
    host == domain || host.ends_with(&format!(".{}", domain))
}
