//! Fetching and decoding the displayed image.

use std::sync::mpsc;
use thiserror::Error;

const USER_AGENT: &str = concat!("pinch-viewer/", env!("CARGO_PKG_VERSION"));

/// Errors that can occur when loading and decoding the image.
#[derive(Error, Debug)]
pub enum ImageLoadError {
    #[error("request for '{url}' failed: {source}")]
    Http { url: String, source: reqwest::Error },
    #[error("'{url}' returned {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("failed to read '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to decode image '{url}': {source}")]
    Decode {
        url: String,
        source: image::ImageError,
    },
    #[error("decode task for '{0}' did not finish")]
    DecodeTask(String),
}

/// Decoded image data ready for texture creation.
pub struct DecodedImage {
    pub pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// State of the image being loaded in the background.
pub enum AssetLoadState {
    /// Fetch or decode still running.
    Loading(mpsc::Receiver<Result<DecodedImage, ImageLoadError>>),
    /// Decoded and waiting to be uploaded as a texture.
    Ready(DecodedImage),
    /// Uploaded; the pixels now live in the texture.
    Uploaded,
    /// Loading failed; the message has already been shown in a toast.
    Error(String),
}

fn is_remote(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

/// Reads the raw image bytes from an HTTP(S) URL or a local path.
async fn fetch_bytes(client: &reqwest::Client, url: &str) -> Result<Vec<u8>, ImageLoadError> {
    if !is_remote(url) {
        return tokio::fs::read(url)
            .await
            .map_err(|source| ImageLoadError::Io {
                path: url.to_owned(),
                source,
            });
    }

    let http_err = |source| ImageLoadError::Http {
        url: url.to_owned(),
        source,
    };

    let response = client
        .get(url)
        .header(reqwest::header::USER_AGENT, USER_AGENT)
        .send()
        .await
        .map_err(http_err)?;

    let status = response.status();
    if !status.is_success() {
        return Err(ImageLoadError::Status {
            url: url.to_owned(),
            status,
        });
    }

    let bytes = response.bytes().await.map_err(http_err)?;
    Ok(bytes.to_vec())
}

pub fn decode_image(url: &str, bytes: &[u8]) -> Result<DecodedImage, ImageLoadError> {
    let img = image::load_from_memory(bytes).map_err(|source| ImageLoadError::Decode {
        url: url.to_owned(),
        source,
    })?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();

    Ok(DecodedImage {
        pixels: rgba.into_raw(),
        width,
        height,
    })
}

/// Fetches and decodes the image. Decoding runs on the blocking pool.
pub async fn load_and_decode_image(
    client: reqwest::Client,
    url: String,
) -> Result<DecodedImage, ImageLoadError> {
    let bytes = fetch_bytes(&client, &url).await?;
    log::info!("Fetched {} bytes from {url}", bytes.len());

    tokio::task::spawn_blocking(move || decode_image(&url, &bytes))
        .await
        .map_err(|err| ImageLoadError::DecodeTask(err.to_string()))?
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(width, height, image::Rgba([10, 20, 30, 255]));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png)
            .expect("encode png");
        out.into_inner()
    }

    #[test]
    fn decodes_png_to_rgba() {
        let decoded = decode_image("mem.png", &png_bytes(3, 2)).expect("decodes");
        assert_eq!((decoded.width, decoded.height), (3, 2));
        assert_eq!(decoded.pixels.len(), 3 * 2 * 4);
        assert_eq!(&decoded.pixels[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let err = decode_image("junk", b"not an image").err().expect("fails");
        assert!(matches!(err, ImageLoadError::Decode { .. }), "{err}");
    }

    #[test]
    fn remote_detection() {
        assert!(is_remote("https://images.unsplash.com/photo.jpg"));
        assert!(is_remote("http://localhost/a.png"));
        assert!(!is_remote("/home/me/a.png"));
        assert!(!is_remote("photo.png"));
    }

    #[tokio::test]
    async fn missing_local_file_is_io_error() {
        let client = reqwest::Client::new();
        let result =
            load_and_decode_image(client, "/definitely/not/here.png".to_owned()).await;
        assert!(matches!(result, Err(ImageLoadError::Io { .. })));
    }

    #[tokio::test]
    async fn loads_local_file() {
        let path = std::env::temp_dir().join(format!("pinch-viewer-{}.png", std::process::id()));
        std::fs::write(&path, png_bytes(4, 4)).expect("write temp png");

        let client = reqwest::Client::new();
        let result = load_and_decode_image(client, path.display().to_string()).await;
        let _ = std::fs::remove_file(&path);

        let decoded = result.expect("loads");
        assert_eq!((decoded.width, decoded.height), (4, 4));
    }
}
