use crate::error::SceneError;

/// Read a static asset by path: `fetch` relative to the page in the browser,
/// the filesystem natively (working directory first, then the crate root).
pub async fn load_bytes(path: &str) -> Result<Vec<u8>, SceneError> {
    let bytes = platform::load(path).await?;
    tracing::info!(path, bytes = bytes.len(), "asset loaded");
    Ok(bytes)
}

#[cfg(target_arch = "wasm32")]
mod platform {
    use js_sys::Uint8Array;
    use wasm_bindgen::JsCast;
    use wasm_bindgen_futures::JsFuture;
    use web_sys::Response;

    use crate::error::SceneError;

    pub async fn load(path: &str) -> Result<Vec<u8>, SceneError> {
        let window = web_sys::window().ok_or_else(|| SceneError::Dom("no window".into()))?;
        let response = JsFuture::from(window.fetch_with_str(path))
            .await
            .map_err(|e| SceneError::asset(path, format!("{e:?}")))?;
        let response: Response = response
            .dyn_into()
            .map_err(|_| SceneError::asset(path, "fetch did not return a Response"))?;
        if !response.ok() {
            return Err(SceneError::asset(path, format!("HTTP {}", response.status())));
        }

        let buffer = response
            .array_buffer()
            .map_err(|e| SceneError::asset(path, format!("{e:?}")))?;
        let buffer = JsFuture::from(buffer)
            .await
            .map_err(|e| SceneError::asset(path, format!("{e:?}")))?;
        Ok(Uint8Array::new(&buffer).to_vec())
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod platform {
    use std::path::{Path, PathBuf};

    use crate::error::SceneError;

    pub async fn load(path: &str) -> Result<Vec<u8>, SceneError> {
        let resolved = resolve(path);
        std::fs::read(&resolved).map_err(|e| SceneError::asset(path, e))
    }

    fn resolve(path: &str) -> PathBuf {
        let direct = Path::new(path);
        if direct.exists() {
            return direct.to_path_buf();
        }
        Path::new(env!("CARGO_MANIFEST_DIR")).join(path)
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn missing_asset_fails_fast() {
            let err = pollster::block_on(load("static/does-not-exist.png")).unwrap_err();
            assert!(matches!(err, SceneError::Asset { .. }));
        }

        #[test]
        fn bundled_normal_map_resolves_from_crate_root() {
            let bytes = pollster::block_on(load("static/textures/NormalMap.png")).unwrap();
            assert_eq!(&bytes[1..4], b"PNG");
        }
    }
}
