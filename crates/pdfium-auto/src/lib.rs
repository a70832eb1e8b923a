//! # pdfium-auto
//!
//! Resolve the [PDFium](https://pdfium.googlesource.com/pdfium/) shared
//! library that `pdfium-render` binds to, downloading it on first use.
//!
//! Resolution order used by [`PdfiumLocator::ensure`]:
//!
//! 1. An explicit library path (`PDFIUM_LIB_PATH`, or
//!    [`PdfiumLocator::with_library_path`]) when the file exists.
//! 2. The per-version cache directory, e.g.
//!    `~/.cache/pdf-classifier/pdfium-7690/libpdfium.so`.
//! 3. The platform archive from
//!    [bblanchon/pdfium-binaries](https://github.com/bblanchon/pdfium-binaries),
//!    unpacked into the cache directory.
//!
//! ```rust,no_run
//! use pdfium_auto::PdfiumLocator;
//!
//! let pdfium = PdfiumLocator::from_env().bind(None).expect("PDFium unavailable");
//! ```
//!
//! ## Environment variables
//!
//! - `PDFIUM_LIB_PATH` — existing pdfium library; skips the cache and download.
//! - `PDFIUM_AUTO_CACHE_DIR` — root directory for the cached library.

use std::io::Read;
use std::path::{Path, PathBuf};

use pdfium_render::prelude::Pdfium;
use thiserror::Error;

/// pdfium-binaries release tag (`chromium/7690`).
pub const PDFIUM_VERSION: &str = "7690";

const RELEASE_URL: &str = "https://github.com/bblanchon/pdfium-binaries/releases/download";

/// Directory name used under the platform cache root.
const CACHE_NAMESPACE: &str = "pdf-classifier";

/// Progress callback: `(bytes_downloaded, total_bytes)`.
pub type DownloadProgress<'a> = &'a dyn Fn(u64, Option<u64>);

#[derive(Error, Debug)]
pub enum PdfiumAutoError {
    #[error("Unsupported platform: {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },

    #[error("Cache directory error for '{path}': {source}")]
    CacheDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Download of '{url}' failed: {reason}")]
    Download { url: String, reason: String },

    #[error("Archive extraction failed: {0}")]
    Extract(String),

    #[error("Failed to bind PDFium from '{path}': {reason}")]
    Bind { path: PathBuf, reason: String },
}

/// Release asset for the running platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformAsset {
    /// Archive name in the GitHub release, e.g. `pdfium-linux-x64.tgz`.
    pub archive: &'static str,
    /// Shared library file name, e.g. `libpdfium.so`.
    pub library: &'static str,
    /// Directory inside the archive that holds the library.
    pub archive_dir: &'static str,
}

impl PlatformAsset {
    /// Look up the asset for an `(os, arch)` pair as reported by `std::env::consts`.
    pub fn for_target(os: &str, arch: &str) -> Result<Self, PdfiumAutoError> {
        let (prefix, library, archive_dir) = match os {
            "macos" => ("mac", "libpdfium.dylib", "lib"),
            "linux" => ("linux", "libpdfium.so", "lib"),
            "windows" => ("win", "pdfium.dll", "bin"),
            _ => return Err(unsupported(os, arch)),
        };
        let suffix = match (os, arch) {
            (_, "x86_64") => "x64",
            ("macos" | "linux" | "windows", "aarch64") => "arm64",
            ("windows", "x86") => "x86",
            _ => return Err(unsupported(os, arch)),
        };
        let archive: &'static str = match (prefix, suffix) {
            ("mac", "x64") => "pdfium-mac-x64.tgz",
            ("mac", "arm64") => "pdfium-mac-arm64.tgz",
            ("linux", "x64") => "pdfium-linux-x64.tgz",
            ("linux", "arm64") => "pdfium-linux-arm64.tgz",
            ("win", "x64") => "pdfium-win-x64.tgz",
            ("win", "arm64") => "pdfium-win-arm64.tgz",
            ("win", "x86") => "pdfium-win-x86.tgz",
            _ => return Err(unsupported(os, arch)),
        };
        Ok(Self {
            archive,
            library,
            archive_dir,
        })
    }

    /// Asset for the platform this binary was compiled for.
    pub fn current() -> Result<Self, PdfiumAutoError> {
        Self::for_target(std::env::consts::OS, std::env::consts::ARCH)
    }

    fn entry_path(&self) -> String {
        format!("{}/{}", self.archive_dir, self.library)
    }
}

fn unsupported(os: &str, arch: &str) -> PdfiumAutoError {
    PdfiumAutoError::UnsupportedPlatform {
        os: os.to_string(),
        arch: arch.to_string(),
    }
}

/// Finds (and if needed downloads) the PDFium library.
#[derive(Debug, Clone)]
pub struct PdfiumLocator {
    library_path: Option<PathBuf>,
    cache_root: PathBuf,
    version: String,
}

impl Default for PdfiumLocator {
    fn default() -> Self {
        let cache_root = dirs::cache_dir()
            .or_else(|| dirs::home_dir().map(|h| h.join(".cache")))
            .unwrap_or_else(std::env::temp_dir)
            .join(CACHE_NAMESPACE);
        Self {
            library_path: None,
            cache_root,
            version: PDFIUM_VERSION.to_string(),
        }
    }
}

impl PdfiumLocator {
    /// Locator honouring `PDFIUM_LIB_PATH` and `PDFIUM_AUTO_CACHE_DIR`.
    pub fn from_env() -> Self {
        let mut locator = Self::default();
        if let Ok(root) = std::env::var("PDFIUM_AUTO_CACHE_DIR") {
            if !root.is_empty() {
                locator.cache_root = PathBuf::from(root);
            }
        }
        if let Ok(path) = std::env::var("PDFIUM_LIB_PATH") {
            if !path.is_empty() {
                locator.library_path = Some(PathBuf::from(path));
            }
        }
        locator
    }

    pub fn with_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.library_path = Some(path.into());
        self
    }

    pub fn with_cache_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.cache_root = root.into();
        self
    }

    /// Versioned directory holding the cached library.
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_root.join(format!("pdfium-{}", self.version))
    }

    /// Existing library on disk, without touching the network.
    pub fn cached_library(&self) -> Option<PathBuf> {
        if let Some(explicit) = self.library_path.as_ref().filter(|p| p.exists()) {
            return Some(explicit.clone());
        }
        let asset = PlatformAsset::current().ok()?;
        let cached = self.cache_dir().join(asset.library);
        cached.exists().then_some(cached)
    }

    pub fn is_cached(&self) -> bool {
        self.cached_library().is_some()
    }

    /// Return a usable library path, downloading the release archive if needed.
    pub fn ensure(&self, on_progress: Option<DownloadProgress<'_>>) -> Result<PathBuf, PdfiumAutoError> {
        if let Some(path) = self.cached_library() {
            return Ok(path);
        }

        let asset = PlatformAsset::current()?;
        let dir = self.cache_dir();
        std::fs::create_dir_all(&dir).map_err(|source| PdfiumAutoError::CacheDir {
            path: dir.clone(),
            source,
        })?;

        let url = format!("{RELEASE_URL}/chromium%2F{}/{}", self.version, asset.archive);
        let archive = download(&url, on_progress)?;
        let target = dir.join(asset.library);
        unpack_entry(&archive, &asset.entry_path(), &target)?;
        Ok(target)
    }

    /// Resolve the library and bind `pdfium-render` to it.
    pub fn bind(&self, on_progress: Option<DownloadProgress<'_>>) -> Result<Pdfium, PdfiumAutoError> {
        let path = self.ensure(on_progress)?;
        bind_pdfium_from_path(&path)
    }
}

/// Bind to the library at `path` without consulting the cache.
pub fn bind_pdfium_from_path(path: &Path) -> Result<Pdfium, PdfiumAutoError> {
    Pdfium::bind_to_library(path)
        .map(Pdfium::new)
        .map_err(|e| PdfiumAutoError::Bind {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
}

fn download(url: &str, on_progress: Option<DownloadProgress<'_>>) -> Result<Vec<u8>, PdfiumAutoError> {
    let failed = |reason: String| PdfiumAutoError::Download {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::blocking::Client::builder()
        .user_agent(concat!("pdfium-auto/", env!("CARGO_PKG_VERSION")))
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let mut response = client.get(url).send().map_err(|e| failed(e.to_string()))?;
    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }

    let total = response.content_length();
    let mut body = Vec::with_capacity(total.unwrap_or(0) as usize);
    let mut chunk = [0u8; 64 * 1024];
    loop {
        let n = match response.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(failed(e.to_string())),
        };
        body.extend_from_slice(&chunk[..n]);
        if let Some(cb) = on_progress {
            cb(body.len() as u64, total);
        }
    }
    Ok(body)
}

/// Unpack the single `entry` of a gzipped tarball to `target`.
fn unpack_entry(archive: &[u8], entry: &str, target: &Path) -> Result<(), PdfiumAutoError> {
    let extract = |e: std::io::Error| PdfiumAutoError::Extract(e.to_string());
    let mut tarball = tar::Archive::new(flate2::read::GzDecoder::new(archive));

    for item in tarball.entries().map_err(extract)? {
        let mut item = item.map_err(extract)?;
        let matches = item
            .path()
            .map_err(extract)?
            .to_string_lossy()
            .trim_start_matches("./")
            == entry;
        if matches {
            item.unpack(target).map_err(extract)?;
            return Ok(());
        }
    }

    Err(PdfiumAutoError::Extract(format!("'{entry}' not found in archive")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn linux_x64_asset() {
        let asset = PlatformAsset::for_target("linux", "x86_64").unwrap();
        assert_eq!(asset.archive, "pdfium-linux-x64.tgz");
        assert_eq!(asset.entry_path(), "lib/libpdfium.so");
    }

    #[test]
    fn windows_assets_live_in_bin() {
        let asset = PlatformAsset::for_target("windows", "x86").unwrap();
        assert_eq!(asset.archive, "pdfium-win-x86.tgz");
        assert_eq!(asset.entry_path(), "bin/pdfium.dll");
    }

    #[test]
    fn unknown_platform_is_rejected() {
        let err = PlatformAsset::for_target("freebsd", "x86_64").unwrap_err();
        assert!(err.to_string().contains("freebsd"));
        assert!(PlatformAsset::for_target("linux", "riscv64").is_err());
    }

    #[test]
    fn cache_dir_is_versioned() {
        let locator = PdfiumLocator::default().with_cache_root("/tmp/pdfium-auto-test");
        let dir = locator.cache_dir();
        assert!(dir.starts_with("/tmp/pdfium-auto-test"));
        assert!(dir.to_string_lossy().ends_with(&format!("pdfium-{PDFIUM_VERSION}")));
    }

    #[test]
    fn explicit_library_path_wins() {
        let dir = tempfile::tempdir().unwrap();
        let lib = dir.path().join("libpdfium.so");
        std::fs::write(&lib, b"stub").unwrap();

        let locator = PdfiumLocator::default()
            .with_cache_root(dir.path().join("cache"))
            .with_library_path(&lib);
        assert_eq!(locator.cached_library(), Some(lib));
        assert!(locator.is_cached());
    }

    #[test]
    fn missing_explicit_path_falls_back_to_cache() {
        let dir = tempfile::tempdir().unwrap();
        let locator = PdfiumLocator::default()
            .with_cache_root(dir.path())
            .with_library_path(dir.path().join("nope.so"));
        assert_eq!(locator.cached_library(), None);
    }

    #[test]
    fn unpack_entry_reports_missing_library() {
        let mut builder = tar::Builder::new(flate2::write::GzEncoder::new(
            Vec::new(),
            flate2::Compression::fast(),
        ));
        let data = b"hello";
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, "lib/other.txt", &data[..])
            .unwrap();
        let archive = builder.into_inner().unwrap().finish().unwrap();

        let dir = tempfile::tempdir().unwrap();
        let err = unpack_entry(&archive, "lib/libpdfium.so", &dir.path().join("x")).unwrap_err();
        assert!(matches!(err, PdfiumAutoError::Extract(_)));

        unpack_entry(&archive, "lib/other.txt", &dir.path().join("out.txt")).unwrap();
        assert_eq!(std::fs::read(dir.path().join("out.txt")).unwrap(), b"hello");
    }
}
