use crate::{KeyValue, Mapper, Reducer};
use anyhow::Context;
use dlopen2::wrapper::{Container, WrapperApi};
use std::env::consts::{DLL_PREFIX, DLL_SUFFIX};
use std::path::{Path, PathBuf};

#[derive(WrapperApi)]
struct Api {
    map: fn(filename: &str, contents: &str) -> Vec<KeyValue>,
    reduce: fn(key: &str, values: Vec<String>) -> String,
}

/// A job definition loaded from a plugin library (`app_wc`, `app_indexer`, ...).
///
/// The library must export unmangled `map` and `reduce` functions and be built
/// by the same toolchain as the host.
pub struct App {
    pub app_name: String,
    cont: Container<Api>,
}

impl App {
    pub fn library_path(lib_dir: impl AsRef<Path>, app_name: &str) -> PathBuf {
        lib_dir
            .as_ref()
            .join(format!("{DLL_PREFIX}{app_name}{DLL_SUFFIX}"))
    }

    pub fn load(lib_dir: impl AsRef<Path>, app_name: &str) -> anyhow::Result<Self> {
        let lib_path = Self::library_path(lib_dir, app_name);
        let cont: Container<Api> = unsafe { Container::load(&lib_path) }
            .with_context(|| format!("load app library {}", lib_path.display()))?;
        tracing::debug!(app = app_name, path = %lib_path.display(), "app loaded");
        Ok(Self {
            app_name: app_name.to_string(),
            cont,
        })
    }
}

impl Mapper for App {
    fn map(&self, filename: &str, contents: &str) -> Vec<KeyValue> {
        self.cont.map(filename, contents)
    }
}

impl Reducer for App {
    fn reduce(&self, key: &str, values: Vec<String>) -> anyhow::Result<String> {
        Ok(self.cont.reduce(key, values))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn library_path_uses_platform_naming() {
        let path = App::library_path("target/release", "app_wc");
        let file = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(file.starts_with(DLL_PREFIX));
        assert!(file.ends_with(DLL_SUFFIX));
        assert!(file.contains("app_wc"));
        assert_eq!(path.parent().unwrap(), Path::new("target/release"));
    }

    #[test]
    fn missing_library_is_an_error() {
        let err = App::load("/nonexistent/lib/dir", "app_nope").err().unwrap();
        assert!(format!("{err:#}").contains("app_nope"));
    }
}
