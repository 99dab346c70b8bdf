use std::env;
use std::fs::File;
use std::io::{self, BufReader, Cursor, Read};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use log::error;
use regex::Regex;

pub const CONFIG_PATH: &str = "config";
pub const CONFIG_FILE: &str = "config.yml";
pub const DOMAINS_FILE: &str = "rotation_domains.yml";

static RE_ENV_VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{env:(?<var>[^\}]+)\}").unwrap()
});

pub fn resolve_env_var(value: &str) -> String {
    if value.is_empty() {
        return String::new();
    }
    RE_ENV_VAR.replace_all(value, |caps: &regex::Captures| {
        let var_name = &caps["var"];
        env::var(var_name).unwrap_or_else(|e| {
            error!("Could not resolve env var '{var_name}': {e}");
            format!("${{env:{var_name}}}")
        })
    }).to_string()
}

pub fn open_file(file_path: &Path) -> io::Result<File> {
    File::open(file_path).map_err(|err| {
        io::Error::new(err.kind(), format!("cant open file {}: {err}", file_path.display()))
    })
}

pub fn file_reader(file: File) -> BufReader<File> {
    BufReader::new(file)
}

enum EitherReader<L, R> {
    Left(L),
    Right(R),
}

impl<L: Read, R: Read> Read for EitherReader<L, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            EitherReader::Left(reader) => reader.read(buf),
            EitherReader::Right(reader) => reader.read(buf),
        }
    }
}

/// Resolves `${env:VAR}` placeholders while reading.
/// The wrapped content is slurped on first access, config files are small.
pub struct EnvResolvingReader<R: Read> {
    inner: Option<R>,
    resolved: Cursor<Vec<u8>>,
}

impl<R: Read> EnvResolvingReader<R> {
    pub fn new(inner: R) -> Self {
        Self { inner: Some(inner), resolved: Cursor::new(Vec::new()) }
    }
}

impl<R: Read> Read for EnvResolvingReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if let Some(mut reader) = self.inner.take() {
            let mut content = String::new();
            reader.read_to_string(&mut content)?;
            self.resolved = Cursor::new(resolve_env_var(&content).into_bytes());
        }
        self.resolved.read(buf)
    }
}

pub fn config_file_reader(file: File, resolve_env: bool) -> impl Read {
    if resolve_env {
        EitherReader::Left(EnvResolvingReader::new(file_reader(file)))
    } else {
        EitherReader::Right(BufReader::new(file))
    }
}

pub fn get_working_dir() -> String {
    env::current_dir().map_or_else(|_| String::from("."), |dir| dir.to_string_lossy().to_string())
}

pub fn get_default_config_path() -> String {
    let config_dir = PathBuf::from(get_working_dir()).join(CONFIG_PATH);
    let path = if config_dir.exists() { config_dir } else { PathBuf::from(get_working_dir()) };
    path.to_string_lossy().to_string()
}

pub fn get_default_config_file_path(config_path: &str) -> String {
    PathBuf::from(config_path).join(CONFIG_FILE).to_string_lossy().to_string()
}

pub fn get_default_domains_file_path(config_path: &str) -> String {
    PathBuf::from(config_path).join(DOMAINS_FILE).to_string_lossy().to_string()
}

pub fn resolve_directory_path(path: &str) -> String {
    if path.is_empty() {
        return get_working_dir();
    }
    std::fs::canonicalize(path).map_or_else(|_| path.to_string(), |p| p.to_string_lossy().to_string())
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use super::{resolve_env_var, EnvResolvingReader};

    #[test]
    fn test_resolve() {
        let resolved = resolve_env_var("${env:HOME}");
        assert_eq!(resolved, std::env::var("HOME").unwrap());
    }

    #[test]
    fn test_unresolved_var_is_kept() {
        let resolved = resolve_env_var("${env:XUI_ROTATE_DOES_NOT_EXIST}");
        assert_eq!(resolved, "${env:XUI_ROTATE_DOES_NOT_EXIST}");
    }

    #[test]
    fn test_env_resolving_reader() {
        let content = "user: ${env:HOME}\n";
        let mut reader = EnvResolvingReader::new(content.as_bytes());
        let mut resolved = String::new();
        reader.read_to_string(&mut resolved).unwrap();
        assert_eq!(resolved, format!("user: {}\n", std::env::var("HOME").unwrap()));
    }
}
