//! Flat parameter file: whitespace-separated decimals, no header.
//!
//! Values are written with Rust's shortest round-trip formatting, so loading a
//! saved file reproduces the vector bit for bit.

use std::{
    ffi::OsString,
    fmt::Write as _,
    fs, io,
    path::{Path, PathBuf},
};

#[derive(Debug, derive_more::Display, derive_more::Error)]
pub enum ModelFileError {
    #[display("failed to access parameter file {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
    #[display("invalid value {token:?} at position {index} in {}", path.display())]
    Parse {
        path: PathBuf,
        index: usize,
        token: String,
    },
    #[display("{} holds {actual} values, expected {expected}", path.display())]
    LengthMismatch {
        path: PathBuf,
        expected: usize,
        actual: usize,
    },
}

/// Sibling path used while writing, renamed over `path` once complete.
fn temporary_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map_or_else(|| OsString::from("model"), ToOwned::to_owned);
    name.push(".tmp");
    path.with_file_name(name)
}

/// Formats `values` as a single line of space-separated decimals.
#[must_use]
pub fn format(values: &[f64]) -> String {
    let mut out = String::new();
    for (i, v) in values.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        let _ = write!(out, "{v}");
    }
    out.push('\n');
    out
}

/// Writes `values` to `path`, replacing any previous file atomically.
pub fn save<P>(path: P, values: &[f64]) -> Result<(), ModelFileError>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let tmp = temporary_path(path);
    let io_error = |source| ModelFileError::Io {
        path: path.to_owned(),
        source,
    };
    fs::write(&tmp, format(values)).map_err(io_error)?;
    fs::rename(&tmp, path).map_err(io_error)?;
    Ok(())
}

/// Reads exactly `expected` finite values from `path`.
pub fn load<P>(path: P, expected: usize) -> Result<Vec<f64>, ModelFileError>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| ModelFileError::Io {
        path: path.to_owned(),
        source,
    })?;
    let values = text
        .split_whitespace()
        .enumerate()
        .map(|(index, token)| {
            token
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| ModelFileError::Parse {
                    path: path.to_owned(),
                    index,
                    token: token.to_owned(),
                })
        })
        .collect::<Result<Vec<_>, _>>()?;
    if values.len() != expected {
        return Err(ModelFileError::LengthMismatch {
            path: path.to_owned(),
            expected,
            actual: values.len(),
        });
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_is_bitwise() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("best.txt");
        let values = vec![0.1, -2.5e-7, 1.0 / 3.0, 7250.0, -0.0, f64::MIN_POSITIVE];
        save(&path, &values).unwrap();
        let loaded = load(&path, values.len()).unwrap();
        assert_eq!(
            loaded.iter().map(|v| v.to_bits()).collect::<Vec<_>>(),
            values.iter().map(|v| v.to_bits()).collect::<Vec<_>>()
        );
        assert!(!temporary_path(&path).exists());
    }

    #[test]
    fn test_save_overwrites() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("best.txt");
        save(&path, &[1.0, 2.0, 3.0]).unwrap();
        save(&path, &[4.0]).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "4\n");
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("missing.txt");
        assert!(matches!(load(&missing, 1), Err(ModelFileError::Io { .. })));

        let short = dir.path().join("short.txt");
        fs::write(&short, "1 2\n3").unwrap();
        assert!(matches!(
            load(&short, 4),
            Err(ModelFileError::LengthMismatch {
                expected: 4,
                actual: 3,
                ..
            })
        ));

        let garbage = dir.path().join("garbage.txt");
        fs::write(&garbage, "1.5 abc 2").unwrap();
        assert!(matches!(
            load(&garbage, 3),
            Err(ModelFileError::Parse { index: 1, .. })
        ));

        let nan = dir.path().join("nan.txt");
        fs::write(&nan, "NaN").unwrap();
        assert!(matches!(load(&nan, 1), Err(ModelFileError::Parse { .. })));
    }

    #[test]
    fn test_format() {
        assert_eq!(format(&[1.0, -0.5, 2.25]), "1 -0.5 2.25\n");
        assert_eq!(format(&[]), "\n");
    }
}
