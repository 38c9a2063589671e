//! Lookup of per-component TLS material produced by the CA.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use super::error::CryptoError;
use super::{CA_CERT_FILE, CA_MATERIAL_DIR};

/// The three artifact kinds issued per component.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptoKind {
    Cert,
    Priv,
    Pub,
}

impl CryptoKind {
    pub const ALL: [CryptoKind; 3] = [CryptoKind::Cert, CryptoKind::Priv, CryptoKind::Pub];

    pub fn as_str(&self) -> &'static str {
        match self {
            CryptoKind::Cert => "cert",
            CryptoKind::Priv => "priv",
            CryptoKind::Pub => "pub",
        }
    }

    /// Output directory under the CA root holding this kind of artifact.
    pub fn out_dir(&self) -> &'static str {
        match self {
            CryptoKind::Cert => "out-cert",
            CryptoKind::Priv => "out-priv",
            CryptoKind::Pub => "out-pub",
        }
    }
}

/// Resolved locations of one component's TLS material.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CryptoMaterialBundle {
    pub cert_path: Option<PathBuf>,
    pub priv_path: Option<PathBuf>,
    pub pub_path: Option<PathBuf>,
    pub ca_certs_path: PathBuf,
}

impl CryptoMaterialBundle {
    /// Scans the CA output directories for files belonging to `pattern`.
    ///
    /// A kind with no matching file is left as `None`. Only a missing CA
    /// root or output directory is an error.
    pub fn locate(ca_dir: &Path, pattern: &str) -> Result<Self, CryptoError> {
        let mut bundle = Self {
            cert_path: None,
            priv_path: None,
            pub_path: None,
            ca_certs_path: ca_dir.join(CA_MATERIAL_DIR).join(CA_CERT_FILE),
        };

        for kind in CryptoKind::ALL {
            let found = find_artifact(&ca_dir.join(kind.out_dir()), pattern, kind)?;
            match kind {
                CryptoKind::Cert => bundle.cert_path = found,
                CryptoKind::Priv => bundle.priv_path = found,
                CryptoKind::Pub => bundle.pub_path = found,
            }
        }

        debug!(
            pattern,
            complete = bundle.is_complete(),
            "Located crypto material"
        );

        Ok(bundle)
    }

    pub fn path(&self, kind: CryptoKind) -> Option<&Path> {
        match kind {
            CryptoKind::Cert => self.cert_path.as_deref(),
            CryptoKind::Priv => self.priv_path.as_deref(),
            CryptoKind::Pub => self.pub_path.as_deref(),
        }
    }

    /// Whether all three per-component artifacts were found.
    pub fn is_complete(&self) -> bool {
        CryptoKind::ALL.iter().all(|kind| self.path(*kind).is_some())
    }
}

/// Picks the lexicographically greatest file name in `dir` matching `<pattern>-<kind>`.
fn find_artifact(
    dir: &Path,
    pattern: &str,
    kind: CryptoKind,
) -> Result<Option<PathBuf>, CryptoError> {
    let needle = format!("{}-{}", pattern, kind.as_str());

    let entries = fs::read_dir(dir).map_err(|source| CryptoError::ScanFailed {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut best: Option<String> = None;
    for entry in entries {
        let entry = entry.map_err(|source| CryptoError::ScanFailed {
            path: dir.to_path_buf(),
            source,
        })?;
        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            continue;
        };
        if contains_token(&name, &needle) && best.as_ref().is_none_or(|b| name > *b) {
            best = Some(name);
        }
    }

    Ok(best.map(|name| dir.join(name)))
}

/// Whether `needle` occurs in `name` delimited by `-`, `.` or the ends of the name.
///
/// Keeps `server1` from binding files issued for `server10`.
pub(crate) fn contains_token(name: &str, needle: &str) -> bool {
    if needle.is_empty() {
        return false;
    }
    let bytes = name.as_bytes();
    name.match_indices(needle).any(|(start, _)| {
        let end = start + needle.len();
        let before = start == 0 || matches!(bytes[start - 1], b'-' | b'.');
        let after = end == bytes.len() || matches!(bytes[end], b'-' | b'.');
        before && after
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn ca_layout() -> TempDir {
        let dir = TempDir::new().unwrap();
        for kind in CryptoKind::ALL {
            fs::create_dir(dir.path().join(kind.out_dir())).unwrap();
        }
        dir
    }

    fn touch(dir: &Path, kind: CryptoKind, name: &str) {
        fs::write(dir.join(kind.out_dir()).join(name), "pem").unwrap();
    }

    #[test]
    fn test_contains_token() {
        assert!(contains_token("20260101-lb-agent-cert.pem", "lb-agent-cert"));
        assert!(contains_token("lb-agent-cert.pem", "lb-agent-cert"));
        assert!(contains_token("x-qs-1-server1-cert", "qs-1-server1-cert"));
        assert!(!contains_token("x-qs-1-server10-cert.pem", "qs-1-server1-cert"));
        assert!(!contains_token("x-myweb-admin-cert.pem", "web-admin-cert"));
        assert!(!contains_token("anything", ""));
    }

    #[test]
    fn test_locate_all_kinds() {
        let ca = ca_layout();
        for kind in CryptoKind::ALL {
            touch(
                ca.path(),
                kind,
                &format!("20260101-qs-1-server1-{}.pem", kind.as_str()),
            );
        }

        let bundle = CryptoMaterialBundle::locate(ca.path(), "qs-1-server1").unwrap();
        assert!(bundle.is_complete());
        assert_eq!(
            bundle.cert_path.unwrap(),
            ca.path().join("out-cert/20260101-qs-1-server1-cert.pem")
        );
        assert_eq!(
            bundle.ca_certs_path,
            ca.path().join("ca-material").join("ca-cert.pem")
        );
    }

    #[test]
    fn test_locate_missing_kind_is_none() {
        let ca = ca_layout();
        touch(ca.path(), CryptoKind::Cert, "1-scheduler1-cert.pem");
        touch(ca.path(), CryptoKind::Pub, "1-scheduler1-pub.pem");

        let bundle = CryptoMaterialBundle::locate(ca.path(), "scheduler1").unwrap();
        assert!(bundle.cert_path.is_some());
        assert!(bundle.pub_path.is_some());
        assert!(bundle.priv_path.is_none());
        assert!(!bundle.is_complete());
    }

    #[test]
    fn test_locate_does_not_bind_longer_server_name() {
        let ca = ca_layout();
        for kind in CryptoKind::ALL {
            touch(
                ca.path(),
                kind,
                &format!("1-qs-server10-{}.pem", kind.as_str()),
            );
        }

        let bundle = CryptoMaterialBundle::locate(ca.path(), "qs-server1").unwrap();
        assert!(bundle.cert_path.is_none());
        assert!(bundle.priv_path.is_none());
        assert!(bundle.pub_path.is_none());
    }

    #[test]
    fn test_locate_is_independent_of_scan_order() {
        let ca = ca_layout();
        touch(ca.path(), CryptoKind::Cert, "20260102-lb-agent-cert.pem");
        touch(ca.path(), CryptoKind::Cert, "20260101-lb-agent-cert.pem");
        touch(ca.path(), CryptoKind::Cert, "20260103-lb-agent-cert.pem");

        let first = CryptoMaterialBundle::locate(ca.path(), "lb-agent").unwrap();
        let second = CryptoMaterialBundle::locate(ca.path(), "lb-agent").unwrap();
        assert_eq!(first, second);
        assert_eq!(
            first.cert_path.unwrap().file_name().unwrap(),
            "20260103-lb-agent-cert.pem"
        );
    }

    #[test]
    fn test_locate_missing_ca_dir_fails() {
        let dir = TempDir::new().unwrap();
        let result = CryptoMaterialBundle::locate(&dir.path().join("ca"), "lb-agent");
        assert!(matches!(result, Err(CryptoError::ScanFailed { .. })));
    }
}
