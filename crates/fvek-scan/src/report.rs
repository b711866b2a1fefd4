//! Rendering recovered keys and dumping them to disk.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::detection::KeyReport;
use crate::error::{Result, ScanError};

/// Extension of key dump files.
pub const DUMP_EXTENSION: &str = "fvek";

/// File name a report is dumped under, e.g. `0x8a3c5000.fvek`.
pub fn dump_file_name(address: u64) -> String {
    format!("{address:#010x}.{DUMP_EXTENSION}")
}

/// Writes `primary || secondary` for `report` into `dir`.
pub fn dump_key(report: &KeyReport, dir: &Path) -> Result<PathBuf> {
    let path = dir.join(dump_file_name(report.address));
    fs::write(&path, report.key_material()).map_err(|source| ScanError::Dump {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

/// A report plus the outcome of dumping it, if dumping was requested.
#[derive(Debug)]
pub struct Finding {
    /// The recovered keys.
    pub report: KeyReport,
    /// Where the keys were written, or why that failed.
    pub dump: Option<Result<PathBuf>>,
}

/// Orders reports by primary key and dumps each one when `dump_dir` is set.
///
/// A failed dump is recorded on its finding and logged; the remaining
/// reports are still dumped.
pub fn collect_findings(mut reports: Vec<KeyReport>, dump_dir: Option<&Path>) -> Vec<Finding> {
    reports.sort_by(|a, b| a.primary.as_bytes().cmp(b.primary.as_bytes()));
    reports
        .into_iter()
        .map(|report| {
            let dump = dump_dir.map(|dir| {
                let outcome = dump_key(&report, dir);
                match &outcome {
                    Ok(path) => info!(path = %path.display(), "dumped key material"),
                    Err(err) => warn!(error = %err, "key dump failed"),
                }
                outcome
            });
            Finding { report, dump }
        })
        .collect()
}

/// Human-readable listing, one block per finding.
pub fn render_text<W: Write>(out: &mut W, findings: &[Finding]) -> io::Result<()> {
    writeln!(out)?;
    for finding in findings {
        let report = &finding.report;
        writeln!(out, "Address : {:#010x}", report.address)?;
        writeln!(out, "Cipher  : {}", report.cipher())?;
        writeln!(out, "FVEK    : {}", hex::encode(report.primary.as_bytes()))?;
        if let Some(tweak) = &report.secondary {
            writeln!(out, "TWEAK   : {}", hex::encode(tweak.as_bytes()))?;
        }
        match &finding.dump {
            Some(Ok(path)) => writeln!(out, "FVEK dumped to file: {}", path.display())?,
            Some(Err(err)) => writeln!(out, "FVEK dump failed: {err}")?,
            None => {}
        }
        writeln!(out)?;
    }
    Ok(())
}

/// Serializable view of a finding.
#[derive(Debug, Serialize)]
pub struct KeyRecord {
    /// Allocation address, `0x`-prefixed hex.
    pub address: String,
    /// `AES-128` or `AES-256`.
    pub cipher: String,
    /// Primary key, hex.
    pub fvek: String,
    /// Secondary key, hex.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tweak: Option<String>,
    /// Dump path when the dump succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dump: Option<String>,
    /// Dump error when the dump failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dump_error: Option<String>,
}

impl From<&Finding> for KeyRecord {
    fn from(finding: &Finding) -> Self {
        let report = &finding.report;
        let (dump, dump_error) = match &finding.dump {
            Some(Ok(path)) => (Some(path.display().to_string()), None),
            Some(Err(err)) => (None, Some(err.to_string())),
            None => (None, None),
        };
        Self {
            address: format!("{:#010x}", report.address),
            cipher: report.cipher().to_string(),
            fvek: hex::encode(report.primary.as_bytes()),
            tweak: report.secondary.map(|k| hex::encode(k.as_bytes())),
            dump,
            dump_error,
        }
    }
}

/// JSON array of [`KeyRecord`]s.
pub fn render_json<W: Write>(out: &mut W, findings: &[Finding]) -> serde_json::Result<()> {
    let records: Vec<KeyRecord> = findings.iter().map(KeyRecord::from).collect();
    serde_json::to_writer_pretty(&mut *out, &records)?;
    writeln!(out).map_err(serde_json::Error::io)
}

#[cfg(test)]
mod tests {
    use super::*;
    use aes_core::AesKey;

    fn report(address: u64, primary: u8, tweak: bool) -> KeyReport {
        KeyReport {
            address,
            primary: AesKey::from([primary; 16]),
            secondary: tweak.then(|| AesKey::from([0xbb; 16])),
        }
    }

    #[test]
    fn dump_name_is_padded_hex() {
        assert_eq!(dump_file_name(0x1000), "0x00001000.fvek");
        assert_eq!(dump_file_name(0xfffffa800c2d1000), "0xfffffa800c2d1000.fvek");
    }

    #[test]
    fn text_lists_keys_in_primary_order() {
        let findings = collect_findings(
            vec![report(0x2000, 0x22, true), report(0x1000, 0x11, false)],
            None,
        );
        let mut out = Vec::new();
        render_text(&mut out, &findings).unwrap();
        let text = String::from_utf8(out).unwrap();

        let first = text.find("0x00001000").unwrap();
        let second = text.find("0x00002000").unwrap();
        assert!(first < second);
        assert!(text.contains("Cipher  : AES-128"));
        assert!(text.contains(&format!("FVEK    : {}", "11".repeat(16))));
        assert!(text.contains(&format!("TWEAK   : {}", "bb".repeat(16))));
        assert_eq!(text.matches("TWEAK").count(), 1);
    }

    #[test]
    fn json_omits_missing_tweak() {
        let findings = collect_findings(vec![report(0x1000, 0x11, false)], None);
        let mut out = Vec::new();
        render_json(&mut out, &findings).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value[0]["address"], "0x00001000");
        assert_eq!(value[0]["cipher"], "AES-128");
        assert!(value[0].get("tweak").is_none());
    }

    #[test]
    fn failed_dump_does_not_stop_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        // A directory where the first dump file should go makes that write fail.
        fs::create_dir(dir.path().join(dump_file_name(0x1000))).unwrap();

        let findings = collect_findings(
            vec![report(0x1000, 0x11, false), report(0x2000, 0x22, true)],
            Some(dir.path()),
        );
        assert!(matches!(findings[0].dump, Some(Err(ScanError::Dump { .. }))));
        let path = match &findings[1].dump {
            Some(Ok(path)) => path.clone(),
            other => panic!("unexpected dump outcome: {other:?}"),
        };
        let written = fs::read(path).unwrap();
        assert_eq!(written.len(), 32);
        assert_eq!(&written[..16], &[0x22; 16]);
        assert_eq!(&written[16..], &[0xbb; 16]);
    }
}
