//! Certificate chain inspection.

use chrono::{DateTime, Utc};
use rustls::pki_types::CertificateDer;
use x509_parser::extensions::GeneralName;
use x509_parser::parse_x509_certificate;

use dashboard_core::error::{DashboardError, Result};

/// What a host presented during the handshake.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CertificateInfo {
    /// Host that was dialed
    pub host: String,
    /// Earliest `NotAfter` across the whole chain; `None` for an empty chain
    pub expires_at: Option<DateTime<Utc>>,
    /// Number of certificates presented
    pub chain_len: usize,
    /// DNS names of the leaf certificate
    pub dns_names: Vec<String>,
    /// Common name of the leaf issuer
    pub issuer: Option<String>,
}

/// `NotAfter` of `0001-01-01T00:00:00Z`, the unset validity bound.
const ZERO_NOT_AFTER: i64 = -62_135_596_800;

/// Earliest of the known instants; `None` entries are skipped.
pub fn min_expiry<I>(expirations: I) -> Option<DateTime<Utc>>
where
    I: IntoIterator<Item = Option<DateTime<Utc>>>,
{
    expirations.into_iter().flatten().min()
}

/// Parses a presented chain, leaf first.
pub(crate) fn inspect_chain(host: &str, chain: &[CertificateDer<'_>]) -> Result<CertificateInfo> {
    let mut expirations = Vec::with_capacity(chain.len());
    let mut dns_names = Vec::new();
    let mut issuer = None;

    for (index, der) in chain.iter().enumerate() {
        let (_, cert) = parse_x509_certificate(der.as_ref())
            .map_err(|e| DashboardError::CertificateParseError(format!("{}: {}", host, e)))?;

        expirations.push(not_after(host, cert.validity().not_after.timestamp())?);

        if index == 0 {
            if let Ok(Some(san)) = cert.subject_alternative_name() {
                dns_names = san
                    .value
                    .general_names
                    .iter()
                    .filter_map(|name| match name {
                        GeneralName::DNSName(dns) => Some((*dns).to_string()),
                        _ => None,
                    })
                    .collect();
            }
            issuer = cert
                .issuer()
                .iter_common_name()
                .next()
                .and_then(|cn| cn.as_str().ok())
                .map(str::to_owned);
        }
    }

    Ok(CertificateInfo {
        host: host.to_string(),
        expires_at: min_expiry(expirations),
        chain_len: chain.len(),
        dns_names,
        issuer,
    })
}

fn not_after(host: &str, timestamp: i64) -> Result<Option<DateTime<Utc>>> {
    if timestamp == ZERO_NOT_AFTER {
        return Ok(None);
    }
    DateTime::from_timestamp(timestamp, 0)
        .map(Some)
        .ok_or_else(|| DashboardError::CertificateParseError(format!("{}: NotAfter out of range", host)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use rcgen::{date_time_ymd, CertificateParams, KeyPair};

    fn certificate(name: &str, year: i32) -> CertificateDer<'static> {
        let mut params = CertificateParams::new(vec![name.to_string()]).unwrap();
        params.not_after = date_time_ymd(year, 1, 1);
        let key = KeyPair::generate().unwrap();
        params.self_signed(&key).unwrap().der().clone()
    }

    fn new_year(year: i32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn test_min_expiry() {
        let now = Utc::now();
        let leaf = now + Duration::days(90);
        let intermediate = now + Duration::days(30);
        let root = now + Duration::days(3650);

        assert_eq!(min_expiry([Some(leaf), Some(intermediate), Some(root)]), Some(intermediate));
        assert_eq!(min_expiry([None, Some(leaf), Some(root)]), Some(leaf));
        assert_eq!(min_expiry([None, None]), None);
        assert_eq!(min_expiry(Vec::new()), None);
    }

    #[test]
    fn test_unset_not_after_is_skipped() {
        let chain = [
            certificate("example.com", 1),
            certificate("intermediate", 2030),
            certificate("root", 2031),
        ];
        let info = inspect_chain("example.com", &chain).unwrap();
        assert_eq!(info.expires_at, Some(new_year(2030)));
        assert_eq!(info.chain_len, 3);
        assert_eq!(info.dns_names, vec!["example.com".to_string()]);
    }

    #[test]
    fn test_only_unset_not_after() {
        let info = inspect_chain("example.com", &[certificate("example.com", 1)]).unwrap();
        assert_eq!(info.expires_at, None);
        assert_eq!(info.chain_len, 1);
    }

    #[test]
    fn test_single_certificate() {
        let info = inspect_chain("example.com", &[certificate("example.com", 2030)]).unwrap();
        assert_eq!(info.expires_at, Some(new_year(2030)));
    }

    #[test]
    fn test_empty_chain_has_no_expiry() {
        let info = inspect_chain("example.com", &[]).unwrap();
        assert_eq!(info.expires_at, None);
        assert_eq!(info.chain_len, 0);
        assert!(info.dns_names.is_empty());
    }

    #[test]
    fn test_garbage_certificate_is_an_error() {
        let der = CertificateDer::from(vec![0x30, 0x03, 0x01, 0x02, 0x03]);
        let err = inspect_chain("example.com", &[der]).unwrap_err();
        assert!(matches!(err, DashboardError::CertificateParseError(_)));
    }
}
